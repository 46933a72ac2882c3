// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

/// Error taxonomy of the HTTP surface. Every handler failure maps onto one
/// of these; the status code and body shape follow from the variant.
#[derive(Debug)]
pub enum ApiError {
    /// The addressed entity does not exist.
    NotFound(String),
    /// A referenced id inside a request body does not exist; the whole
    /// operation was rejected.
    InvalidReference(String),
    /// Login failed. Deliberately does not say which part was wrong.
    InvalidCredentials,
    /// Missing, malformed, expired, or revoked bearer token.
    Unauthorized,
    /// The request itself is unacceptable.
    Validation(String),
    /// Persistence or internal failure. Details stay in the log.
    Storage(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidReference(_) => "invalid_reference",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation(_) => "validation",
            ApiError::Storage(_) => "storage",
        }
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::InvalidReference(msg) => msg.clone(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::Unauthorized => "Authentication required".to_string(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Storage(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(msg) = self {
            log::error!("Storage error surfaced to client: {}", msg);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code(),
            message: self.public_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_variants() {
        assert_eq!(
            ApiError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidReference("x".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_details_are_not_public() {
        let err = ApiError::Storage("disk on fire at /var/lib".to_string());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.code(), "storage");
    }

    #[test]
    fn credential_failures_are_uniform() {
        assert_eq!(
            ApiError::InvalidCredentials.public_message(),
            "Invalid credentials"
        );
    }
}
