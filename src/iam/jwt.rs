// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::store::UserRecord;

pub const TOKEN_TYPE_BEARER: &str = "bearer";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: u64,    // User id
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub typ: String, // Token-type marker
}

#[derive(Debug, Clone)]
pub enum JwtError {
    TokenCreationError(String),
    TokenVerificationError(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenCreationError(msg) => write!(f, "Token creation error: {}", msg),
            JwtError::TokenVerificationError(msg) => write!(f, "Token verification error: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: i64,
}

pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    expiration_hours: u64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_hours: config.expiration_hours,
        }
    }

    pub fn expires_in_seconds(&self) -> u64 {
        self.expiration_hours * 3600
    }

    /// Sign a token for the user with a fresh jti and the configured TTL.
    pub fn create_token(&self, user: &UserRecord) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.expiration_hours as i64);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: jti.clone(),
            typ: TOKEN_TYPE_BEARER.to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| JwtError::TokenCreationError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at: claims.exp,
        })
    }

    /// Verify signature, issuer, audience, and expiry. Revocation is the
    /// registry's concern, not this service's.
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| JwtError::TokenVerificationError(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> UserRecord {
        UserRecord {
            id: 7,
            name: "Test User".to_string(),
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn test_service() -> JwtService {
        JwtService {
            secret: "test-secret-key-0123456789".to_string(),
            issuer: "quill".to_string(),
            audience: "quill-api".to_string(),
            expiration_hours: 2,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let service = test_service();
        let issued = service.create_token(&test_user()).expect("token");
        let claims = service.verify_token(&issued.token).expect("claims");

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.name, "Test User");
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.typ, TOKEN_TYPE_BEARER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn each_token_gets_fresh_jti() {
        let service = test_service();
        let first = service.create_token(&test_user()).expect("token");
        let second = service.create_token(&test_user()).expect("token");
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let service = test_service();
        let issued = service.create_token(&test_user()).expect("token");

        let other = JwtService {
            secret: "a-different-secret-key".to_string(),
            ..test_service()
        };
        assert!(other.verify_token(&issued.token).is_err());
    }

    #[test]
    fn wrong_audience_fails_verification() {
        let service = test_service();
        let issued = service.create_token(&test_user()).expect("token");

        let other = JwtService {
            audience: "someone-else".to_string(),
            ..test_service()
        };
        assert!(other.verify_token(&issued.token).is_err());
    }
}
