// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::iam::{AuthService, AuthSession, bearer_token, require_user};
use crate::store::UserRecord;

#[derive(Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Public view of a user; the password hash never leaves the store layer.
#[derive(Serialize)]
struct UserView {
    id: u64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    user: UserView,
    token: String,
    token_type: &'static str,
    expires_in: u64,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: UserView::from(&session.user),
            token: session.token,
            token_type: session.token_type,
            expires_in: session.expires_in,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

pub async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = auth.register(&body.name, &body.email, &body.password)?;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

pub async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = auth.login(&body.email, &body.password)?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

pub async fn logout(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req)?;
    auth.revoke(&token).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Successfully logged out",
    }))
}

pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req)?;
    let session = auth.refresh(&token).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

pub async fn me(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req)?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}
