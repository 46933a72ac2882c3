// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpRequest};
use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc; // Services are per-thread

use super::jwt::Claims;
use super::service::AuthService;
use crate::error::ApiError;
use crate::store::UserRecord;

/// Trait to add authentication accessors to HttpRequest
pub trait AuthRequest {
    fn user_info(&self) -> Option<UserRecord>;
    fn jwt_claims(&self) -> Option<Claims>;
    fn is_authenticated(&self) -> bool;
}

impl AuthRequest for HttpRequest {
    fn user_info(&self) -> Option<UserRecord> {
        self.extensions().get::<UserRecord>().cloned()
    }

    fn jwt_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.user_info().is_some()
    }
}

/// Resolved caller identity for protected handlers. Short-circuits with 401
/// before the handler touches anything.
pub fn require_user(req: &HttpRequest) -> Result<UserRecord, ApiError> {
    req.user_info().ok_or(ApiError::Unauthorized)
}

/// The raw bearer token as presented, for logout/refresh.
pub fn bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    extract_bearer(req).ok_or(ApiError::Unauthorized)
}

fn extract_bearer(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(actix_web::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

// Bearer token authentication middleware. Validates the Authorization
// header against the token store and stores the resolved user and claims in
// request extensions; handlers decide whether authentication is required.
pub struct BearerAuthMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_service = req.app_data::<Data<AuthService>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(auth_service) = auth_service
                && let Some(token) = extract_bearer(req.request())
            {
                match auth_service.authenticate(&token).await {
                    Ok((user, claims)) => {
                        req.extensions_mut().insert(claims);
                        req.extensions_mut().insert(user);
                    }
                    Err(err) => {
                        // Invalid tokens leave the request anonymous; the
                        // protected handlers answer 401.
                        log::debug!("Bearer token rejected: {}", err);
                    }
                }
            }

            service.call(req).await
        })
    }
}
