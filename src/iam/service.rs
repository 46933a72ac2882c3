// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use super::jwt::{Claims, JwtService, TOKEN_TYPE_BEARER};
use super::password::{hash_password, verify_password};
use super::tokens::TokenRegistry;
use crate::config::Config;
use crate::error::ApiError;
use crate::store::{BlogStore, UserRecord};

/// Result of a successful issue/validate/refresh, in the shape the auth
/// endpoints serialize.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserRecord,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// The token store. Issue at registration/login, validate on every protected
/// request, refresh by revoke-and-reissue, revoke at logout. All validity
/// decisions go through the registry actor.
pub struct AuthService {
    store: Arc<dyn BlogStore>,
    jwt: JwtService,
    registry: TokenRegistry,
}

impl AuthService {
    pub fn new(config: &Config, store: Arc<dyn BlogStore>, registry: TokenRegistry) -> Self {
        Self {
            store,
            jwt: JwtService::new(&config.auth.jwt),
            registry,
        }
    }

    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        if password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = hash_password(password)
            .map_err(|err| ApiError::Storage(format!("Password hashing failed: {}", err)))?;
        let user = self.store.create_user(name, email, &password_hash)?;
        log::info!("Registered user {} ({})", user.id, user.email);
        self.issue(user)
    }

    /// Verify identity and secret. Either being wrong yields the same
    /// `InvalidCredentials`.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let user = self
            .store
            .find_user_by_email(email.trim())?
            .ok_or(ApiError::InvalidCredentials)?;
        let matches = verify_password(password, &user.password_hash)
            .map_err(|err| ApiError::Storage(format!("Password verification failed: {}", err)))?;
        if !matches {
            return Err(ApiError::InvalidCredentials);
        }
        log::info!("User {} logged in", user.id);
        self.issue(user)
    }

    /// Resolve a bearer token to its user. Signature, expiry, revocation,
    /// and user existence are all required; any failure is `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> Result<(UserRecord, Claims), ApiError> {
        let claims = self
            .jwt
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;
        if self.registry.is_revoked(&claims.jti).await {
            return Err(ApiError::Unauthorized);
        }
        let user = self
            .store
            .find_user(claims.sub)
            .map_err(|_| ApiError::Unauthorized)?;
        Ok((user, claims))
    }

    /// Invalidate the current token and issue a fresh one for the same
    /// identity. The old token is unusable from this point on.
    pub async fn refresh(&self, token: &str) -> Result<AuthSession, ApiError> {
        let (user, claims) = self.authenticate(token).await?;
        self.registry
            .revoke(&claims.jti, claims.exp)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;
        self.issue(user)
    }

    /// Logout: mark this token (and only this token) revoked.
    pub async fn revoke(&self, token: &str) -> Result<(), ApiError> {
        let claims = self
            .jwt
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;
        if self.registry.is_revoked(&claims.jti).await {
            return Err(ApiError::Unauthorized);
        }
        self.registry
            .revoke(&claims.jti, claims.exp)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;
        log::info!("Token revoked for user {}", claims.sub);
        Ok(())
    }

    fn issue(&self, user: UserRecord) -> Result<AuthSession, ApiError> {
        let issued = self
            .jwt
            .create_token(&user)
            .map_err(|err| ApiError::Storage(err.to_string()))?;
        Ok(AuthSession {
            user,
            token: issued.token,
            token_type: TOKEN_TYPE_BEARER,
            expires_in: self.jwt.expires_in_seconds(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::store::FileBlogStore;

    fn build_service(temp: &tempfile::TempDir) -> AuthService {
        let store: Arc<dyn BlogStore> =
            Arc::new(FileBlogStore::open(temp.path()).expect("open store"));
        AuthService::new(&test_config(), store, TokenRegistry::new())
    }

    #[tokio::test]
    async fn register_then_login() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);

        let session = service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");
        assert_eq!(session.token_type, "bearer");
        assert_eq!(session.expires_in, 12 * 3600);

        let login = service.login("ana@example.com", "password-123").expect("login");
        assert_eq!(login.user.id, session.user.id);
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");

        let wrong_secret = service
            .login("ana@example.com", "nope-nope-nope")
            .expect_err("wrong password");
        let wrong_identity = service
            .login("nobody@example.com", "password-123")
            .expect_err("unknown email");
        assert!(matches!(wrong_secret, ApiError::InvalidCredentials));
        assert!(matches!(wrong_identity, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn revoke_then_authenticate_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        let session = service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");

        assert!(service.authenticate(&session.token).await.is_ok());
        service.revoke(&session.token).await.expect("revoke");

        let err = service
            .authenticate(&session.token)
            .await
            .expect_err("revoked token");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn refresh_invalidates_old_token() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        let session = service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");

        let refreshed = service.refresh(&session.token).await.expect("refresh");
        assert_ne!(refreshed.token, session.token);

        let err = service
            .authenticate(&session.token)
            .await
            .expect_err("old token");
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(service.authenticate(&refreshed.token).await.is_ok());
    }

    #[tokio::test]
    async fn double_revoke_is_unauthorized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        let session = service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");

        service.revoke(&session.token).await.expect("revoke");
        let err = service
            .revoke(&session.token)
            .await
            .expect_err("already revoked");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        let err = service
            .authenticate("not-a-jwt")
            .await
            .expect_err("garbage");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = build_service(&temp);
        service
            .register("Ana", "ana@example.com", "password-123")
            .expect("register");
        let err = service
            .register("Ana Again", "ana@example.com", "password-456")
            .expect_err("duplicate email");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
