// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

#[actix_web::test]
async fn register_returns_session_without_password() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "password-123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = common::read_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 12 * 3600);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert!(body["user"].get("password_hash").is_none());
}

#[actix_web::test]
async fn login_with_wrong_password_is_uniform_401() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "password-123"
        }))
        .to_request();
    test::call_service(&app, req).await;

    let bad_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ana@example.com", "password": "wrong-wrong"}))
        .to_request();
    let resp = test::call_service(&app, bad_password).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = common::read_json(resp).await;
    assert_eq!(body["error"], "invalid_credentials");

    let bad_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "nobody@example.com", "password": "password-123"}))
        .to_request();
    let resp = test::call_service(&app, bad_email).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = common::read_json(resp).await;
    assert_eq!(body["error"], "invalid_credentials");
}

#[actix_web::test]
async fn short_password_rejected_as_validation_error() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"name": "Ana", "email": "ana@example.com", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(resp).await;
    assert_eq!(body["error"], "validation");
}

#[actix_web::test]
async fn me_requires_valid_token() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let anonymous = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, anonymous).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "password-123"
        }))
        .to_request();
    let body = common::read_json(test::call_service(&app, req).await).await;
    let token = body["token"].as_str().expect("token").to_string();

    let me = common::bearer(test::TestRequest::get().uri("/api/auth/me"), &token).to_request();
    let resp = test::call_service(&app, me).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me_body = common::read_json(resp).await;
    assert_eq!(me_body["name"], "Ana");

    let garbage =
        common::bearer(test::TestRequest::get().uri("/api/auth/me"), "not-a-jwt").to_request();
    let resp = test::call_service(&app, garbage).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_revokes_only_that_token() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let register = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "password-123"
        }))
        .to_request();
    let first: Value = common::read_json(test::call_service(&app, register).await).await;
    let first_token = first["token"].as_str().expect("token").to_string();

    // A second login gives an independent token for the same user.
    let login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ana@example.com", "password": "password-123"}))
        .to_request();
    let second: Value = common::read_json(test::call_service(&app, login).await).await;
    let second_token = second["token"].as_str().expect("token").to_string();

    let logout =
        common::bearer(test::TestRequest::post().uri("/api/auth/logout"), &first_token)
            .to_request();
    let resp = test::call_service(&app, logout).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let revoked =
        common::bearer(test::TestRequest::get().uri("/api/auth/me"), &first_token).to_request();
    assert_eq!(
        test::call_service(&app, revoked).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let still_valid =
        common::bearer(test::TestRequest::get().uri("/api/auth/me"), &second_token).to_request();
    assert_eq!(
        test::call_service(&app, still_valid).await.status(),
        StatusCode::OK
    );

    // Logging out again with the dead token is rejected.
    let double_logout =
        common::bearer(test::TestRequest::post().uri("/api/auth/logout"), &first_token)
            .to_request();
    assert_eq!(
        test::call_service(&app, double_logout).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn refresh_rotates_the_token() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;

    let register = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "password-123"
        }))
        .to_request();
    let session: Value = common::read_json(test::call_service(&app, register).await).await;
    let old_token = session["token"].as_str().expect("token").to_string();

    let refresh =
        common::bearer(test::TestRequest::post().uri("/api/auth/refresh"), &old_token)
            .to_request();
    let resp = test::call_service(&app, refresh).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed = common::read_json(resp).await;
    let new_token = refreshed["token"].as_str().expect("token").to_string();
    assert_ne!(new_token, old_token);

    let stale =
        common::bearer(test::TestRequest::get().uri("/api/auth/me"), &old_token).to_request();
    assert_eq!(
        test::call_service(&app, stale).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let fresh =
        common::bearer(test::TestRequest::get().uri("/api/auth/me"), &new_token).to_request();
    assert_eq!(test::call_service(&app, fresh).await.status(), StatusCode::OK);
}
