// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test};
use quill::app_state::AppState;
use quill::config::test_config;
use quill::iam::BearerAuthMiddlewareFactory;
use serde_json::Value;
use std::sync::Arc;

pub struct TestHarness {
    pub temp: tempfile::TempDir,
    pub state: Arc<AppState>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let state =
            Arc::new(AppState::initialize(test_config(), temp.path()).expect("app state"));
        Self { temp, state }
    }
}

pub fn build_test_app(
    state: Arc<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(BearerAuthMiddlewareFactory)
        .configure(move |cfg| state.configure(cfg))
}

pub fn bearer(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

pub async fn read_json(resp: ServiceResponse<impl MessageBody>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}
