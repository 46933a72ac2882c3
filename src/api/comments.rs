// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comments::CommentService;
use crate::error::ApiError;
use crate::iam::require_user;
use crate::store::CommentRecord;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    post_id: u64,
    body: String,
}

#[derive(Serialize)]
struct CommentResponse {
    id: u64,
    post_id: u64,
    user_id: u64,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRecord> for CommentResponse {
    fn from(comment: CommentRecord) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

pub async fn create_comment(
    req: HttpRequest,
    comments: web::Data<CommentService>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req)?;
    let comment = comments
        .create_comment(user.id, body.post_id, &body.body)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}
