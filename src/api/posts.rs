// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::iam::require_user;
use crate::posts::{PostDraft, PostService, PostWithTags};
use crate::store::TagRecord;

#[derive(Deserialize)]
pub struct CreatePostRequest {
    title: String,
    body: String,
    category_id: Option<u64>,
    #[serde(default)]
    publish: bool,
    tag_ids: Option<Vec<u64>>,
}

#[derive(Deserialize)]
pub struct CreateTagRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct TagIdsRequest {
    tag_ids: Vec<u64>,
}

#[derive(Serialize)]
struct TagView {
    id: u64,
    name: String,
    slug: String,
}

impl From<&TagRecord> for TagView {
    fn from(tag: &TagRecord) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }
    }
}

#[derive(Serialize)]
struct PostResponse {
    id: u64,
    user_id: u64,
    category_id: u64,
    title: String,
    body: String,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    tags: Vec<TagView>,
}

impl From<PostWithTags> for PostResponse {
    fn from(value: PostWithTags) -> Self {
        Self {
            id: value.post.id,
            user_id: value.post.user_id,
            category_id: value.post.category_id,
            title: value.post.title,
            body: value.post.body,
            published_at: value.post.published_at,
            created_at: value.post.created_at,
            tags: value.tags.iter().map(TagView::from).collect(),
        }
    }
}

pub async fn create_post(
    req: HttpRequest,
    posts: web::Data<PostService>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req)?;
    let body = body.into_inner();
    let created = posts.create_post(
        user.id,
        PostDraft {
            title: body.title,
            body: body.body,
            category_id: body.category_id,
            publish: body.publish,
            tag_ids: body.tag_ids,
        },
    )?;
    Ok(HttpResponse::Created().json(PostResponse::from(created)))
}

pub async fn get_post(
    posts: web::Data<PostService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let found = posts.get_post(path.into_inner())?;
    Ok(HttpResponse::Ok().json(PostResponse::from(found)))
}

pub async fn create_tag(
    req: HttpRequest,
    posts: web::Data<PostService>,
    body: web::Json<CreateTagRequest>,
) -> Result<HttpResponse, ApiError> {
    require_user(&req)?;
    let tag = posts.create_tag(&body.name)?;
    Ok(HttpResponse::Created().json(TagView::from(&tag)))
}

pub async fn attach_tags(
    req: HttpRequest,
    posts: web::Data<PostService>,
    path: web::Path<u64>,
    body: web::Json<TagIdsRequest>,
) -> Result<HttpResponse, ApiError> {
    require_user(&req)?;
    let updated = posts.attach_tags(path.into_inner(), &body.tag_ids)?;
    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}

pub async fn detach_tags(
    req: HttpRequest,
    posts: web::Data<PostService>,
    path: web::Path<u64>,
    body: web::Json<TagIdsRequest>,
) -> Result<HttpResponse, ApiError> {
    require_user(&req)?;
    let updated = posts.detach_tags(path.into_inner(), &body.tag_ids)?;
    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}

pub async fn sync_tags(
    req: HttpRequest,
    posts: web::Data<PostService>,
    path: web::Path<u64>,
    body: web::Json<TagIdsRequest>,
) -> Result<HttpResponse, ApiError> {
    require_user(&req)?;
    let updated = posts.sync_tags(path.into_inner(), &body.tag_ids)?;
    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}
