// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::Utc;
use std::sync::Arc;

use crate::error::ApiError;
use crate::store::{BlogStore, NewPost, PostRecord, TagRecord};

pub const DEFAULT_CATEGORY_NAME: &str = "General";

/// A post together with its resolved tags, the shape the API serializes.
#[derive(Debug, Clone)]
pub struct PostWithTags {
    pub post: PostRecord,
    pub tags: Vec<TagRecord>,
}

/// Fields accepted when creating a post. The category defaults to the
/// seeded one; tags are synced after the post exists.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub category_id: Option<u64>,
    pub publish: bool,
    pub tag_ids: Option<Vec<u64>>,
}

/// Post lifecycle and the post-tag membership operations. Tag membership is
/// delegated to the store, which applies each batch atomically; this layer
/// adds validation and resolves tag records for responses.
pub struct PostService {
    store: Arc<dyn BlogStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Make sure at least one category exists so post creation can default
    /// to it. Called once at startup.
    pub fn ensure_default_category(&self) -> Result<(), ApiError> {
        if self.store.list_categories()?.is_empty() {
            let category = self.store.create_category(DEFAULT_CATEGORY_NAME)?;
            log::info!("Seeded default category {} ({})", category.id, category.name);
        }
        Ok(())
    }

    pub fn create_post(&self, user_id: u64, draft: PostDraft) -> Result<PostWithTags, ApiError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
        if draft.body.trim().is_empty() {
            return Err(ApiError::Validation("Body is required".to_string()));
        }

        let category_id = match draft.category_id {
            Some(id) => id,
            None => self
                .store
                .list_categories()?
                .first()
                .map(|category| category.id)
                .ok_or_else(|| ApiError::Storage("No categories configured".to_string()))?,
        };

        let post = self.store.create_post(NewPost {
            user_id,
            category_id,
            title: title.to_string(),
            body: draft.body,
            published_at: draft.publish.then(Utc::now),
        })?;
        log::info!("Created post {} by user {}", post.id, user_id);

        let post = match draft.tag_ids {
            Some(tag_ids) => self.store.sync_tags(post.id, &tag_ids)?,
            None => post,
        };
        self.with_tags(post)
    }

    pub fn get_post(&self, id: u64) -> Result<PostWithTags, ApiError> {
        let post = self.store.find_post(id)?;
        self.with_tags(post)
    }

    pub fn create_tag(&self, name: &str) -> Result<TagRecord, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Tag name is required".to_string()));
        }
        let tag = self.store.create_tag(name)?;
        log::info!("Created tag {} ({})", tag.id, tag.slug);
        Ok(tag)
    }

    pub fn attach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostWithTags, ApiError> {
        let post = self.store.attach_tags(post_id, tag_ids)?;
        log::debug!("Attached {} tag(s) to post {}", tag_ids.len(), post_id);
        self.with_tags(post)
    }

    pub fn detach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostWithTags, ApiError> {
        let post = self.store.detach_tags(post_id, tag_ids)?;
        log::debug!("Detached {} tag(s) from post {}", tag_ids.len(), post_id);
        self.with_tags(post)
    }

    pub fn sync_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostWithTags, ApiError> {
        let post = self.store.sync_tags(post_id, tag_ids)?;
        log::debug!("Synced post {} to {} tag(s)", post_id, tag_ids.len());
        self.with_tags(post)
    }

    fn with_tags(&self, post: PostRecord) -> Result<PostWithTags, ApiError> {
        let tags = self.store.tags_for_post(&post)?;
        Ok(PostWithTags { post, tags })
    }
}
