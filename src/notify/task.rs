// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::sink::{NotificationPayload, NotificationSink};
use crate::store::BlogStore;

/// Unit of work enqueued when a comment is created. Carries only the
/// comment's identity; everything else is resolved when the task runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentNotificationTask {
    pub comment_id: u64,
}

/// Failure of a single task attempt. The queue decides whether another
/// attempt happens.
#[derive(Debug)]
pub enum TaskError {
    Resolution(String),
    Delivery(String),
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::Resolution(msg) => write!(f, "Resolution error: {}", msg),
            TaskError::Delivery(msg) => write!(f, "Delivery error: {}", msg),
        }
    }
}

impl std::error::Error for TaskError {}

/// What the worker invokes per delivered task.
pub trait TaskHandler: Send + Sync {
    fn handle(&self, task: &CommentNotificationTask) -> Result<(), TaskError>;
}

/// Resolves a comment notification and hands it to the sink. A comment or
/// post deleted between enqueue and consumption surfaces as a task failure
/// and goes through the queue's retry policy.
pub struct CommentNotifier {
    store: Arc<dyn BlogStore>,
    sink: Arc<dyn NotificationSink>,
    base_url: String,
}

impl CommentNotifier {
    pub fn new(store: Arc<dyn BlogStore>, sink: Arc<dyn NotificationSink>, base_url: &str) -> Self {
        Self {
            store,
            sink,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn post_url(&self, post_id: u64) -> String {
        format!("{}/posts/{}", self.base_url, post_id)
    }
}

impl TaskHandler for CommentNotifier {
    fn handle(&self, task: &CommentNotificationTask) -> Result<(), TaskError> {
        let comment = self
            .store
            .find_comment(task.comment_id)
            .map_err(|err| TaskError::Resolution(err.to_string()))?;
        let post = self
            .store
            .find_post(comment.post_id)
            .map_err(|err| TaskError::Resolution(err.to_string()))?;
        let post_author = self
            .store
            .find_user(post.user_id)
            .map_err(|err| TaskError::Resolution(err.to_string()))?;
        let comment_author = self
            .store
            .find_user(comment.user_id)
            .map_err(|err| TaskError::Resolution(err.to_string()))?;

        // Commenting on your own post notifies nobody. That is a successful
        // outcome, not an error.
        if post_author.id == comment_author.id {
            log::debug!(
                "Comment {} by post author {}; notification suppressed",
                comment.id,
                post_author.id
            );
            return Ok(());
        }

        let payload = NotificationPayload {
            post_title: post.title.clone(),
            post_author: post_author.name.clone(),
            comment_author: comment_author.name.clone(),
            comment_body: comment.body.clone(),
            post_url: self.post_url(post.id),
        };

        self.sink
            .deliver(&post_author.email, &payload)
            .map_err(|err| TaskError::Delivery(err.to_string()))?;
        log::debug!(
            "Comment notification delivered (comment={}, post={}, recipient={})",
            comment.id,
            post.id,
            post_author.id
        );
        Ok(())
    }
}
