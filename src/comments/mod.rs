// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::error::ApiError;
use crate::notify::{CommentNotificationTask, NotificationQueue};
use crate::store::{BlogStore, CommentRecord};

/// Comment creation. Persists the comment, then durably enqueues the
/// notification task; the request returns without waiting for delivery.
pub struct CommentService {
    store: Arc<dyn BlogStore>,
    queue: NotificationQueue,
}

impl CommentService {
    pub fn new(store: Arc<dyn BlogStore>, queue: NotificationQueue) -> Self {
        Self { store, queue }
    }

    pub async fn create_comment(
        &self,
        user_id: u64,
        post_id: u64,
        body: &str,
    ) -> Result<CommentRecord, ApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ApiError::Validation("Comment body is required".to_string()));
        }

        let comment = self.store.create_comment(post_id, user_id, body)?;
        log::info!(
            "Created comment {} on post {} by user {}",
            comment.id,
            post_id,
            user_id
        );

        // The comment exists either way; the queue is the durability
        // boundary for the notification, not for the comment.
        self.queue
            .enqueue(CommentNotificationTask {
                comment_id: comment.id,
            })
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::store::{FileBlogStore, NewPost};

    struct Fixture {
        _temp: tempfile::TempDir,
        service: CommentService,
        queue: NotificationQueue,
        reader_id: u64,
        post_id: u64,
    }

    fn build_fixture() -> Fixture {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(FileBlogStore::open(temp.path()).expect("open store"));
        let queue = NotificationQueue::open(temp.path(), &NotificationConfig::default())
            .expect("open queue");

        let author = store
            .create_user("Author", "author@example.com", "hash")
            .expect("author");
        let reader = store
            .create_user("Reader", "reader@example.com", "hash")
            .expect("reader");
        let category = store.create_category("General").expect("category");
        let post = store
            .create_post(NewPost {
                user_id: author.id,
                category_id: category.id,
                title: "A Post".to_string(),
                body: "Contents".to_string(),
                published_at: None,
            })
            .expect("post");

        Fixture {
            _temp: temp,
            service: CommentService::new(store, queue.clone()),
            queue,
            reader_id: reader.id,
            post_id: post.id,
        }
    }

    #[tokio::test]
    async fn comment_is_stored_and_task_enqueued() {
        let fixture = build_fixture();
        let comment = fixture
            .service
            .create_comment(fixture.reader_id, fixture.post_id, "well written")
            .await
            .expect("comment");
        assert_eq!(comment.body, "well written");
        assert_eq!(fixture.queue.pending_count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn blank_body_rejected_without_enqueue() {
        let fixture = build_fixture();
        let err = fixture
            .service
            .create_comment(fixture.reader_id, fixture.post_id, "   ")
            .await
            .expect_err("blank body");
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(fixture.queue.pending_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let fixture = build_fixture();
        let err = fixture
            .service
            .create_comment(fixture.reader_id, 404, "hello")
            .await
            .expect_err("missing post");
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(fixture.queue.pending_count().await.expect("count"), 0);
    }
}
