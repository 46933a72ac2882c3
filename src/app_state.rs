// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web::{self, Data};
use std::path::Path;
use std::sync::Arc;

use crate::comments::CommentService;
use crate::config::Config;
use crate::error::ApiError;
use crate::iam::{AuthService, TokenRegistry};
use crate::notify::{CommentNotifier, LogNotificationSink, NotificationQueue, TaskHandler};
use crate::posts::PostService;
use crate::store::{BlogStore, FileBlogStore};

pub const STATE_DIR_NAME: &str = "state";

/// Everything the HTTP layer and the notification worker share. Built once
/// at startup (or per test) from a config and a runtime root.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn BlogStore>,
    pub auth: Data<AuthService>,
    pub posts: Data<PostService>,
    pub comments: Data<CommentService>,
    pub queue: NotificationQueue,
    pub notifier: Arc<dyn TaskHandler>,
}

impl AppState {
    pub fn initialize(config: Config, runtime_root: &Path) -> Result<Self, ApiError> {
        let state_dir = runtime_root.join(STATE_DIR_NAME);
        let store: Arc<dyn BlogStore> = Arc::new(FileBlogStore::open(&state_dir)?);

        let queue = NotificationQueue::open(&state_dir, &config.notifications)
            .map_err(|err| ApiError::Storage(err.to_string()))?;

        let posts = PostService::new(store.clone());
        posts.ensure_default_category()?;

        let auth = AuthService::new(&config, store.clone(), TokenRegistry::new());
        let comments = CommentService::new(store.clone(), queue.clone());
        let notifier: Arc<dyn TaskHandler> = Arc::new(CommentNotifier::new(
            store.clone(),
            Arc::new(LogNotificationSink),
            &config.app.base_url,
        ));

        Ok(Self {
            config,
            store,
            auth: Data::new(auth),
            posts: Data::new(posts),
            comments: Data::new(comments),
            queue,
            notifier,
        })
    }

    /// Register shared services and the API routes on an App.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.auth.clone())
            .app_data(self.posts.clone())
            .app_data(self.comments.clone());
        crate::api::configure(cfg);
    }
}
