// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod file;
mod records;
pub mod yaml;

pub use file::FileBlogStore;
pub use records::{
    CategoryRecord, CommentRecord, NewPost, PostRecord, TagRecord, UserRecord, slugify,
};

#[derive(Debug, Clone)]
pub enum StoreError {
    NotFound(String),
    /// An id inside a batch membership operation does not exist; the whole
    /// operation is rejected without side effects.
    InvalidReference(String),
    Duplicate(String),
    FileError(String),
    ParseError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StoreError::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            StoreError::Duplicate(msg) => write!(f, "Duplicate: {}", msg),
            StoreError::FileError(msg) => write!(f, "File error: {}", msg),
            StoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for crate::error::ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => crate::error::ApiError::NotFound(msg),
            StoreError::InvalidReference(msg) => crate::error::ApiError::InvalidReference(msg),
            StoreError::Duplicate(msg) => crate::error::ApiError::Validation(msg),
            StoreError::FileError(msg) => crate::error::ApiError::Storage(msg),
            StoreError::ParseError(msg) => crate::error::ApiError::Storage(msg),
        }
    }
}

/// Persistent data access for the blog entities. Point lookups, creates, and
/// the set-based membership operations on the post-tag relation. Membership
/// operations are atomic: a concurrent reader never observes a partially
/// applied set, and a failed reference check applies nothing.
pub trait BlogStore: Send + Sync {
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;
    fn find_user(&self, id: u64) -> Result<UserRecord, StoreError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    fn create_category(&self, name: &str) -> Result<CategoryRecord, StoreError>;
    fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError>;

    fn create_tag(&self, name: &str) -> Result<TagRecord, StoreError>;
    fn rename_tag(&self, id: u64, name: &str) -> Result<TagRecord, StoreError>;
    fn find_tag(&self, id: u64) -> Result<TagRecord, StoreError>;

    fn create_post(&self, new_post: NewPost) -> Result<PostRecord, StoreError>;
    fn find_post(&self, id: u64) -> Result<PostRecord, StoreError>;
    /// Resolve a post's tag ids into records, sorted by name.
    fn tags_for_post(&self, post: &PostRecord) -> Result<Vec<TagRecord>, StoreError>;

    fn attach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError>;
    fn detach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError>;
    fn sync_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError>;

    fn create_comment(
        &self,
        post_id: u64,
        user_id: u64,
        body: &str,
    ) -> Result<CommentRecord, StoreError>;
    fn find_comment(&self, id: u64) -> Result<CommentRecord, StoreError>;
}
