// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Tag slug is always derived from the name; it is never settable on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: u64,
    pub user_id: u64,
    pub category_id: u64,
    pub title: String,
    pub body: String,
    /// Null means draft; visibility is derived from this field alone.
    pub published_at: Option<DateTime<Utc>>,
    /// Unordered, duplicate-free tag membership.
    #[serde(default)]
    pub tag_ids: BTreeSet<u64>,
    pub created_at: DateTime<Utc>,
}

impl PostRecord {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: u64,
    pub post_id: u64,
    pub user_id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new post; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: u64,
    pub category_id: u64,
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Lowercased, punctuation-normalized form of a name. Runs of
/// non-alphanumeric characters collapse to a single hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }
    slug
}
