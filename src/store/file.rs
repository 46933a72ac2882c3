// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::records::{
    CategoryRecord, CommentRecord, NewPost, PostRecord, TagRecord, UserRecord, slugify,
};
use super::yaml::{read_yaml_file, write_yaml_file};
use super::{BlogStore, StoreError};

const USERS_FILE_NAME: &str = "users.yaml";
const CATEGORIES_FILE_NAME: &str = "categories.yaml";
const TAGS_FILE_NAME: &str = "tags.yaml";
const POSTS_FILE_NAME: &str = "posts.yaml";
const COMMENTS_FILE_NAME: &str = "comments.yaml";

/// YAML-backed store. Each entity lives in its own file under the state
/// directory, mirrored by an in-memory map. Writers hold the map's write
/// lock across check-mutate-persist, so set operations on a post's tags are
/// serialized and never observable half-applied.
pub struct FileBlogStore {
    state_dir: PathBuf,
    users: RwLock<BTreeMap<u64, UserRecord>>,
    categories: RwLock<BTreeMap<u64, CategoryRecord>>,
    tags: RwLock<BTreeMap<u64, TagRecord>>,
    posts: RwLock<BTreeMap<u64, PostRecord>>,
    comments: RwLock<BTreeMap<u64, CommentRecord>>,
}

impl FileBlogStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(state_dir).map_err(|err| {
            StoreError::FileError(format!(
                "Failed to create state directory {}: {}",
                state_dir.display(),
                err
            ))
        })?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            users: RwLock::new(load_map(state_dir, USERS_FILE_NAME, "users")?),
            categories: RwLock::new(load_map(state_dir, CATEGORIES_FILE_NAME, "categories")?),
            tags: RwLock::new(load_map(state_dir, TAGS_FILE_NAME, "tags")?),
            posts: RwLock::new(load_map(state_dir, POSTS_FILE_NAME, "posts")?),
            comments: RwLock::new(load_map(state_dir, COMMENTS_FILE_NAME, "comments")?),
        })
    }

    fn persist<T: serde::Serialize>(
        &self,
        file_name: &str,
        label: &str,
        map: &BTreeMap<u64, T>,
    ) -> Result<(), StoreError> {
        write_yaml_file(&self.state_dir.join(file_name), label, map)
    }

    /// Validate that every id in `tag_ids` names an existing tag. Rejecting
    /// here, before any mutation, is what makes the batch all-or-nothing.
    fn check_tag_references(
        tags: &BTreeMap<u64, TagRecord>,
        tag_ids: &[u64],
    ) -> Result<(), StoreError> {
        for tag_id in tag_ids {
            if !tags.contains_key(tag_id) {
                return Err(StoreError::InvalidReference(format!(
                    "Tag {} does not exist",
                    tag_id
                )));
            }
        }
        Ok(())
    }

    fn mutate_post_tags<F>(&self, post_id: u64, tag_ids: &[u64], apply: F) -> Result<PostRecord, StoreError>
    where
        F: FnOnce(&mut BTreeSet<u64>, &[u64]),
    {
        let tags = read_guard(&self.tags, "tags")?;
        Self::check_tag_references(&tags, tag_ids)?;

        let mut posts = write_guard(&self.posts, "posts")?;
        let post = posts
            .get_mut(&post_id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {} does not exist", post_id)))?;

        let before = post.tag_ids.clone();
        apply(&mut post.tag_ids, tag_ids);
        if post.tag_ids == before {
            // Nothing changed; skip the journal write.
            return Ok(post.clone());
        }
        let updated = post.clone();
        if let Err(err) = self.persist(POSTS_FILE_NAME, "posts", &posts) {
            // Keep memory and disk consistent when the write fails.
            if let Some(post) = posts.get_mut(&post_id) {
                post.tag_ids = before;
            }
            return Err(err);
        }
        Ok(updated)
    }
}

fn load_map<T: serde::de::DeserializeOwned>(
    state_dir: &Path,
    file_name: &str,
    label: &str,
) -> Result<BTreeMap<u64, T>, StoreError> {
    Ok(read_yaml_file(&state_dir.join(file_name), label)?.unwrap_or_default())
}

fn next_id<T>(map: &BTreeMap<u64, T>) -> u64 {
    map.keys().next_back().map(|id| id + 1).unwrap_or(1)
}

fn read_guard<'a, T>(
    lock: &'a RwLock<T>,
    label: &str,
) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::FileError(format!("{} store lock poisoned", label)))
}

fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    label: &str,
) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::FileError(format!("{} store lock poisoned", label)))
}

impl BlogStore for FileBlogStore {
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = write_guard(&self.users, "users")?;
        if users.values().any(|user| user.email == email) {
            return Err(StoreError::Duplicate(format!(
                "A user with email {} already exists",
                email
            )));
        }
        let user = UserRecord {
            id: next_id(&users),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        if let Err(err) = self.persist(USERS_FILE_NAME, "users", &users) {
            users.remove(&user.id);
            return Err(err);
        }
        Ok(user)
    }

    fn find_user(&self, id: u64) -> Result<UserRecord, StoreError> {
        read_guard(&self.users, "users")?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("User {} does not exist", id)))
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(read_guard(&self.users, "users")?
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn create_category(&self, name: &str) -> Result<CategoryRecord, StoreError> {
        let mut categories = write_guard(&self.categories, "categories")?;
        let category = CategoryRecord {
            id: next_id(&categories),
            name: name.to_string(),
            slug: slugify(name),
        };
        categories.insert(category.id, category.clone());
        if let Err(err) = self.persist(CATEGORIES_FILE_NAME, "categories", &categories) {
            categories.remove(&category.id);
            return Err(err);
        }
        Ok(category)
    }

    fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        Ok(read_guard(&self.categories, "categories")?
            .values()
            .cloned()
            .collect())
    }

    fn create_tag(&self, name: &str) -> Result<TagRecord, StoreError> {
        let mut tags = write_guard(&self.tags, "tags")?;
        if tags.values().any(|tag| tag.name == name) {
            return Err(StoreError::Duplicate(format!(
                "A tag named {} already exists",
                name
            )));
        }
        let tag = TagRecord {
            id: next_id(&tags),
            name: name.to_string(),
            slug: slugify(name),
        };
        tags.insert(tag.id, tag.clone());
        if let Err(err) = self.persist(TAGS_FILE_NAME, "tags", &tags) {
            tags.remove(&tag.id);
            return Err(err);
        }
        Ok(tag)
    }

    fn rename_tag(&self, id: u64, name: &str) -> Result<TagRecord, StoreError> {
        let mut tags = write_guard(&self.tags, "tags")?;
        let previous = tags
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Tag {} does not exist", id)))?;
        let renamed = TagRecord {
            id,
            name: name.to_string(),
            // The slug always follows the name.
            slug: slugify(name),
        };
        tags.insert(id, renamed.clone());
        if let Err(err) = self.persist(TAGS_FILE_NAME, "tags", &tags) {
            tags.insert(id, previous);
            return Err(err);
        }
        Ok(renamed)
    }

    fn find_tag(&self, id: u64) -> Result<TagRecord, StoreError> {
        read_guard(&self.tags, "tags")?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Tag {} does not exist", id)))
    }

    fn create_post(&self, new_post: NewPost) -> Result<PostRecord, StoreError> {
        {
            let users = read_guard(&self.users, "users")?;
            if !users.contains_key(&new_post.user_id) {
                return Err(StoreError::InvalidReference(format!(
                    "User {} does not exist",
                    new_post.user_id
                )));
            }
        }
        {
            let categories = read_guard(&self.categories, "categories")?;
            if !categories.contains_key(&new_post.category_id) {
                return Err(StoreError::InvalidReference(format!(
                    "Category {} does not exist",
                    new_post.category_id
                )));
            }
        }
        let mut posts = write_guard(&self.posts, "posts")?;
        let post = PostRecord {
            id: next_id(&posts),
            user_id: new_post.user_id,
            category_id: new_post.category_id,
            title: new_post.title,
            body: new_post.body,
            published_at: new_post.published_at,
            tag_ids: BTreeSet::new(),
            created_at: Utc::now(),
        };
        posts.insert(post.id, post.clone());
        if let Err(err) = self.persist(POSTS_FILE_NAME, "posts", &posts) {
            posts.remove(&post.id);
            return Err(err);
        }
        Ok(post)
    }

    fn find_post(&self, id: u64) -> Result<PostRecord, StoreError> {
        read_guard(&self.posts, "posts")?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Post {} does not exist", id)))
    }

    fn tags_for_post(&self, post: &PostRecord) -> Result<Vec<TagRecord>, StoreError> {
        let tags = read_guard(&self.tags, "tags")?;
        let mut resolved: Vec<TagRecord> = post
            .tag_ids
            .iter()
            .filter_map(|id| tags.get(id).cloned())
            .collect();
        resolved.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(resolved)
    }

    fn attach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError> {
        self.mutate_post_tags(post_id, tag_ids, |set, ids| {
            set.extend(ids.iter().copied());
        })
    }

    fn detach_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError> {
        self.mutate_post_tags(post_id, tag_ids, |set, ids| {
            for id in ids {
                set.remove(id);
            }
        })
    }

    fn sync_tags(&self, post_id: u64, tag_ids: &[u64]) -> Result<PostRecord, StoreError> {
        self.mutate_post_tags(post_id, tag_ids, |set, ids| {
            *set = ids.iter().copied().collect();
        })
    }

    fn create_comment(
        &self,
        post_id: u64,
        user_id: u64,
        body: &str,
    ) -> Result<CommentRecord, StoreError> {
        {
            let posts = read_guard(&self.posts, "posts")?;
            if !posts.contains_key(&post_id) {
                return Err(StoreError::NotFound(format!(
                    "Post {} does not exist",
                    post_id
                )));
            }
        }
        {
            let users = read_guard(&self.users, "users")?;
            if !users.contains_key(&user_id) {
                return Err(StoreError::InvalidReference(format!(
                    "User {} does not exist",
                    user_id
                )));
            }
        }
        let mut comments = write_guard(&self.comments, "comments")?;
        let comment = CommentRecord {
            id: next_id(&comments),
            post_id,
            user_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        comments.insert(comment.id, comment.clone());
        if let Err(err) = self.persist(COMMENTS_FILE_NAME, "comments", &comments) {
            comments.remove(&comment.id);
            return Err(err);
        }
        Ok(comment)
    }

    fn find_comment(&self, id: u64) -> Result<CommentRecord, StoreError> {
        read_guard(&self.comments, "comments")?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Comment {} does not exist", id)))
    }
}
