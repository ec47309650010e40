//! Blog content records and their in-memory collections.
//!
//! Every record type gets the same add/edit/drop surface through
//! [`Collection`]. Ids are assigned on insert and never reused.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A row addressable by a numeric id.
pub trait Record: Clone + Send + Sync + 'static {
    /// Name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);

    /// Rejects records that may not be stored as-is.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dict {
    #[serde(default)]
    pub id: u64,
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub intro: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub intro: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub intro: String,
}

/// A post or a standalone page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    /// URL slug.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub markdown: String,
    /// Category id; zero for pages.
    #[serde(default)]
    pub cate_id: u64,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub analytics: String,
}

fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

impl Record for Dict {
    const KIND: &'static str = "dict";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn validate(&self) -> CoreResult<()> {
        require("key", &self.key)
    }
}

impl Record for Category {
    const KIND: &'static str = "category";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn validate(&self) -> CoreResult<()> {
        require("name", &self.name)
    }
}

impl Record for Tag {
    const KIND: &'static str = "tag";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn validate(&self) -> CoreResult<()> {
        require("name", &self.name)
    }
}

impl Record for Article {
    const KIND: &'static str = "article";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn validate(&self) -> CoreResult<()> {
        require("title", &self.title)
    }
}

#[derive(Debug)]
pub struct Collection<T> {
    rows: DashMap<u64, T>,
    next_id: AtomicU64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under a fresh id and returns the stored copy.
    pub fn add(&self, mut record: T) -> CoreResult<T> {
        record.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        record.set_id(id);
        self.rows.insert(id, record.clone());
        tracing::debug!("{} added: id={id}", T::KIND);
        Ok(record)
    }

    /// Replaces the record with the same id.
    pub fn edit(&self, record: T) -> CoreResult<T> {
        record.validate()?;
        let mut row = self
            .rows
            .get_mut(&record.id())
            .ok_or_else(|| Self::missing(record.id()))?;
        *row = record.clone();
        Ok(record)
    }

    /// Replaces the record with the result of `f` applied to the stored one.
    pub fn update(&self, id: u64, f: impl FnOnce(&T) -> T) -> CoreResult<T> {
        let mut row = self.rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        let mut next = f(row.value());
        next.set_id(id);
        next.validate()?;
        *row = next.clone();
        Ok(next)
    }

    pub fn drop(&self, id: u64) -> CoreResult<T> {
        let (_, row) = self.rows.remove(&id).ok_or_else(|| Self::missing(id))?;
        tracing::debug!("{} dropped: id={id}", T::KIND);
        Ok(row)
    }

    pub fn get(&self, id: u64) -> Option<T> {
        self.rows.get(&id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    /// All records ordered by id.
    pub fn list(&self) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| r.id());
        rows
    }

    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.iter().any(|r| pred(r.value()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn missing(id: u64) -> CoreError {
        CoreError::NotFound(format!("{} {id}", T::KIND))
    }
}

/// Everything an admin can edit besides accounts.
#[derive(Debug, Default)]
pub struct Content {
    pub dicts: Collection<Dict>,
    pub categories: Collection<Category>,
    pub tags: Collection<Tag>,
    pub posts: Collection<Article>,
    pub pages: Collection<Article>,
    global: RwLock<Global>,
}

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> Global {
        self.global
            .read()
            .map(|g| g.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set_global(&self, global: Global) {
        let mut slot = self
            .global
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = global;
    }

    /// Adds a post after checking that its category and tags exist.
    pub fn add_post(&self, post: Article, now: DateTime<Utc>) -> CoreResult<Article> {
        self.check_refs(&post)?;
        self.posts.add(Article {
            created_at: Some(now),
            updated_at: Some(now),
            ..post
        })
    }

    pub fn edit_post(&self, post: Article, now: DateTime<Utc>) -> CoreResult<Article> {
        self.check_refs(&post)?;
        self.posts.update(post.id, |old| Article {
            created_at: old.created_at,
            updated_at: Some(now),
            ..post
        })
    }

    pub fn add_page(&self, page: Article, now: DateTime<Utc>) -> CoreResult<Article> {
        self.pages.add(Article {
            cate_id: 0,
            tags: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
            ..page
        })
    }

    pub fn edit_page(&self, page: Article, now: DateTime<Utc>) -> CoreResult<Article> {
        self.pages.update(page.id, |old| Article {
            cate_id: 0,
            tags: Vec::new(),
            created_at: old.created_at,
            updated_at: Some(now),
            ..page
        })
    }

    /// Drops a category unless a post still files under it.
    pub fn drop_category(&self, id: u64) -> CoreResult<Category> {
        if self.posts.any(|p| p.cate_id == id) {
            return Err(CoreError::Conflict(format!(
                "category {id} still has posts"
            )));
        }
        self.categories.drop(id)
    }

    /// Drops a tag and detaches it from every post.
    pub fn drop_tag(&self, id: u64) -> CoreResult<Tag> {
        let tag = self.tags.drop(id)?;
        for post in self.posts.list() {
            if post.tags.contains(&id) {
                self.posts.update(post.id, |p| Article {
                    tags: p.tags.iter().copied().filter(|t| *t != id).collect(),
                    ..p.clone()
                })?;
            }
        }
        Ok(tag)
    }

    fn check_refs(&self, post: &Article) -> CoreResult<()> {
        if post.cate_id != 0 && !self.categories.contains(post.cate_id) {
            return Err(CoreError::InvalidInput(format!(
                "category {} does not exist",
                post.cate_id
            )));
        }
        if let Some(tag) = post.tags.iter().find(|t| !self.tags.contains(**t)) {
            return Err(CoreError::InvalidInput(format!("tag {tag} does not exist")));
        }
        Ok(())
    }
}
