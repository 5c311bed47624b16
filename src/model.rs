use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static NON_SLUG_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub featured_image_id: Option<Uuid>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl Article {
    /// New draft with a slug derived from the title.
    pub fn new_draft(author_id: Uuid, title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slugify(title),
            description: None,
            status: ArticleStatus::Draft,
            featured_image_id: None,
            author_id,
            created_at: now,
            updated_at: now,
            published_at: None,
            keywords: None,
        }
    }

    /// Apply a status change. `published_at` is stamped only on the
    /// transition into `Published` and is never cleared afterwards.
    pub fn set_status(&mut self, status: ArticleStatus, now: DateTime<Utc>) {
        if status == ArticleStatus::Published
            && self.status != ArticleStatus::Published
            && self.published_at.is_none()
        {
            self.published_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    pub user_id: Uuid,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Join rows for the article <-> tag and article <-> category relations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleTag {
    pub article_id: Uuid,
    pub tag_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleCategory {
    pub article_id: Uuid,
    pub category_id: Uuid,
}

/// Derive a URL-safe slug: lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}
