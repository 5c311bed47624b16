//! Article list filtering, sorting and paging.
use crate::model::{Article, ArticleStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSort {
    #[default]
    Updated,
    Title,
    Published,
}

impl ArticleSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Title => "title",
            Self::Published => "published",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ArticleSort,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl ArticleQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, article: &Article) -> bool {
        if let Some(status) = self.status {
            if article.status != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                article.title.to_lowercase().contains(&term) || article.slug.contains(&term)
            }
            None => true,
        }
    }

    fn compare(&self, a: &Article, b: &Article) -> Ordering {
        let ord = match self.sort {
            ArticleSort::Updated => a.updated_at.cmp(&b.updated_at),
            ArticleSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            // Never-published articles sort before published ones ascending.
            ArticleSort::Published => a.published_at.cmp(&b.published_at),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }

    /// Filter, sort and page an in-memory list.
    pub fn apply(&self, articles: &[Article]) -> Vec<Article> {
        let mut out: Vec<Article> = articles
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect();
        out.sort_by(|a, b| self.compare(a, b));
        out.into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }

    /// Query-string form used by the HTTP backend.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(term) = self.search_term() {
            pairs.push(("search", term));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs.push(("direction", self.direction.as_str().to_string()));
        pairs.push(("limit", self.limit().to_string()));
        pairs.push(("offset", self.offset().to_string()));
        pairs
    }
}
