//! Keyword input for articles.
//!
//! Permissive by design of the form: rejected input is dropped silently.
//! Tag uniqueness is still the backend's job (unique tag slugs).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsInput {
    tags: Vec<String>,
    max_tags: usize,
}

impl TagsInput {
    pub fn new(max_tags: usize) -> Self {
        Self {
            tags: Vec::new(),
            max_tags,
        }
    }

    /// Build from stored keywords, applying the same rules as `add`.
    pub fn from_keywords<I, S>(keywords: I, max_tags: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut input = Self::new(max_tags);
        for keyword in keywords {
            input.add(keyword.as_ref());
        }
        input
    }

    /// Returns true when the tag was added.
    pub fn add(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.tags.len() >= self.max_tags {
            return false;
        }
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.tags.len() {
            return None;
        }
        Some(self.tags.remove(index))
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn max_tags(&self) -> usize {
        self.max_tags
    }

    pub fn is_full(&self) -> bool {
        self.tags.len() >= self.max_tags
    }

    pub fn into_keywords(self) -> Vec<String> {
        self.tags
    }
}
