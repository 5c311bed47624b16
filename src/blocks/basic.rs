//! Text-like payloads.
use super::{invalid, require_non_empty, BlockError, BlockType, ButtonStyle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TextBlock {
    #[serde(default)]
    pub content: String,
}

impl TextBlock {
    /// Rich text is stored already rendered.
    pub fn render(&self) -> String {
        self.content.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingBlock {
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_heading_level")]
    pub level: u8,
}

fn default_heading_level() -> u8 {
    2
}

impl Default for HeadingBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            level: default_heading_level(),
        }
    }
}

impl HeadingBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if !(1..=6).contains(&self.level) {
            return Err(invalid(BlockType::Heading, "level must be 1-6"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ListBlock {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub ordered: bool,
}

impl ListBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.items.iter().any(|i| i.trim().is_empty()) {
            return Err(invalid(BlockType::List, "list items must be non-empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuoteBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

impl QuoteBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Quote, "text", &self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ButtonBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub style: ButtonStyle,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

impl ButtonBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Button, "text", &self.text)?;
        require_non_empty(BlockType::Button, "url", &self.url)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DividerStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DividerBlock {
    #[serde(default)]
    pub style: DividerStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CodeBlock {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CodeBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if let Some(lang) = &self.language {
            if lang.chars().any(char::is_whitespace) {
                return Err(invalid(BlockType::Code, "language must be a single token"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HtmlBlock {
    #[serde(default)]
    pub html: String,
}

impl HtmlBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        require_non_empty(BlockType::Html, "html", &self.html)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub header_row: bool,
}

impl TableBlock {
    /// Rows must be rectangular.
    pub fn validate(&self) -> Result<(), BlockError> {
        if let Some(first) = self.rows.first() {
            let width = first.len();
            if self.rows.iter().any(|r| r.len() != width) {
                return Err(invalid(BlockType::Table, "all rows must have the same number of cells"));
            }
        }
        Ok(())
    }
}
