//! Accordion payload and its open/closed projection.
use super::render::{html_attr, html_escape};
use super::{invalid, BlockError, BlockType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccordionStyle {
    #[default]
    Default,
    Bordered,
    Simple,
}

impl AccordionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccordionStyle::Default => "default",
            AccordionStyle::Bordered => "bordered",
            AccordionStyle::Simple => "simple",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccordionItem {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccordionBlock {
    #[serde(default)]
    pub items: Vec<AccordionItem>,
    #[serde(default)]
    pub style: AccordionStyle,
    /// Only meaningful when `multiple` is false.
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default)]
    pub multiple: bool,
}

impl AccordionBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.id.is_empty() {
                return Err(invalid(BlockType::Accordion, "item id must be non-empty"));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(invalid(
                    BlockType::Accordion,
                    format!("duplicate item id '{}'", item.id),
                ));
            }
        }
        Ok(())
    }

    pub fn render_preview(&self, state: &AccordionState) -> String {
        let mut body = String::new();
        for item in &self.items {
            let open = if state.is_open(&item.id) { " open" } else { "" };
            body.push_str(&format!(
                "<details class=\"accordion-item\" data-id=\"{}\"{}><summary>{}</summary><div class=\"accordion-content\">{}</div></details>",
                html_attr(&item.id),
                open,
                html_escape(&item.title),
                html_escape(&item.content)
            ));
        }
        format!(
            "<div class=\"accordion accordion-{}\">{}</div>",
            self.style.as_str(),
            body
        )
    }
}

/// Which items are open. Derived from the payload alone; toggling never
/// touches the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccordionState {
    multiple: bool,
    collapsible: bool,
    known: BTreeSet<String>,
    open: BTreeSet<String>,
}

impl AccordionState {
    /// Multi-open accordions start fully expanded; single-open ones start
    /// with the first item open.
    pub fn initial(block: &AccordionBlock) -> Self {
        let known: BTreeSet<String> = block.items.iter().map(|i| i.id.clone()).collect();
        let open = if block.multiple {
            known.clone()
        } else {
            block.items.first().map(|i| i.id.clone()).into_iter().collect()
        };
        Self {
            multiple: block.multiple,
            collapsible: block.collapsible,
            known,
            open,
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Toggle one item. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if !self.known.contains(id) {
            return;
        }
        if self.multiple {
            if !self.open.remove(id) {
                self.open.insert(id.to_string());
            }
            return;
        }
        if self.open.contains(id) {
            if self.collapsible {
                self.open.clear();
            }
        } else {
            self.open.clear();
            self.open.insert(id.to_string());
        }
    }
}
