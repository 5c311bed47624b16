use super::{invalid, require_non_empty, BlockError, BlockType, ButtonStyle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecentPostsBlock {
    #[serde(default = "default_post_count")]
    pub count: u8,
    #[serde(default)]
    pub show_excerpt: bool,
}

fn default_post_count() -> u8 {
    3
}

impl Default for RecentPostsBlock {
    fn default() -> Self {
        Self {
            count: default_post_count(),
            show_excerpt: false,
        }
    }
}

impl RecentPostsBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if !(1..=20).contains(&self.count) {
            return Err(invalid(BlockType::RecentPosts, "count must be 1-20"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SearchBlock {
    #[serde(default)]
    pub placeholder: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    #[default]
    Text,
    Email,
    Textarea,
    Checkbox,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub kind: FormFieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormBlock {
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub submit_label: String,
}

impl FormBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        let mut names = HashSet::new();
        for field in &self.fields {
            require_non_empty(BlockType::Form, "field name", &field.name)?;
            if !names.insert(field.name.as_str()) {
                return Err(invalid(
                    BlockType::Form,
                    format!("duplicate field name '{}'", field.name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_url: Option<String>,
    #[serde(default)]
    pub button_style: ButtonStyle,
    #[serde(default)]
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PricingBlock {
    #[serde(default)]
    pub plans: Vec<PricingPlan>,
}

impl PricingBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        for plan in &self.plans {
            require_non_empty(BlockType::Pricing, "plan name", &plan.name)?;
            if plan.button_text.is_some() != plan.button_url.is_some() {
                return Err(invalid(
                    BlockType::Pricing,
                    format!("plan '{}' needs both button text and url", plan.name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CountdownBlock {
    #[serde(default)]
    pub target: DateTime<Utc>,
    #[serde(default)]
    pub label: String,
}

impl CountdownBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.target.timestamp() == 0 {
            return Err(invalid(BlockType::Countdown, "target must be set"));
        }
        Ok(())
    }

    /// Whole seconds left until the target, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.target - now).num_seconds().max(0)
    }
}
