//! Hero payload.
use super::render::{css_url, html_attr, html_escape};
use super::{invalid, require_non_empty, BlockError, BlockType, ButtonStyle};
use serde::{Deserialize, Serialize};

/// Overlay used when the payload leaves it unset or zero.
pub const DEFAULT_OVERLAY_OPACITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeroAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl HeroAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroAlignment::Left => "left",
            HeroAlignment::Center => "center",
            HeroAlignment::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeroHeight {
    Small,
    #[default]
    Medium,
    Large,
}

impl HeroHeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroHeight::Small => "small",
            HeroHeight::Medium => "medium",
            HeroHeight::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HeroButton {
    pub text: String,
    pub url: String,
    #[serde(default)]
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub alignment: HeroAlignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_opacity: Option<f64>,
    #[serde(default)]
    pub height: HeroHeight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<HeroButton>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl HeroBlock {
    pub fn validate(&self) -> Result<(), BlockError> {
        if let Some(opacity) = self.overlay_opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(invalid(BlockType::Hero, "overlayOpacity must be within 0-1"));
            }
        }
        if let Some(button) = &self.button {
            require_non_empty(BlockType::Hero, "button.text", &button.text)?;
            require_non_empty(BlockType::Hero, "button.url", &button.url)?;
        }
        Ok(())
    }

    /// Unset and zero both fall back to the default overlay.
    pub fn effective_overlay_opacity(&self) -> f64 {
        match self.overlay_opacity {
            Some(v) if v != 0.0 && !v.is_nan() => v,
            _ => DEFAULT_OVERLAY_OPACITY,
        }
    }

    pub fn has_visible_content(&self) -> bool {
        present(&self.background_url).is_some() || present(&self.title).is_some()
    }

    /// Preview markup, or `None` when there is neither a background nor a title.
    pub fn render_preview(&self) -> Option<String> {
        if !self.has_visible_content() {
            return None;
        }
        let mut inner = String::new();
        if let Some(title) = present(&self.title) {
            inner.push_str(&format!("<h1>{}</h1>", html_escape(title)));
        }
        if let Some(subtitle) = present(&self.subtitle) {
            inner.push_str(&format!("<p>{}</p>", html_escape(subtitle)));
        }
        if let Some(button) = &self.button {
            inner.push_str(&format!(
                "<a class=\"button button-{}\" href=\"{}\">{}</a>",
                button.style.as_str(),
                html_attr(&button.url),
                html_escape(&button.text)
            ));
        }
        let background = match present(&self.background_url) {
            Some(url) => format!(" style=\"background-image: url('{}')\"", css_url(url)),
            None => String::new(),
        };
        Some(format!(
            "<section class=\"hero hero-{} hero-align-{}\"{}><div class=\"hero-overlay\" style=\"opacity: {}\"></div><div class=\"hero-content\">{}</div></section>",
            self.height.as_str(),
            self.alignment.as_str(),
            background,
            self.effective_overlay_opacity(),
            inner
        ))
    }
}
