//! User-facing notifications ("toasts").
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub description: Option<String>,
}

/// Pending toasts for one view, drained by whatever renders them.
#[derive(Debug, Default)]
pub struct Toasts {
    queue: Vec<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: ToastLevel, title: &str, description: Option<String>) {
        match level {
            ToastLevel::Error => warn!(title, description = ?description, "error toast"),
            ToastLevel::Info => info!(title, "info toast"),
            ToastLevel::Success => info!(title, "success toast"),
        }
        self.queue.push(Toast {
            level,
            title: title.to_string(),
            description,
        });
    }

    pub fn success(&mut self, title: &str) {
        self.push(ToastLevel::Success, title, None);
    }

    pub fn info(&mut self, title: &str) {
        self.push(ToastLevel::Info, title, None);
    }

    /// Error toast carrying the full error chain as its description.
    pub fn error(&mut self, title: &str, err: &anyhow::Error) {
        error!(?err, "{}", title);
        self.push(ToastLevel::Error, title, Some(format!("{:#}", err)));
    }

    pub fn error_message(&mut self, title: &str, description: impl Into<String>) {
        self.push(ToastLevel::Error, title, Some(description.into()));
    }

    pub fn pending(&self) -> &[Toast] {
        &self.queue
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn error_toast_includes_context_chain() {
        let mut toasts = Toasts::new();
        let err = Err::<(), _>(anyhow!("503"))
            .context("failed to save")
            .unwrap_err();
        toasts.error("Save failed", &err);
        let drained = toasts.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].level, ToastLevel::Error);
        assert_eq!(drained[0].description.as_deref(), Some("failed to save: 503"));
        assert!(toasts.pending().is_empty());
    }
}
