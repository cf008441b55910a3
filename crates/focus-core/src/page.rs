//! Identity a page supplies when it attaches to the timer.

use serde::{Deserialize, Serialize};

use crate::session::SessionMetadata;

/// Task name used when the page does not name one.
pub const DEFAULT_TASK_NAME: &str = "Untitled";

/// Task and user identity read once at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub user_id: String,
    pub task_name: String,
}

impl PageContext {
    /// Builds a context, substituting [`DEFAULT_TASK_NAME`] for a blank task.
    pub fn new(user_id: impl Into<String>, task_name: Option<&str>) -> Self {
        let task_name = task_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TASK_NAME);
        Self {
            user_id: user_id.into(),
            task_name: task_name.to_string(),
        }
    }

    /// Metadata for a phase started from this page.
    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata::new(self.user_id.clone(), self.task_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_task_defaults() {
        assert_eq!(PageContext::new("u", None).task_name, "Untitled");
        assert_eq!(PageContext::new("u", Some("  ")).task_name, "Untitled");
        assert_eq!(PageContext::new("u", Some(" Essay ")).task_name, "Essay");
    }
}
