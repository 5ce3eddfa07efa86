//! UI/backend events and error modeling for the desktop GUI controller.

use client_core::{BulkDeleteReport, BulkOpenReport};
use shared::domain::{GroupId, ItemId, TabGroup};

pub enum UiEvent {
    Info(String),
    GroupsLoaded(Vec<TabGroup>),
    GroupDeleted {
        group_id: GroupId,
    },
    ItemDeleted {
        group_id: GroupId,
        item_id: ItemId,
    },
    GroupRenamed {
        group_id: GroupId,
        title: String,
    },
    ItemRenamed {
        group_id: GroupId,
        item_id: ItemId,
        title: String,
    },
    ItemPinnedChanged {
        group_id: GroupId,
        item_id: ItemId,
        is_pinned: bool,
    },
    ItemTodoChanged {
        group_id: GroupId,
        item_id: ItemId,
        is_todo: bool,
    },
    GroupLockChanged {
        group_id: GroupId,
        is_locked: bool,
    },
    GroupPinnedToTop {
        group_id: GroupId,
    },
    GroupMoved {
        group_id: GroupId,
        target_id: GroupId,
    },
    FolderCreated(TabGroup),
    DuplicatesRemoved {
        group_id: GroupId,
        removed: Vec<ItemId>,
        report: BulkDeleteReport,
    },
    BulkOpenStarted {
        total: usize,
    },
    BulkOpenProgress {
        index: usize,
        url: String,
        opened: bool,
    },
    BulkOpenFinished(BulkOpenReport),
    ShareCreated {
        group_id: GroupId,
        share_url: String,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadGroups,
    Mutation,
    General,
}

pub fn classify_service_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure")
        || lower.contains("failed to build backend runtime")
    {
        "Backend worker startup failure; verify the local app environment and retry.".to_string()
    } else if lower.contains("failed to reach")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Tab-group service unreachable; check the URL/network and reload.".to_string()
    } else {
        format!("Tab-group service error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("invalid token")
            || message_lower.contains("invalid credential")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("no longer loaded")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("failed to reach")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_service_failure, UiError, UiErrorCategory, UiErrorContext};

    #[test]
    fn classifies_unreachable_service_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::LoadGroups,
            "failed to reach the tab-group service: connection refused",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(!err.requires_reauth());
    }

    #[test]
    fn classifies_unauthorized_as_auth_error() {
        let err = UiError::from_message(UiErrorContext::Mutation, "Unauthorized: invalid token");
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert!(err.requires_reauth());
    }

    #[test]
    fn classifies_stale_group_as_validation_error() {
        let err = UiError::from_message(
            UiErrorContext::Mutation,
            "tab group is no longer loaded; reload and retry",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn service_failures_get_a_user_facing_summary() {
        let summary = classify_service_failure("failed to reach the tab-group service");
        assert!(summary.contains("unreachable"));

        let other = classify_service_failure("boom");
        assert!(other.contains("boom"));
    }
}
