//! Cross-context request/response messages.

use crate::category::Category;
use crate::record::{ItemKind, PriorityMap, PriorityRecord};
use serde::{Deserialize, Serialize};

/// Requests exchanged between the background and page contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Categorize the selected or open mail item from a context menu preset.
    CategorizeFromContextMenu { importance: i32, urgency: i32 },
    /// Categorize the current web page.
    CategorizeWebPage { importance: i32, urgency: i32 },
    /// Categorize the selected mail item from the popup picker.
    SavePriority { importance: i32, urgency: i32 },
    /// Read the mail namespace.
    GetPriorities {},
    /// Read both namespaces for export.
    ExportData {},
    /// Locate a stored mail item in the page and open it.
    OpenEmail {
        email_id: String,
        email_subject: Option<String>,
        /// Stored timestamp in epoch milliseconds.
        email_timestamp: Option<i64>,
    },
    /// Drop highlight and badge of a mail item.
    RemoveHighlight { email_id: String },
    /// Forget the current page's priority and drop its badge.
    RemoveWebPagePriority {},
    /// Set or clear a custom display label.
    RenameLabel {
        kind: ItemKind,
        id: String,
        label: Option<String>,
    },
    /// Delete a stored priority.
    DeletePriority { kind: ItemKind, id: String },
}

impl Request {
    /// The wire `action` name, used in logs.
    pub fn action(&self) -> &'static str {
        match self {
            Request::CategorizeFromContextMenu { .. } => "categorizeFromContextMenu",
            Request::CategorizeWebPage { .. } => "categorizeWebPage",
            Request::SavePriority { .. } => "savePriority",
            Request::GetPriorities {} => "getPriorities",
            Request::ExportData {} => "exportData",
            Request::OpenEmail { .. } => "openEmail",
            Request::RemoveHighlight { .. } => "removeHighlight",
            Request::RemoveWebPagePriority {} => "removeWebPagePriority",
            Request::RenameLabel { .. } => "renameLabel",
            Request::DeletePriority { .. } => "deletePriority",
        }
    }
}

/// Single reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    Categorized {
        record: PriorityRecord,
        category: Category,
        notice: Notice,
    },
    NotFound {
        reason: String,
        notice: Notice,
    },
    Priorities {
        priorities: PriorityMap,
    },
    Export {
        emails: PriorityMap,
        web_links: PriorityMap,
    },
    Opened {
        id: String,
    },
    Removed {
        id: Option<String>,
        notice: Option<Notice>,
    },
    Renamed {
        id: String,
        applied: bool,
    },
    Failed {
        error: String,
        notice: Option<Notice>,
    },
}

impl Response {
    /// Whether the request took effect.
    pub fn is_success(&self) -> bool {
        !matches!(self, Response::NotFound { .. } | Response::Failed { .. })
    }

    /// User-facing notice attached to the reply, if any.
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Response::Categorized { notice, .. } | Response::NotFound { notice, .. } => {
                Some(notice)
            }
            Response::Removed { notice, .. } | Response::Failed { notice, .. } => notice.as_ref(),
            _ => None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Response::Failed {
            notice: Some(Notice::error(format!("❌ {error}"))),
            error,
        }
    }
}

/// Severity of a transient in-page notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, Request, Response};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn requests_use_action_tag() {
        let request: Request = serde_json::from_value(json!({
            "action": "categorizeFromContextMenu",
            "importance": 4,
            "urgency": 2
        }))
        .expect("request");
        assert_eq!(
            request,
            Request::CategorizeFromContextMenu {
                importance: 4,
                urgency: 2
            }
        );

        let open: Request = serde_json::from_value(json!({
            "action": "openEmail",
            "emailId": "AAQk=",
            "emailSubject": "Weekly sync"
        }))
        .expect("open");
        assert_eq!(open.action(), "openEmail");
        assert_eq!(
            serde_json::to_value(Request::GetPriorities {}).expect("json"),
            json!({ "action": "getPriorities" })
        );
    }

    #[test]
    fn failed_response_carries_error_notice() {
        let response = Response::failed("storage unavailable");
        assert!(!response.is_success());
        assert_eq!(
            response.notice(),
            Some(&Notice::error("❌ storage unavailable"))
        );
    }
}
