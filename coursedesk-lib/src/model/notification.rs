//! Notification records

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Row;
use super::RowId;

/// Presentation category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Read state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

/// A notification record.
///
/// Created server-side and pushed to clients over the socket; the client
/// only ever flips `status` or removes the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Message body; may contain inline markup.
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Creates an unread info notification.
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            message: message.into(),
            kind: NotificationKind::Info,
            status: NotificationStatus::Unread,
            created_at: None,
        }
    }

    /// Sets the read state.
    pub fn with_status(mut self, status: NotificationStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if the notification has not been read.
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }

    /// Message with inline markup tags removed and entities decoded.
    pub fn plain_message(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut in_tag = false;
        for c in self.message.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
    }
}

impl Row for Notification {
    fn row_id(&self) -> RowId {
        RowId::from(self.id.as_str())
    }
}
