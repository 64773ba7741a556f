//! User records

use serde::Deserialize;
use serde::Serialize;

use super::Row;
use super::RowId;

/// A user as returned by the login endpoint and the users list.
///
/// Only the fields the core relies on are typed; everything else the backend
/// sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend id.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Role name or id.
    #[serde(default)]
    pub role: Option<serde_json::Value>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether the account is active.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Name to show for this user, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Role as a label; populated role objects contribute their `name`.
    pub fn role_label(&self) -> Option<String> {
        match self.role.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(obj) => obj
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

impl Row for UserProfile {
    fn row_id(&self) -> RowId {
        RowId::Str(self.id.clone())
    }
}
