//! Per-row action menu options.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::model::RowId;

type RowAction = Arc<dyn Fn(&RowId) + Send + Sync>;

/// One entry of a row's action menu.
#[derive(Clone)]
pub struct ActionOption {
    /// Unique within one menu.
    pub value: String,
    pub label: String,
    pub icon: Option<String>,
    action: RowAction,
}

impl ActionOption {
    pub fn new(
        value: impl Into<String>,
        label: impl Into<String>,
        action: impl Fn(&RowId) + Send + Sync + 'static,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            icon: None,
            action: Arc::new(action),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub(crate) fn invoke(&self, id: &RowId) {
        (self.action)(id)
    }
}

impl fmt::Debug for ActionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionOption")
            .field("value", &self.value)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// The options of a table's row menu, with unique values.
#[derive(Debug, Clone, Default)]
pub struct ActionMenu {
    options: Vec<ActionOption>,
}

impl ActionMenu {
    /// Builds a menu, rejecting duplicate option values.
    pub fn new(options: Vec<ActionOption>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.value.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate action value '{}'",
                    option.value
                )));
            }
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &[ActionOption] {
        &self.options
    }

    pub fn get(&self, value: &str) -> Option<&ActionOption> {
        self.options.iter().find(|o| o.value == value)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
