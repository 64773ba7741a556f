//! Current-location access for login redirects

use std::sync::Mutex;
use std::sync::PoisonError;

/// Access to the host application's current route.
///
/// The client consults it when the session is lost: a redirect to the login
/// screen happens only while the user is on an admin route.
pub trait Navigator: Send + Sync {
    /// Path of the current location, e.g. `/admin/users`.
    fn current_path(&self) -> String;

    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

/// A [`Navigator`] that keeps the location in memory and records every
/// navigation.
#[derive(Debug)]
pub struct MemoryNavigator {
    path: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Creates a navigator positioned at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Paths navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = path.to_string();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
