//! Access token persistence

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AuthError;

/// Persistent storage for the access token.
///
/// Only the session writes through this trait, and only while it holds the
/// refresh lock or during login/logout.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Loads the stored token, if any.
    async fn load(&self) -> Result<Option<String>, AuthError>;

    /// Replaces the stored token.
    async fn save(&self, token: &str) -> Result<(), AuthError>;

    /// Removes the stored token.
    async fn clear(&self) -> Result<(), AuthError>;
}

/// A token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, AuthError> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> Result<(), AuthError> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        *self.token.write().await = None;
        Ok(())
    }
}

const TOKEN_KEY: &str = "access_token";

/// A token store backed by SQLite, so the session survives restarts.
///
/// # Example
///
/// ```ignore
/// use coursedesk_lib::auth::SqliteTokenStore;
///
/// let store = SqliteTokenStore::open("session.db").await?;
/// ```
pub struct SqliteTokenStore {
    client: Client,
}

impl SqliteTokenStore {
    /// Opens the store at `path`, creating the file and table if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory store.
    pub async fn open_in_memory() -> Result<Self, AuthError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), AuthError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS session (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL
                    )",
                    [],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self) -> Result<Option<String>, AuthError> {
        let token = self
            .client
            .conn(|conn| {
                let result = conn.query_row(
                    "SELECT value FROM session WHERE key = ?",
                    [TOKEN_KEY],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;
        Ok(token)
    }

    async fn save(&self, token: &str) -> Result<(), AuthError> {
        let token = token.to_string();
        let now = Utc::now().timestamp();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO session (key, value, updated_at) VALUES (?, ?, ?)",
                    rusqlite::params![TOKEN_KEY, token, now],
                )
            })
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.client
            .conn(|conn| conn.execute("DELETE FROM session WHERE key = ?", [TOKEN_KEY]))
            .await?;
        Ok(())
    }
}
