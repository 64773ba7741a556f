//! Client configuration

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "COURSEDESK_API_URL";
/// Environment variable overriding the admin route prefix.
pub const ENV_ADMIN_PREFIX: &str = "COURSEDESK_ADMIN_PREFIX";
/// Environment variable overriding the socket reconnect delay, in milliseconds.
pub const ENV_RECONNECT_DELAY_MS: &str = "COURSEDESK_RECONNECT_DELAY_MS";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "COURSEDESK_TIMEOUT_SECS";

/// Configuration shared by the HTTP client and the notification feed.
///
/// One base URL serves both REST calls and the socket connection.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use coursedesk_lib::ClientConfig;
///
/// let config = ClientConfig::new("https://api.example.com")
///     .unwrap()
///     .with_reconnect_delay(Duration::from_secs(5))
///     .with_feed_page_size(50);
///
/// assert_eq!(config.feed_page_size, 50);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: Url,
    /// Route prefix of admin-only screens. A failed refresh redirects to the
    /// login path only while the current location is under this prefix.
    ///
    /// Default: `/admin`
    pub admin_prefix: String,
    /// Route of the login screen.
    ///
    /// Default: `/login`
    pub login_path: String,
    /// Path of the cookie-based refresh endpoint.
    ///
    /// Default: `/api/auth/refresh-token`
    pub refresh_path: String,
    /// Path of the socket endpoint, relative to the base URL.
    ///
    /// Default: `/socket`
    pub socket_path: String,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Fixed delay between socket reconnection attempts.
    ///
    /// Default: 1 second
    pub reconnect_delay: Duration,
    /// Page size of the feed's initial notification fetch.
    ///
    /// Default: 20
    pub feed_page_size: usize,
    /// Quiet period before a search edit triggers a fetch.
    ///
    /// Default: 500 ms
    pub search_debounce: Duration,
}

impl ClientConfig {
    /// Creates a config for the given base URL with default settings.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            base_url,
            admin_prefix: "/admin".to_string(),
            login_path: "/login".to_string(),
            refresh_path: "/api/auth/refresh-token".to_string(),
            socket_path: "/socket".to_string(),
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            reconnect_delay: Duration::from_secs(1),
            feed_page_size: 20,
            search_debounce: Duration::from_millis(500),
        })
    }

    /// Builds a config from `COURSEDESK_*` environment variables.
    ///
    /// `COURSEDESK_API_URL` is required; the other variables override
    /// defaults when set.
    pub fn from_env() -> Result<Self, Error> {
        let url = env::var(ENV_API_URL)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_API_URL)))?;
        let mut config = Self::new(&url)?;

        if let Ok(prefix) = env::var(ENV_ADMIN_PREFIX) {
            config.admin_prefix = prefix;
        }
        if let Some(ms) = parse_env_u64(ENV_RECONNECT_DELAY_MS)? {
            config.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_env_u64(ENV_TIMEOUT_SECS)? {
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the admin route prefix.
    pub fn with_admin_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.admin_prefix = prefix.into();
        self
    }

    /// Sets the login route.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Sets the refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Sets the socket endpoint path.
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the socket reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the feed's initial page size.
    pub fn with_feed_page_size(mut self, size: usize) -> Self {
        self.feed_page_size = size.max(1);
        self
    }

    /// Returns `true` if `path` is under the admin prefix.
    pub fn is_admin_path(&self, path: &str) -> bool {
        let prefix = self.admin_prefix.trim_end_matches('/');
        path == prefix || path.starts_with(&format!("{}/", prefix))
    }

    /// Resolves an API path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    /// Returns the WebSocket URL derived from the base URL.
    ///
    /// `http` maps to `ws` and `https` to `wss`.
    pub fn socket_url(&self) -> Result<Url, Error> {
        let mut url = self.endpoint(&self.socket_path)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => return Err(Error::Config(format!("unsupported URL scheme '{}'", other))),
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot use scheme '{}'", scheme)))?;
        Ok(url)
    }
}

fn parse_env_u64(name: &str) -> Result<Option<u64>, Error> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be an integer, got '{}'", name, value))),
        Err(_) => Ok(None),
    }
}
