//! Main AdminClient

use std::sync::Arc;

use log::debug;
use log::info;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::Envelope;
use crate::api::ListQuery;
use crate::api::Page;
use crate::api::Resource;
use crate::api::decode_body;
use crate::auth::AuthSession;
use crate::auth::LoginRequest;
use crate::auth::LoginResponse;
use crate::auth::MemoryNavigator;
use crate::auth::MemoryTokenStore;
use crate::auth::Navigator;
use crate::auth::RefreshResponse;
use crate::auth::RefreshTicket;
use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::error::Error;
use crate::model::UserProfile;
use crate::transport::HttpRequest;
use crate::transport::HttpTransport;
use crate::transport::RawResponse;
use crate::transport::ReqwestTransport;

const LOGIN_PATH: &str = "/api/auth/login";
const LOGOUT_PATH: &str = "/api/auth/logout";

/// Client for the admin REST API.
///
/// Every request carries the session's bearer token. A `401` triggers one
/// token refresh shared by all concurrent requests; each request is replayed
/// at most once with the new token. Response bodies are returned
/// deserialized, without the HTTP wrapper.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks.
///
/// # Example
///
/// ```ignore
/// use coursedesk_lib::{AdminClient, ClientConfig};
///
/// let client = AdminClient::builder()
///     .config(ClientConfig::new("https://api.example.com")?)
///     .build()?;
///
/// client.login("admin@example.com", "secret").await?;
/// let roles: serde_json::Value = client.get("/api/roles/permissions").await?;
/// ```
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    session: Arc<AuthSession>,
    navigator: Arc<dyn Navigator>,
}

impl AdminClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> AdminClientBuilder<Missing> {
        AdminClientBuilder::new()
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the session shared by all clones of this client.
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.inner.session
    }

    /// Returns the logged-in user, if known.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.session.user()
    }

    /// Loads a persisted token into the session.
    ///
    /// Returns `true` if a token was found.
    pub async fn restore_session(&self) -> Result<bool, Error> {
        let token = self.inner.session.restore().await?;
        Ok(token.is_some())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Logs in and stores the returned token and user.
    ///
    /// Login failures never enter the refresh flow.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, Error> {
        let url = self.inner.config.endpoint(LOGIN_PATH)?;
        let body = serde_json::to_value(LoginRequest::new(email, password))
            .map_err(|e| ApiError::parse(e.to_string()))?;

        let response = self
            .inner
            .transport
            .send(HttpRequest::new(Method::POST, url).json(Some(body)))
            .await?;

        if matches!(response.status, 400 | 401 | 403) {
            let message = match ApiError::from_response(response.status, &response.body) {
                ApiError::Http { message, .. } => message,
                other => other.to_string(),
            };
            return Err(AuthError::InvalidCredentials { message }.into());
        }

        let login: LoginResponse = decode_body(&Self::into_result(response)?.body)?;
        self.inner
            .session
            .establish(login.access_token, login.user.clone())
            .await?;
        info!("Logged in as {}", login.user.email);
        Ok(login.user)
    }

    /// Logs out on the server and clears the local session.
    ///
    /// The local session is cleared even if the server call fails; the
    /// server error is still returned.
    pub async fn logout(&self) -> Result<(), Error> {
        let result = self
            .post::<serde_json::Value>(LOGOUT_PATH, &serde_json::json!({}))
            .await;
        self.inner.session.clear().await?;
        info!("Logged out");
        result.map(|_| ())
    }

    // =========================================================================
    // Request methods
    // =========================================================================

    /// `GET` a path and deserialize the body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.inner.config.endpoint(path)?;
        self.execute(Method::GET, url, None).await
    }

    /// `POST` a JSON body.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.inner.config.endpoint(path)?;
        self.execute(Method::POST, url, Some(to_json(body)?)).await
    }

    /// `PUT` a JSON body.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.inner.config.endpoint(path)?;
        self.execute(Method::PUT, url, Some(to_json(body)?)).await
    }

    /// `PATCH` a JSON body.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.inner.config.endpoint(path)?;
        self.execute(Method::PATCH, url, Some(to_json(body)?)).await
    }

    /// `DELETE` a path.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.inner.config.endpoint(path)?;
        self.execute(Method::DELETE, url, None).await
    }

    /// Fetches one page of a list resource.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<T>, Error> {
        let mut url = self.inner.config.endpoint(resource.path())?;
        query.apply(&mut url);

        let envelope: Envelope<Vec<T>> = self.execute(Method::GET, url, None).await?;
        Ok(envelope.into_page(resource.total_field()))
    }

    // =========================================================================
    // Dispatch and refresh
    // =========================================================================

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, Error> {
        let response = self.dispatch(method, url, body).await?;
        Ok(decode_body(&response.body)?)
    }

    /// Sends a request, refreshing the token and replaying once on a 401.
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, Error> {
        let is_refresh = self.is_refresh_endpoint(&url);
        let sent_with = if is_refresh {
            None
        } else {
            self.inner.session.token()
        };

        let request = HttpRequest::new(method, url)
            .bearer(sent_with.clone())
            .json(body);
        debug!("{} {}", request.method, request.url);

        let response = self.inner.transport.send(request.clone()).await?;
        if response.status != 401 {
            return Self::into_result(response);
        }

        if is_refresh {
            self.expire_session().await;
            return Err(AuthError::SessionExpired.into());
        }

        let token = self.refreshed_token(sent_with.as_deref()).await?;
        debug!("Replaying {} {} with refreshed token", request.method, request.url);

        // Replayed once; a second 401 goes back to the caller.
        let response = self.inner.transport.send(request.bearer(Some(token))).await?;
        Self::into_result(response)
    }

    /// Obtains a token newer than `sent_with`, joining an in-flight refresh
    /// if there is one.
    async fn refreshed_token(&self, sent_with: Option<&str>) -> Result<String, AuthError> {
        match self.inner.session.begin_refresh(sent_with) {
            RefreshTicket::Current(token) => Ok(token),
            RefreshTicket::Waiter(outcome) => outcome
                .await
                .unwrap_or_else(|_| Err(AuthError::RefreshAborted)),
            RefreshTicket::Leader(lease) => match self.request_new_token().await {
                Ok(token) => {
                    lease.succeed(token.clone()).await;
                    Ok(token)
                }
                Err(err) => {
                    lease.fail(err.clone()).await;
                    self.redirect_to_login();
                    Err(err)
                }
            },
        }
    }

    /// Calls the refresh endpoint. It carries no bearer header and relies on
    /// the refresh cookie.
    async fn request_new_token(&self) -> Result<String, AuthError> {
        let url = self
            .inner
            .config
            .endpoint(&self.inner.config.refresh_path)
            .map_err(|e| AuthError::RefreshFailed {
                message: e.to_string(),
            })?;

        let response = self
            .inner
            .transport
            .send(HttpRequest::new(Method::POST, url))
            .await
            .map_err(|e| AuthError::RefreshFailed {
                message: e.to_string(),
            })?;

        match response.status {
            401 => Err(AuthError::SessionExpired),
            status if !response.is_success() => Err(AuthError::RefreshFailed {
                message: ApiError::from_response(status, &response.body).to_string(),
            }),
            _ => {
                let refreshed: RefreshResponse = decode_body(&response.body)
                    .map_err(|e| AuthError::Parse(e.to_string()))?;
                Ok(refreshed.access_token)
            }
        }
    }

    async fn expire_session(&self) {
        if let Err(e) = self.inner.session.clear().await {
            log::warn!("Failed to clear session: {}", e);
        }
        self.redirect_to_login();
    }

    /// Navigates to the login screen if the user is on an admin route.
    fn redirect_to_login(&self) {
        let current = self.inner.navigator.current_path();
        if self.inner.config.is_admin_path(&current) {
            info!("Session lost on {}, redirecting to login", current);
            self.inner.navigator.navigate(&self.inner.config.login_path);
        }
    }

    fn is_refresh_endpoint(&self, url: &Url) -> bool {
        url.path().trim_end_matches('/') == self.inner.config.refresh_path.trim_end_matches('/')
    }

    fn into_result(response: RawResponse) -> Result<RawResponse, Error> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response.status, &response.body).into())
        }
    }
}

fn to_json(body: &impl Serialize) -> Result<serde_json::Value, Error> {
    serde_json::to_value(body).map_err(|e| ApiError::parse(e.to_string()).into())
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`AdminClient`].
///
/// The configuration is required at compile time; transport, session and
/// navigator have defaults (`reqwest`, an in-memory token store, and a
/// navigator positioned at `/`).
///
/// # Example
///
/// ```ignore
/// let client = AdminClient::builder()
///     .config(config)
///     .token_store(SqliteTokenStore::open("session.db").await?)
///     .navigator(router_handle)
///     .build()?;
/// ```
pub struct AdminClientBuilder<C> {
    config: C,
    transport: Option<Arc<dyn HttpTransport>>,
    session: Option<Arc<AuthSession>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl AdminClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: Missing,
            transport: None,
            session: None,
            navigator: None,
        }
    }

    /// Sets the client configuration.
    pub fn config(self, config: ClientConfig) -> AdminClientBuilder<Set<ClientConfig>> {
        AdminClientBuilder {
            config: Set(config),
            transport: self.transport,
            session: self.session,
            navigator: self.navigator,
        }
    }
}

impl Default for AdminClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AdminClientBuilder<C> {
    /// Sets a custom transport.
    pub fn transport<T: HttpTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Uses a new session over `store`.
    pub fn token_store<S: TokenStore + 'static>(mut self, store: S) -> Self {
        self.session = Some(Arc::new(AuthSession::new(store)));
        self
    }

    /// Uses an existing session.
    pub fn session(mut self, session: Arc<AuthSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the navigator consulted on session loss.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }
}

impl AdminClientBuilder<Set<ClientConfig>> {
    /// Builds the [`AdminClient`].
    ///
    /// Only available once the configuration has been set.
    pub fn build(self) -> Result<AdminClient, Error> {
        let config = self.config.0;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.timeout, config.connect_timeout)?),
        };
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(AuthSession::new(MemoryTokenStore::new())));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));

        Ok(AdminClient {
            inner: Arc::new(AdminClientInner {
                config,
                transport,
                session,
                navigator,
            }),
        })
    }
}
