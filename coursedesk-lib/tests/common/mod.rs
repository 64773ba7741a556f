//! In-process fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use coursedesk_lib::AdminClient;
use coursedesk_lib::ClientConfig;
use coursedesk_lib::HttpRequest;
use coursedesk_lib::HttpTransport;
use coursedesk_lib::RawResponse;
use coursedesk_lib::api::ListQuery;
use coursedesk_lib::api::NotificationApi;
use coursedesk_lib::api::Page;
use coursedesk_lib::auth::AuthSession;
use coursedesk_lib::auth::MemoryNavigator;
use coursedesk_lib::auth::MemoryTokenStore;
use coursedesk_lib::error::ApiError;
use coursedesk_lib::error::Error;
use coursedesk_lib::feed::Confirm;
use coursedesk_lib::feed::SocketChannel;
use coursedesk_lib::feed::SocketConnector;
use coursedesk_lib::feed::SocketEvent;
use coursedesk_lib::model::Notification;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const BASE_URL: &str = "http://backend.test";
pub const REFRESH_PATH: &str = "/api/auth/refresh-token";

// =============================================================================
// Fake backend
// =============================================================================

/// Scripted backend: accepts one bearer token, issues a new one on refresh.
pub struct FakeBackend {
    accepted: Mutex<String>,
    issue: Mutex<String>,
    refresh_ok: AtomicBool,
    revoked: AtomicBool,
    offline: AtomicBool,
    refresh_calls: AtomicUsize,
    refresh_delay: Duration,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeBackend {
    /// A backend that accepts `accepted` and hands out `issue` on refresh.
    pub fn new(accepted: &str, issue: &str) -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(accepted.to_string()),
            issue: Mutex::new(issue.to_string()),
            refresh_ok: AtomicBool::new(true),
            revoked: AtomicBool::new(false),
            offline: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay: Duration::from_millis(100),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_refresh(&self) {
        self.refresh_ok.store(false, Ordering::SeqCst);
    }

    /// Makes the backend reject every bearer token, refreshed or not.
    pub fn reject_all_tokens(&self) {
        self.revoked.store(true, Ordering::SeqCst);
        *self.accepted.lock().unwrap() = "nothing".to_string();
    }

    /// Fails every request before it reaches the server.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }

    async fn refresh(&self) -> RawResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;

        if !self.refresh_ok.load(Ordering::SeqCst) {
            return RawResponse::json(401, &json!({ "message": "Refresh token expired" }));
        }
        let token = self.issue.lock().unwrap().clone();
        if !self.revoked.load(Ordering::SeqCst) {
            *self.accepted.lock().unwrap() = token.clone();
        }
        RawResponse::json(200, &json!({ "accessToken": token }))
    }

    fn login(&self, request: &HttpRequest) -> RawResponse {
        let body = request.body.clone().unwrap_or_default();
        if body["password"] != "secret" {
            return RawResponse::json(401, &json!({ "message": "Invalid email or password" }));
        }
        let token = "login-token".to_string();
        *self.accepted.lock().unwrap() = token.clone();
        RawResponse::json(
            200,
            &json!({
                "accessToken": token,
                "user": { "_id": "u1", "email": body["email"], "name": "Ada", "role": { "name": "admin" } }
            }),
        )
    }

    fn authorized(&self, request: &HttpRequest) -> RawResponse {
        match (request.method.as_str(), request.url.path()) {
            ("GET", "/api/users") => RawResponse::json(
                200,
                &json!({
                    "status": "success",
                    "data": [
                        { "_id": "u1", "email": "ada@example.com", "isActive": true },
                        { "_id": "u2", "email": "bob@example.com", "isActive": false }
                    ],
                    "pagination": { "total": 42, "page": 1 }
                }),
            ),
            ("POST", "/api/auth/logout") => RawResponse::new(204, Vec::new()),
            ("PATCH", "/api/courses/c1") => {
                RawResponse::json(422, &json!({ "message": "Title is required" }))
            }
            (_, path) => RawResponse::json(200, &json!({ "path": path })),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }

        match request.url.path() {
            REFRESH_PATH => return Ok(self.refresh().await),
            "/api/auth/login" => return Ok(self.login(&request)),
            _ => {}
        }

        let accepted = self.accepted.lock().unwrap().clone();
        if request.bearer.as_deref() != Some(accepted.as_str()) {
            return Ok(RawResponse::json(401, &json!({ "message": "jwt expired" })));
        }
        Ok(self.authorized(&request))
    }
}

/// Shares one backend between the client and the test body.
pub struct SharedBackend(pub Arc<FakeBackend>);

#[async_trait]
impl HttpTransport for SharedBackend {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
        self.0.send(request).await
    }
}

/// A client over `backend` whose restored session holds `token`, located at
/// `path`.
pub async fn client_at(
    backend: &Arc<FakeBackend>,
    token: Option<&str>,
    path: &str,
) -> (AdminClient, Arc<MemoryNavigator>) {
    let store = match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    };
    let navigator = Arc::new(MemoryNavigator::new(path));
    let client = AdminClient::builder()
        .config(ClientConfig::new(BASE_URL).unwrap())
        .transport(SharedBackend(Arc::clone(backend)))
        .session(Arc::new(AuthSession::new(store)))
        .navigator(navigator.clone())
        .build()
        .unwrap();
    client.restore_session().await.unwrap();
    (client, navigator)
}

// =============================================================================
// Fake notification API
// =============================================================================

/// In-memory notification endpoints.
#[derive(Default)]
pub struct FakeNotificationApi {
    pub server: Mutex<Vec<Notification>>,
    pub fail_mutations: AtomicBool,
    pub mutation_delay: Mutex<Duration>,
    pub fetches: AtomicUsize,
    pub marked: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeNotificationApi {
    pub fn with(items: Vec<Notification>) -> Arc<Self> {
        Arc::new(Self {
            server: Mutex::new(items),
            ..Self::default()
        })
    }

    async fn mutate(&self) -> Result<(), Error> {
        let delay = *self.mutation_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }

    fn unavailable() -> Error {
        ApiError::Http {
            status: 503,
            message: "Service unavailable".to_string(),
            body: None,
        }
        .into()
    }
}

#[async_trait]
impl NotificationApi for FakeNotificationApi {
    async fn fetch_notifications(&self, query: &ListQuery) -> Result<Page<Notification>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let server = self.server.lock().unwrap();
        let records = server
            .iter()
            .skip(query.page * query.limit)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(Page::new(records, server.len()))
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), Error> {
        self.mutate().await?;
        self.marked.lock().unwrap().push(id.to_string());
        for n in self.server.lock().unwrap().iter_mut().filter(|n| n.id == id) {
            n.status = coursedesk_lib::model::NotificationStatus::Read;
        }
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> Result<(), Error> {
        self.mutate().await?;
        self.deleted.lock().unwrap().push(id.to_string());
        self.server.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }
}

// =============================================================================
// Fake socket
// =============================================================================

/// Connector handing out in-memory channels. The test keeps the server side.
pub struct FakeSocket {
    ends: Mutex<Option<(mpsc::Receiver<SocketEvent>, mpsc::Sender<SocketEvent>)>>,
    pub opened: AtomicUsize,
}

/// Server side of a [`FakeSocket`].
pub struct SocketServer {
    pub push: mpsc::Sender<SocketEvent>,
    pub emitted: mpsc::Receiver<SocketEvent>,
}

impl FakeSocket {
    pub fn new() -> (Self, SocketServer) {
        let (push, inbound) = mpsc::channel(16);
        let (outbound, emitted) = mpsc::channel(16);
        let socket = Self {
            ends: Mutex::new(Some((inbound, outbound))),
            opened: AtomicUsize::new(0),
        };
        let server = SocketServer { push, emitted };
        (socket, server)
    }
}

impl SocketConnector for FakeSocket {
    fn open(&self, _shutdown: CancellationToken) -> SocketChannel {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let (inbound, outbound) = self
            .ends
            .lock()
            .unwrap()
            .take()
            .expect("fake socket opened twice");
        SocketChannel { inbound, outbound }
    }
}

// =============================================================================
// Confirmation
// =============================================================================

/// Answers every confirmation with a fixed value and counts the prompts.
pub struct FixedConfirm {
    answer: bool,
    pub asked: AtomicUsize,
}

impl FixedConfirm {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Confirm for FixedConfirm {
    async fn confirm_delete(&self, _notification: &Notification) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Lets pending tasks run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
