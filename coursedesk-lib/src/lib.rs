//! Headless core of the course platform admin console.
//!
//! Three parts, each usable on its own:
//!
//! - [`table`]: a generic paginated table engine with column visibility,
//!   selection that survives pagination, and per-row action menus.
//! - [`AdminClient`]: an authenticated REST client that refreshes the access
//!   token once for any number of concurrent `401`s and replays the
//!   affected requests.
//! - [`feed`]: a live notification list fed by an initial fetch and a
//!   reconnecting socket.
//!
//! # Example
//!
//! ```ignore
//! use coursedesk_lib::{AdminClient, ClientConfig};
//! use coursedesk_lib::api::{ListQuery, Resource};
//! use coursedesk_lib::model::UserProfile;
//!
//! let client = AdminClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .build()?;
//!
//! client.login("admin@example.com", "secret").await?;
//!
//! let query = ListQuery::new(0, 20).search("ada").search_fields(&["name", "email"]);
//! let page = client.list::<UserProfile>(Resource::Users, &query).await?;
//! println!("{} of {} users", page.len(), page.total());
//! ```

pub mod api;
pub mod auth;
pub mod error;
pub mod feed;
pub mod model;
pub mod table;

mod client;
mod config;
mod transport;

pub use client::AdminClient;
pub use client::AdminClientBuilder;
pub use client::Missing;
pub use client::Set;
pub use config::ClientConfig;
pub use config::ENV_ADMIN_PREFIX;
pub use config::ENV_API_URL;
pub use config::ENV_RECONNECT_DELAY_MS;
pub use config::ENV_TIMEOUT_SECS;
pub use error::Error;
pub use transport::HttpRequest;
pub use transport::HttpTransport;
pub use transport::RawResponse;
pub use transport::ReqwestTransport;
