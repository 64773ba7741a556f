//! Authentication: session state, token persistence and navigation hooks

mod login;
mod navigator;
mod session;
mod store;

pub use login::LoginRequest;
pub use login::LoginResponse;
pub use login::RefreshResponse;
pub use navigator::MemoryNavigator;
pub use navigator::Navigator;
pub use session::AuthSession;
pub use session::RefreshLease;
pub use session::RefreshTicket;
pub use store::MemoryTokenStore;
pub use store::SqliteTokenStore;
pub use store::TokenStore;
