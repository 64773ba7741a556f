//! Realtime notification feed.
//!
//! The list is a pure reducer ([`FeedState`]) driven by an initial fetch,
//! socket events and local mutations.

mod live;
mod reducer;
mod socket;

pub use live::*;
pub use reducer::*;
pub use socket::*;
