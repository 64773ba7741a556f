//! Generic paginated table: columns, selection, row actions and pager.
//!
//! The engine never fetches. It turns caller-owned rows and state into a
//! [`TableView`] and reports user intent through [`TableHandler`].
//! [`ListController`] is a ready-made handler for list screens.

mod actions;
mod column;
mod controller;
mod engine;
mod pagination;
mod render;
mod selection;

pub use actions::*;
pub use column::*;
pub use controller::*;
pub use engine::*;
pub use pagination::*;
pub use render::*;
pub use selection::*;
