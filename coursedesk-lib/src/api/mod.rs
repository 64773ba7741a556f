//! REST resources consumed by the admin screens

mod list;
mod notifications;
mod page;

pub use list::*;
pub use notifications::*;
pub use page::*;
