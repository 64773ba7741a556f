//! Data model types

mod notification;
mod row_id;
mod user;

pub use notification::*;
pub use row_id::*;
pub use user::*;
