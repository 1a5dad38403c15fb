//! Domain models for mail entities

mod credential;
mod cursor;
mod item;

pub use credential::Credential;
pub use cursor::{Cursor, ListPage, ListQuery};
pub use item::{EmailAddress, Item, ItemBuilder, MessageId, SortOrder, sort_by_timestamp};
