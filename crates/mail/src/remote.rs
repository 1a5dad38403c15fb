//! Remote service contracts
//!
//! The navigator and fetcher only talk to the mail service through these
//! traits. [`crate::gmail::GmailClient`] implements both against the Gmail
//! REST API; tests plug in in-memory fakes.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Item, ListPage, ListQuery, MessageId};

/// A single "list items" call with cursor semantics
pub trait ListClient: Send + Sync {
    /// Fetch one page of message ids
    fn list(&self, query: &ListQuery) -> Result<ListPage>;
}

/// A single "get item detail" call by id
///
/// Implementations are shared across fetch workers and must be safe to call
/// concurrently. Cancellation is checked before a call starts; a call already
/// in flight is not interrupted and is bounded only by the client's own
/// request timeout.
pub trait DetailClient: Send + Sync {
    /// Fetch and decode one message
    fn get(&self, id: &MessageId) -> Result<Item>;
}

impl<T: ListClient + ?Sized> ListClient for Arc<T> {
    fn list(&self, query: &ListQuery) -> Result<ListPage> {
        (**self).list(query)
    }
}

impl<T: DetailClient + ?Sized> DetailClient for Arc<T> {
    fn get(&self, id: &MessageId) -> Result<Item> {
        (**self).get(id)
    }
}
