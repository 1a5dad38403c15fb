//! Opaque pagination cursors

use serde::{Deserialize, Serialize};

/// Server-issued page token.
///
/// The client never interprets or constructs a cursor's contents; it only
/// echoes tokens back verbatim. "No cursor" (the first page) is expressed as
/// `Option::<Cursor>::None` everywhere in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Convert a token from a response, treating an empty token as absent
    pub fn from_token(token: Option<String>) -> Option<Self> {
        token.filter(|t| !t.is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters for one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page_size: usize,
    pub cursor: Option<Cursor>,
}

/// One page of ids returned by the list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub ids: Vec<super::MessageId>,
    pub next_cursor: Option<Cursor>,
}
