//! Item model: one fully fetched mail message

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Parse an email address from a string like "John Doe <john@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim().trim_matches('"').trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: (!name.is_empty()).then(|| name.to_string()),
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Name if present, otherwise the bare address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A single message resolved from the detail endpoint.
///
/// Items are immutable once built. The body holds the raw decoded bytes of
/// the chosen MIME part and may be empty when no renderable part exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: MessageId,
    subject: String,
    sender: String,
    /// Gmail's internal timestamp (milliseconds since epoch)
    timestamp: i64,
    body: Vec<u8>,
}

impl Item {
    /// Create a new item builder
    pub fn builder(id: MessageId) -> ItemBuilder {
        ItemBuilder::new(id)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw `From` header value
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsed `From` header
    pub fn sender_address(&self) -> EmailAddress {
        EmailAddress::parse(&self.sender)
    }

    /// Timestamp as a UTC datetime, if it is in range
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Builder for creating Item instances
pub struct ItemBuilder {
    id: MessageId,
    subject: String,
    sender: String,
    timestamp: i64,
    body: Vec<u8>,
}

impl ItemBuilder {
    fn new(id: MessageId) -> Self {
        Self {
            id,
            subject: String::new(),
            sender: String::new(),
            timestamp: 0,
            body: Vec::new(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Item {
        Item {
            id: self.id,
            subject: self.subject,
            sender: self.sender,
            timestamp: self.timestamp,
            body: self.body,
        }
    }
}

/// Presentation order for fetched items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    #[default]
    Ascending,
    /// Newest first
    Descending,
}

/// Sort items by timestamp.
///
/// Fetch results arrive in completion order, so callers that present items
/// must sort them explicitly. The sort is stable: items with equal
/// timestamps keep their relative input order in both directions.
pub fn sort_by_timestamp(items: &mut [Item], order: SortOrder) {
    match order {
        SortOrder::Ascending => items.sort_by_key(|item| item.timestamp),
        SortOrder::Descending => items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, timestamp: i64) -> Item {
        Item::builder(MessageId::new(id)).timestamp(timestamp).build()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id().as_str()).collect()
    }

    #[test]
    fn test_parse_email_with_name() {
        let addr = EmailAddress::parse("John Doe <john@example.com>");
        assert_eq!(addr.name, Some("John Doe".to_string()));
        assert_eq!(addr.email, "john@example.com");
    }

    #[test]
    fn test_parse_email_with_quoted_name() {
        let addr = EmailAddress::parse("\"Doe, John\" <john@example.com>");
        assert_eq!(addr.name, Some("Doe, John".to_string()));
        assert_eq!(addr.display_name(), "Doe, John");
    }

    #[test]
    fn test_parse_email_without_name() {
        let addr = EmailAddress::parse("john@example.com");
        assert_eq!(addr.name, None);
        assert_eq!(addr.display_name(), "john@example.com");
    }

    #[test]
    fn test_builder_defaults_are_empty() {
        let item = Item::builder(MessageId::new("m1")).build();
        assert_eq!(item.subject(), "");
        assert_eq!(item.sender(), "");
        assert!(item.body().is_empty());
        assert_eq!(item.timestamp(), 0);
    }

    #[test]
    fn test_received_at_from_millis() {
        let item = item("m1", 1_700_000_000_123);
        let received = item.received_at().unwrap();
        assert_eq!(received.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_sort_ascending_is_stable() {
        let mut items = vec![item("c", 30), item("a1", 10), item("b", 20), item("a2", 10)];
        sort_by_timestamp(&mut items, SortOrder::Ascending);
        assert_eq!(ids(&items), vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let mut items = vec![item("a1", 10), item("c", 30), item("a2", 10), item("b", 20)];
        sort_by_timestamp(&mut items, SortOrder::Descending);
        assert_eq!(ids(&items), vec!["c", "b", "a1", "a2"]);
    }
}
