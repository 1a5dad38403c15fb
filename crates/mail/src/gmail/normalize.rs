//! Gmail API response normalization
//!
//! Converts Gmail API messages to [`Item`] values. Malformed pieces of a
//! message (bad base64, missing headers, unparsable dates) degrade to empty
//! fields instead of failing the whole item.

use base64::prelude::*;

use super::api::{GmailMessage, MessagePart, MessagePayload};
use crate::models::{Item, MessageId};

/// Normalize a Gmail API message to an Item
pub fn normalize_message(gmail_msg: GmailMessage) -> Item {
    let timestamp = gmail_msg
        .internal_date
        .as_deref()
        .and_then(|d| d.trim().parse::<i64>().ok())
        .unwrap_or_else(|| {
            log::debug!("[GMAIL] Message {} has no usable internalDate", gmail_msg.id);
            0
        });

    let builder = Item::builder(MessageId::new(gmail_msg.id)).timestamp(timestamp);

    let Some(payload) = gmail_msg.payload else {
        return builder.build();
    };

    builder
        .subject(extract_header(&payload, "Subject").unwrap_or_default())
        .sender(extract_header(&payload, "From").unwrap_or_default())
        .body(select_body(&payload).unwrap_or_default())
        .build()
}

/// Extract a header value by exact (case-sensitive) name; first match wins
fn extract_header(payload: &MessagePayload, name: &str) -> Option<String> {
    payload
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
}

/// Choose the message body.
///
/// Order of preference: a `text/html` part, a `text/plain` part, then the
/// top-level payload body.
fn select_body(payload: &MessagePayload) -> Option<Vec<u8>> {
    if let Some(parts) = &payload.parts {
        if let Some(html) = find_part_body(parts, "text/html") {
            return Some(html);
        }
        if let Some(text) = find_part_body(parts, "text/plain") {
            return Some(text);
        }
    }

    payload
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .and_then(decode_base64_body)
}

/// Depth-first search of message parts for decodable content of `mime`
fn find_part_body(parts: &[MessagePart], mime: &str) -> Option<Vec<u8>> {
    for part in parts {
        if part.mime_type.as_deref().is_some_and(|m| mime_matches(m, mime))
            && let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref())
            && let Some(bytes) = decode_base64_body(data)
        {
            return Some(bytes);
        }

        if let Some(nested) = &part.parts
            && let Some(bytes) = find_part_body(nested, mime)
        {
            return Some(bytes);
        }
    }

    None
}

/// Compare a MIME type against an essence, ignoring parameters and case
fn mime_matches(mime_type: &str, essence: &str) -> bool {
    mime_type
        .split(';')
        .next()
        .is_some_and(|m| m.trim().eq_ignore_ascii_case(essence))
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
fn decode_base64_body(data: &str) -> Option<Vec<u8>> {
    let decoders: [&base64::engine::GeneralPurpose; 4] = [
        &BASE64_URL_SAFE_NO_PAD,
        &BASE64_URL_SAFE,
        &BASE64_STANDARD,
        &BASE64_STANDARD_NO_PAD,
    ];

    let decoded = decoders.iter().find_map(|d| d.decode(data).ok());
    if decoded.is_none() {
        log::debug!("[GMAIL] Dropping undecodable body part ({} bytes)", data.len());
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::api::{Header, MessageBody};

    fn encode(s: &str) -> String {
        BASE64_URL_SAFE.encode(s)
    }

    fn body(data: &str) -> Option<MessageBody> {
        Some(MessageBody {
            size: Some(data.len() as u32),
            data: Some(data.to_string()),
        })
    }

    fn part(mime: &str, content: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime.to_string()),
            body: body(&encode(content)),
            ..Default::default()
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> Option<Vec<Header>> {
        Some(
            pairs
                .iter()
                .map(|(n, v)| Header {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        )
    }

    fn message(payload: MessagePayload) -> GmailMessage {
        GmailMessage {
            id: "m1".to_string(),
            internal_date: Some("1700000000000".to_string()),
            payload: Some(payload),
        }
    }

    #[test]
    fn test_html_part_preferred_over_plain() {
        let payload = MessagePayload {
            parts: Some(vec![
                part("text/plain", "plain body"),
                part("text/html", "<p>html body</p>"),
            ]),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.body(), b"<p>html body</p>");
    }

    #[test]
    fn test_plain_part_used_without_html() {
        let payload = MessagePayload {
            parts: Some(vec![
                part("application/pdf", "%PDF"),
                part("text/plain", "just text"),
            ]),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.body(), b"just text");
    }

    #[test]
    fn test_nested_alternative_parts() {
        let alternative = MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            parts: Some(vec![
                part("text/plain", "nested plain"),
                part("text/html; charset=UTF-8", "<b>nested html</b>"),
            ]),
            ..Default::default()
        };
        let payload = MessagePayload {
            mime_type: Some("multipart/mixed".to_string()),
            parts: Some(vec![alternative]),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.body(), b"<b>nested html</b>");
    }

    #[test]
    fn test_top_level_body_fallback() {
        let payload = MessagePayload {
            mime_type: Some("text/plain".to_string()),
            body: body(&encode("top level")),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.body(), b"top level");
    }

    #[test]
    fn test_bad_base64_yields_empty_body() {
        let payload = MessagePayload {
            headers: headers(&[("Subject", "Still here")]),
            body: body("***not base64***"),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert!(item.body().is_empty());
        assert_eq!(item.subject(), "Still here");
    }

    #[test]
    fn test_undecodable_html_falls_back_to_plain() {
        let mut html = part("text/html", "");
        html.body = body("%%%");
        let payload = MessagePayload {
            parts: Some(vec![html, part("text/plain", "readable")]),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.body(), b"readable");
    }

    #[test]
    fn test_headers_case_sensitive_first_wins() {
        let payload = MessagePayload {
            headers: headers(&[
                ("subject", "lowercase is ignored"),
                ("From", "Alice <alice@example.com>"),
                ("Subject", "First"),
                ("Subject", "Second"),
                ("From", "Mallory <mallory@example.com>"),
            ]),
            ..Default::default()
        };

        let item = normalize_message(message(payload));
        assert_eq!(item.subject(), "First");
        assert_eq!(item.sender(), "Alice <alice@example.com>");
    }

    #[test]
    fn test_missing_headers_become_empty() {
        let item = normalize_message(message(MessagePayload::default()));
        assert_eq!(item.subject(), "");
        assert_eq!(item.sender(), "");
        assert_eq!(item.timestamp(), 1_700_000_000_000);
    }

    #[test]
    fn test_bad_internal_date_is_zero() {
        let mut msg = message(MessagePayload::default());
        msg.internal_date = Some("yesterday".to_string());
        assert_eq!(normalize_message(msg).timestamp(), 0);
    }

    #[test]
    fn test_decode_base64_body_variants() {
        // "Hello, World!" in base64url, with and without padding
        assert_eq!(
            decode_base64_body("SGVsbG8sIFdvcmxkIQ"),
            Some(b"Hello, World!".to_vec())
        );
        assert_eq!(
            decode_base64_body("SGVsbG8sIFdvcmxkIQ=="),
            Some(b"Hello, World!".to_vec())
        );
        // URL-safe alphabet ('-' and '_')
        assert_eq!(decode_base64_body("-_8"), Some(vec![0xfb, 0xff]));
    }
}
