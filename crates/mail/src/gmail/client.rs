//! Gmail API HTTP client
//!
//! Provides the list and detail calls against the Gmail REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic; every call is bounded
//! by the agent's global timeout.

use std::time::Duration;

use url::Url;

use super::api::{GmailMessage, ListMessagesResponse};
use super::normalize_message;
use crate::config::MailConfig;
use crate::error::{Error, Result};
use crate::models::{Credential, Cursor, Item, ListPage, ListQuery, MessageId};
use crate::remote::{DetailClient, ListClient};

/// Gmail API client for fetching messages
///
/// Read-only after construction; one instance is shared by the navigator and
/// every detail worker.
pub struct GmailClient {
    agent: ureq::Agent,
    base_url: Url,
    access_token: String,
}

impl GmailClient {
    /// Gmail API base URL
    pub const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Largest page the list endpoint accepts
    pub const MAX_PAGE_SIZE: usize = 500;

    /// Create a new Gmail client
    ///
    /// # Arguments
    /// * `credential` - Access credential obtained through [`super::CredentialStore`]
    /// * `base_url` - API root, normally [`Self::BASE_URL`]
    /// * `timeout` - Upper bound for each request, including reading the body
    pub fn new(credential: &Credential, base_url: &str, timeout: Duration) -> Result<Self> {
        if credential.access_token.is_empty() {
            return Err(Error::InvalidConfig(
                "credential has an empty access token".to_string(),
            ));
        }
        if credential.is_expired() {
            log::warn!("[GMAIL] Credential expired at {}; requests may be rejected", credential.expiry);
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("invalid API base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "API base URL {base_url} cannot be a base"
            )));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Ok(Self {
            agent,
            base_url,
            access_token: credential.access_token.clone(),
        })
    }

    /// Create a client using the endpoint and timeout from `config`
    pub fn from_config(credential: &Credential, config: &MailConfig) -> Result<Self> {
        Self::new(credential, &config.api_base_url, config.request_timeout())
    }

    /// List message IDs from the user's mailbox
    ///
    /// # Arguments
    /// * `max_results` - Maximum number of messages to return per page (1-500)
    /// * `page_token` - Optional page token for pagination
    pub fn list_messages(
        &self,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse> {
        let mut url = self.endpoint(&["users", "me", "messages"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(
                "maxResults",
                &max_results.clamp(1, Self::MAX_PAGE_SIZE).to_string(),
            );
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        log::debug!(
            "[GMAIL] list maxResults={} first_page={}",
            max_results,
            page_token.is_none()
        );
        self.get_json(&url, "list messages")
    }

    /// Get full message details by ID
    ///
    /// # Arguments
    /// * `id` - The message ID to fetch
    pub fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let mut url = self.endpoint(&["users", "me", "messages", id.as_str()]);
        url.query_pairs_mut().append_pair("format", "full");

        log::debug!("[GMAIL] get message {}", id);
        self.get_json(&url, "get message")
    }

    /// Build an endpoint URL below the API root; segments are percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url, what: &str) -> Result<T> {
        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.access_token))
            .call()
            .map_err(|e| map_ureq_error(what, e))?;

        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| match e {
                ureq::Error::Json(json) => Error::Decode(format!("Failed to parse {what} response: {json}")),
                other => map_ureq_error(what, other),
            })
    }
}

impl ListClient for GmailClient {
    fn list(&self, query: &ListQuery) -> Result<ListPage> {
        let response =
            self.list_messages(query.page_size, query.cursor.as_ref().map(Cursor::as_str))?;

        let ids = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| MessageId::new(m.id))
            .collect();

        Ok(ListPage {
            ids,
            next_cursor: Cursor::from_token(response.next_page_token),
        })
    }
}

impl DetailClient for GmailClient {
    fn get(&self, id: &MessageId) -> Result<Item> {
        self.get_message(id).map(normalize_message)
    }
}

/// Translate a ureq failure into the crate's error kinds
fn map_ureq_error(what: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(status @ (401 | 403)) => Error::Auth { status },
        ureq::Error::StatusCode(429) => Error::RateLimited,
        ureq::Error::StatusCode(status) => {
            Error::Transport(format!("Failed to {what}: HTTP {status}"))
        }
        err @ ureq::Error::Timeout(_) => Error::Timeout(format!("Failed to {what}: {err}")),
        ureq::Error::Json(e) => Error::Decode(format!("Failed to parse {what} response: {e}")),
        other => Error::Transport(format!("Failed to {what}: {other}")),
    }
}
