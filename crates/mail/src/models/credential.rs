//! Stored OAuth credential

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access credential persisted between runs.
///
/// Serialized as camelCase JSON. Snake-case field names written by other
/// OAuth tooling are accepted on read.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(alias = "access_token")]
    pub access_token: String,
    #[serde(alias = "refresh_token", default)]
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expiry,
        }
    }

    /// True if the credential expires within `window` of now
    pub fn expires_within(&self, window: Duration) -> bool {
        self.expiry <= Utc::now() + window
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }
}

// Tokens must never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}
