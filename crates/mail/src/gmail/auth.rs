//! Gmail credential persistence
//!
//! The core never runs the OAuth consent flow itself. It loads a stored
//! [`Credential`] and, when none is usable, asks an [`Authorizer`] supplied by
//! the application for a fresh one, then stores it for the next run.

use chrono::Duration;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::MailConfig;
use crate::error::{Error, Result};
use crate::models::Credential;

/// Obtains credentials through user interaction (browser consent, prompts)
///
/// Implemented outside the core.
pub trait Authorizer {
    /// Run the full authorization flow
    fn authorize(&self) -> Result<Credential>;

    /// Renew a credential that is expired or about to expire
    ///
    /// Defaults to running the full flow again.
    fn renew(&self, _stale: &Credential) -> Result<Credential> {
        self.authorize()
    }
}

/// File-backed credential storage
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_path: PathBuf,
}

impl CredentialStore {
    /// Credentials expiring within this window are handed back for renewal
    pub const EXPIRY_MARGIN_SECS: i64 = 300;

    /// Store at the default location (~/.config/folio/gmail-tokens.json)
    pub fn new() -> Result<Self> {
        let token_path = MailConfig::default_credentials_path().ok_or_else(|| {
            Error::InvalidConfig("Could not determine config directory".to_string())
        })?;
        Ok(Self { token_path })
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    /// Load stored credential from disk
    pub fn load(&self) -> Result<Credential> {
        let content = match fs::read_to_string(&self.token_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::CredentialNotFound(self.token_path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|source| Error::CredentialCorrupt {
            path: self.token_path.clone(),
            source,
        })
    }

    /// Save credential to disk, replacing any previous one atomically
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let content = serde_json::to_vec_pretty(credential)
            .map_err(|e| Error::Decode(format!("Failed to encode credential: {e}")))?;
        config::write_private_atomic(&self.token_path, &content)?;
        log::info!("[AUTH] Saved credential to {}", self.token_path.display());
        Ok(())
    }

    /// Clear stored tokens (logout)
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.token_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Get a usable credential, re-authorizing as needed
///
/// A missing or corrupt file triggers [`Authorizer::authorize`]; a credential
/// inside the expiry margin triggers [`Authorizer::renew`]. Whatever the
/// authorizer returns is saved before being handed back.
pub fn load_or_authorize(store: &CredentialStore, authorizer: &dyn Authorizer) -> Result<Credential> {
    let credential = match store.load() {
        Ok(credential)
            if credential.expires_within(Duration::seconds(CredentialStore::EXPIRY_MARGIN_SECS)) =>
        {
            log::info!("[AUTH] Stored credential expires at {}, renewing", credential.expiry);
            authorizer.renew(&credential)?
        }
        Ok(credential) => return Ok(credential),
        Err(e @ (Error::CredentialNotFound(_) | Error::CredentialCorrupt { .. })) => {
            log::info!("[AUTH] {e}; starting authorization");
            authorizer.authorize()?
        }
        Err(e) => return Err(e),
    };

    store.save(&credential)?;
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct FakeAuthorizer {
        authorize_calls: Cell<usize>,
        renew_calls: Cell<usize>,
    }

    impl FakeAuthorizer {
        fn new() -> Self {
            Self {
                authorize_calls: Cell::new(0),
                renew_calls: Cell::new(0),
            }
        }
    }

    impl Authorizer for FakeAuthorizer {
        fn authorize(&self) -> Result<Credential> {
            self.authorize_calls.set(self.authorize_calls.get() + 1);
            Ok(Credential::new("fresh", "refresh", Utc::now() + Duration::hours(1)))
        }

        fn renew(&self, stale: &Credential) -> Result<Credential> {
            self.renew_calls.set(self.renew_calls.get() + 1);
            Ok(Credential::new(
                "renewed",
                stale.refresh_token.clone(),
                Utc::now() + Duration::hours(1),
            ))
        }
    }

    fn store(dir: &TempDir) -> CredentialStore {
        CredentialStore::at(dir.path().join("gmail-tokens.json"))
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).load().unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound(_)));
        assert!(err.requires_authorization());
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "{\"accessToken\": 12").unwrap();
        assert!(matches!(store.load(), Err(Error::CredentialCorrupt { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let cred = Credential::new("at", "rt", Utc::now() + Duration::hours(1));

        store.save(&cred).unwrap();
        assert_eq!(store.load().unwrap(), cred);
    }

    #[test]
    fn test_save_overwrites_longer_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let long = Credential::new("a".repeat(500), "r".repeat(500), Utc::now());
        let short = Credential::new("short", "r", Utc::now());

        store.save(&long).unwrap();
        store.save(&short).unwrap();
        assert_eq!(store.load().unwrap(), short);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&Credential::new("at", "rt", Utc::now())).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(matches!(store.load(), Err(Error::CredentialNotFound(_))));
    }

    #[test]
    fn test_bootstrap_authorizes_and_saves_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let authorizer = FakeAuthorizer::new();

        let cred = load_or_authorize(&store, &authorizer).unwrap();
        assert_eq!(cred.access_token, "fresh");
        assert_eq!(authorizer.authorize_calls.get(), 1);
        assert_eq!(store.load().unwrap().access_token, "fresh");
    }

    #[test]
    fn test_bootstrap_uses_valid_stored_credential() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .save(&Credential::new("stored", "rt", Utc::now() + Duration::hours(2)))
            .unwrap();
        let authorizer = FakeAuthorizer::new();

        let cred = load_or_authorize(&store, &authorizer).unwrap();
        assert_eq!(cred.access_token, "stored");
        assert_eq!(authorizer.authorize_calls.get(), 0);
        assert_eq!(authorizer.renew_calls.get(), 0);
    }

    #[test]
    fn test_bootstrap_renews_expiring_credential() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .save(&Credential::new("old", "keep-me", Utc::now() + Duration::seconds(10)))
            .unwrap();
        let authorizer = FakeAuthorizer::new();

        let cred = load_or_authorize(&store, &authorizer).unwrap();
        assert_eq!(cred.access_token, "renewed");
        assert_eq!(cred.refresh_token, "keep-me");
        assert_eq!(authorizer.renew_calls.get(), 1);
        assert_eq!(store.load().unwrap().access_token, "renewed");
    }
}
