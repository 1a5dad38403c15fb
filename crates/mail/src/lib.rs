//! Mail crate - paged Gmail browsing with concurrent detail fetching
//!
//! This crate provides:
//! - Domain models (Item, Cursor, Credential)
//! - Gmail API client and credential storage
//! - A cursor-stack page navigator with forward/backward paging
//! - A bounded, cancellable detail fetcher
//! - A session object tying both together for a presentation layer
//!
//! Rendering, input handling and the OAuth consent flow live outside this
//! crate; see [`gmail::Authorizer`] for the authorization seam.

pub mod config;
pub mod error;
pub mod fetch;
pub mod gmail;
pub mod models;
pub mod navigator;
pub mod remote;
pub mod session;

pub use config::MailConfig;
pub use error::{Error, ErrorKind, Result};
pub use fetch::{CancellationToken, DetailFetcher, FetchOutcome};
pub use gmail::{Authorizer, CredentialStore, GmailClient, load_or_authorize, normalize_message};
pub use models::{
    Credential, Cursor, EmailAddress, Item, ListPage, ListQuery, MessageId, SortOrder,
    sort_by_timestamp,
};
pub use navigator::{PageNavigator, PaginationState};
pub use remote::{DetailClient, ListClient};
pub use session::{MailSession, Page};
