//! Concurrent detail fetching
//!
//! Resolves pages of message ids into full items on a bounded worker pool.

mod cancel;
mod detail;

pub use cancel::CancellationToken;
pub use detail::{DetailFetcher, FetchOutcome};
