//! Browsing session: navigation plus detail enrichment
//!
//! A [`MailSession`] is the explicit owner of all per-session state. The
//! presentation layer holds one and calls [`MailSession::next_page`] /
//! [`MailSession::previous_page`]; nothing here is global.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::MailConfig;
use crate::error::{Error, Result};
use crate::fetch::{CancellationToken, DetailFetcher};
use crate::models::{Item, MessageId, SortOrder, sort_by_timestamp};
use crate::navigator::{PageNavigator, PaginationState};
use crate::remote::{DetailClient, ListClient};

/// One page of fetched messages
#[derive(Debug, Default)]
pub struct Page {
    /// Ids as returned by the list endpoint, in server order
    pub ids: Vec<MessageId>,
    /// Successfully fetched items, sorted by timestamp
    pub items: Vec<Item>,
    /// Ids whose detail lookup failed, with the reason
    pub failures: Vec<(MessageId, Error)>,
}

impl Page {
    /// True when navigation produced no ids (no earlier/later page)
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Pager over a mail service that also resolves item details
pub struct MailSession<C> {
    navigator: PageNavigator<Arc<C>>,
    fetcher: DetailFetcher<C>,
    sort_order: SortOrder,
}

impl<C> MailSession<C>
where
    C: ListClient + DetailClient + 'static,
{
    pub fn new(client: C, config: &MailConfig) -> Result<Self> {
        let client = Arc::new(client);
        Ok(Self {
            navigator: PageNavigator::new(Arc::clone(&client), config.page_size),
            fetcher: DetailFetcher::new(client, config.max_concurrent_fetches)?,
            sort_order: config.sort_order,
        })
    }

    /// Advance one page and fetch its items
    pub fn next_page(&self, cancel: &CancellationToken) -> Result<Page> {
        let ids = self.navigator.next()?;
        Ok(self.enrich(ids, cancel))
    }

    /// Go back one page and fetch its items
    pub fn previous_page(&self, cancel: &CancellationToken) -> Result<Page> {
        let ids = self.navigator.previous()?;
        Ok(self.enrich(ids, cancel))
    }

    /// Snapshot of the cursor state
    pub fn state(&self) -> PaginationState {
        self.navigator.state()
    }

    pub fn is_busy(&self) -> bool {
        self.navigator.is_busy()
    }

    fn enrich(&self, ids: Vec<MessageId>, cancel: &CancellationToken) -> Page {
        let mut items = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();

        for outcome in self.fetcher.fetch_all(&ids, cancel) {
            match outcome.result {
                Ok(item) => items.push(item),
                Err(e) => {
                    log::warn!("[FETCH] Failed to fetch message {}: {}", outcome.id, e);
                    failures.push((outcome.id, e));
                }
            }
        }

        // Completion order is arbitrary; restore input order before the
        // stable timestamp sort so ties keep list order.
        let position: HashMap<&MessageId, usize> =
            ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        items.sort_by_key(|item| position.get(item.id()).copied().unwrap_or(usize::MAX));
        sort_by_timestamp(&mut items, self.sort_order);

        Page {
            ids,
            items,
            failures,
        }
    }
}
