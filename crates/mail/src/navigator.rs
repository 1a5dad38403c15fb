//! Cursor-stack pagination over the list endpoint
//!
//! The list endpoint only ever hands out a token for the *next* page, so
//! going backward means replaying a cursor we already used. The navigator
//! keeps every cursor it has requested on a stack whose top is always the
//! cursor of the page currently shown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::models::{Cursor, ListQuery, MessageId};
use crate::remote::ListClient;

/// Cursor bookkeeping for one browsing session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    current: Option<Cursor>,
    next: Option<Cursor>,
    /// Cursors used to reach the current page; last element is most recent
    history: Vec<Option<Cursor>>,
}

impl PaginationState {
    /// Cursor that produced the page currently shown (`None` = first page)
    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    /// Cursor the next forward request will send
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    /// Cursor history, most recent first
    pub fn history(&self) -> Vec<Option<&Cursor>> {
        self.history.iter().rev().map(Option::as_ref).collect()
    }

    /// Number of pages on the stack
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// True once the last page has been loaded
    pub fn is_exhausted(&self) -> bool {
        !self.history.is_empty() && self.next.is_none()
    }

    pub fn has_previous(&self) -> bool {
        self.history.len() >= 2
    }
}

/// Forward/backward pager over a [`ListClient`]
///
/// Only one page request may be in flight. A navigation call made while
/// another is running fails immediately with [`Error::Busy`] instead of
/// queueing. State is only touched after a request succeeds, so a failed
/// call leaves the navigator exactly where it was.
pub struct PageNavigator<L> {
    client: L,
    page_size: usize,
    busy: AtomicBool,
    state: Mutex<PaginationState>,
}

impl<L: ListClient> PageNavigator<L> {
    pub fn new(client: L, page_size: usize) -> Self {
        Self {
            client,
            page_size,
            busy: AtomicBool::new(false),
            state: Mutex::new(PaginationState::default()),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True while a page request is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the cursor state
    pub fn state(&self) -> PaginationState {
        self.lock_state().clone()
    }

    /// Load the page after the current one.
    ///
    /// Past the last page this returns an empty list without contacting the
    /// server, and keeps doing so on every further call.
    pub fn next(&self) -> Result<Vec<MessageId>> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let cursor = {
            let state = self.lock_state();
            if state.is_exhausted() {
                log::debug!("[NAV] next: already on the last page");
                return Ok(Vec::new());
            }
            state.next.clone()
        };

        let page = self.client.list(&ListQuery {
            page_size: self.page_size,
            cursor: cursor.clone(),
        })?;

        let mut state = self.lock_state();
        state.history.push(cursor.clone());
        state.current = cursor;
        state.next = page.next_cursor;
        log::debug!(
            "[NAV] next: {} ids, depth {}, more={}",
            page.ids.len(),
            state.history.len(),
            state.next.is_some()
        );

        Ok(page.ids)
    }

    /// Reload the page before the current one.
    ///
    /// With fewer than two pages on the stack there is nothing earlier to
    /// go back to; an empty list is returned and nothing changes.
    pub fn previous(&self) -> Result<Vec<MessageId>> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let (shown, target) = {
            let state = self.lock_state();
            let depth = state.history.len();
            if depth < 2 {
                log::debug!("[NAV] previous: no earlier page");
                return Ok(Vec::new());
            }
            (state.history[depth - 1].clone(), state.history[depth - 2].clone())
        };

        let page = self.client.list(&ListQuery {
            page_size: self.page_size,
            cursor: target.clone(),
        })?;

        // Pop the shown page and the target page, then push the target back
        // so the stack top matches the page now shown.
        let mut state = self.lock_state();
        let depth = state.history.len();
        state.history.truncate(depth - 2);
        state.history.push(target.clone());
        state.next = shown;
        state.current = target;
        log::debug!(
            "[NAV] previous: {} ids, depth {}",
            page.ids.len(),
            state.history.len()
        );

        Ok(page.ids)
    }

    fn lock_state(&self) -> MutexGuard<'_, PaginationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the busy flag for the duration of one navigation call
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| Error::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
