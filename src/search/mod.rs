// Search module - Result cursors and records

mod fields;
mod record;
mod stream;

pub use fields::{parse_or_zero, LogFields};
pub use record::{Entry, Record};
pub use stream::RecordStream;

use crate::handle::{Handle, HandleKind};
use crate::store::{SharedStore, Token};
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Forward-only, single-pass stream of search results.
///
/// Once [`SearchCursor::advance`] has returned `None` the cursor stays
/// exhausted and never calls the store again. There is no rewind, and an
/// `advance` already waiting on the store cannot be cancelled.
#[derive(Debug)]
pub struct SearchCursor {
    // None when the store returned no response at all
    handle: Option<Handle>,
    exhausted: AtomicBool,
}

impl SearchCursor {
    pub(crate) fn new(store: &SharedStore, response: Option<Token>) -> Self {
        let handle = response.map(|token| Handle::wrap(HandleKind::Response, store, token));
        let exhausted = AtomicBool::new(handle.is_none());
        Self { handle, exhausted }
    }

    /// Wait for the next record, `None` once the results are exhausted
    pub fn advance(&self) -> Option<Record> {
        let handle = self.handle.as_ref()?;
        let message = handle.with_lock(|store, response| {
            if self.exhausted.load(Ordering::Acquire) {
                return None;
            }
            let message = store.next(response);
            if message.is_none() {
                self.exhausted.store(true, Ordering::Release);
                debug!("Response {:#x} exhausted", response.as_raw());
            }
            message
        })?;
        Some(Record::new(handle.store(), message))
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    /// Iterate by advancing until the cursor is exhausted
    pub fn records(&self) -> Records<'_> {
        Records { cursor: self }
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Release the response. Records taken from it become unusable.
    pub fn release(self) {
        if let Some(handle) = self.handle {
            handle.release();
        }
    }
}

/// Iterator over the remaining records of a [`SearchCursor`]
#[derive(Debug)]
pub struct Records<'a> {
    cursor: &'a SearchCursor,
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.cursor.advance()
    }
}

impl FusedIterator for Records<'_> {}
