// Client - An open logging session

use crate::error::{AslError, Result};
use crate::handle::{to_c_string, Handle, HandleKind};
use crate::query::QueryFilter;
use crate::search::SearchCursor;
use crate::store::SharedStore;
use std::ops::{BitOr, BitOrAssign};
use tracing::{debug, warn};

/// Client option flags, with the values of the `ASL_OPT_*` constants.
///
/// Flags are independent; bits without a named constant are passed to the
/// store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClientOptions(u32);

impl ClientOptions {
    /// Mirror messages to stderr
    pub const STDERR: ClientOptions = ClientOptions(0x0001);
    /// Connect to the server immediately instead of batching
    pub const NO_DELAY: ClientOptions = ClientOptions(0x0002);
    /// Ignore remote control settings
    pub const NO_REMOTE: ClientOptions = ClientOptions(0x0004);

    pub const fn empty() -> Self {
        ClientOptions(0)
    }

    pub const fn from_bits_retain(bits: u32) -> Self {
        ClientOptions(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ClientOptions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Look up a flag by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stderr" => Some(Self::STDERR),
            "no_delay" => Some(Self::NO_DELAY),
            "no_remote" => Some(Self::NO_REMOTE),
            _ => None,
        }
    }
}

impl BitOr for ClientOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        ClientOptions(self.0 | rhs.0)
    }
}

impl BitOrAssign for ClientOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// An open logging session, used as the source of searches
#[derive(Debug)]
pub struct Client {
    handle: Handle,
}

impl Client {
    /// Open a session on `store`.
    ///
    /// An empty `ident` or `facility` selects the store's default for that
    /// field rather than matching an empty string.
    pub fn open(
        store: &SharedStore,
        ident: &str,
        facility: &str,
        options: ClientOptions,
    ) -> Result<Self> {
        let c_ident = (!ident.is_empty()).then(|| to_c_string(ident));
        let c_facility = (!facility.is_empty()).then(|| to_c_string(facility));

        let handle = Handle::acquire(HandleKind::Client, store, |s| {
            s.open(c_ident.as_deref(), c_facility.as_deref(), options.bits())
        })
        .ok_or_else(|| {
            warn!(
                "Store refused to open client (ident: {:?}, facility: {:?})",
                ident, facility
            );
            AslError::ClientOpen {
                ident: ident.to_string(),
                facility: facility.to_string(),
            }
        })?;

        debug!(
            "Opened client {:#x} (ident: {:?}, facility: {:?}, options: {:#x})",
            handle.token().as_raw(),
            ident,
            facility,
            options.bits()
        );
        Ok(Self { handle })
    }

    /// Run `filter` against the store.
    ///
    /// Never fails locally: a filter that matches nothing, or that the store
    /// rejects, yields a cursor that is exhausted from the start. Only this
    /// client's lock is held; the filter's lock is not taken.
    pub fn search(&self, filter: &QueryFilter) -> SearchCursor {
        let query = filter.handle().token();
        let response = self
            .handle
            .with_lock(|store, client| store.search(client, query));

        debug!(
            "Search on client {:#x} with query {:#x} returned {}",
            self.handle.token().as_raw(),
            query.as_raw(),
            if response.is_some() { "a response" } else { "nothing" }
        );
        SearchCursor::new(self.handle.store(), response)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// End the session
    pub fn close(self) {
        self.handle.close();
    }
}
