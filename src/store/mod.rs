// Store module - The native log store boundary

#[cfg(target_os = "macos")]
pub mod asl;
pub mod memory;

use crate::error::Result;
use std::ffi::CStr;
use std::num::NonZeroUsize;
use std::sync::Arc;

#[cfg(target_os = "macos")]
pub use asl::AslStore;
pub use memory::{MemoryStore, NativeCall};

/// Opaque, pointer-sized identifier of a native resource.
///
/// A null identifier is never wrapped: stores report it as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(NonZeroUsize);

impl Token {
    /// Wrap a raw identifier, returning `None` for null
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// The raw identifier as handed out by the store
    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

/// The native log store, consumed as an opaque search and iteration oracle.
///
/// Implementations are not required to be reentrant per token; callers
/// serialize access to each token themselves (see [`crate::handle::Handle`]).
/// Passing a token after it was closed, released or freed is governed by the
/// implementation's own contract.
pub trait LogStore: Send + Sync {
    /// Open a client session. `None` for ident or facility selects the default.
    fn open(&self, ident: Option<&CStr>, facility: Option<&CStr>, options: u32) -> Option<Token>;

    /// Allocate an empty query
    fn new_query(&self) -> Option<Token>;

    /// Add a predicate to a query. A `None` value tests for key presence.
    fn set_query(&self, query: Token, key: &CStr, value: Option<&CStr>, op: u32);

    /// Run a query, returning a response to iterate
    fn search(&self, client: Token, query: Token) -> Option<Token>;

    /// Next message of a response, `None` once the response is exhausted
    fn next(&self, response: Token) -> Option<Token>;

    /// Key at `index` in a message, `None` past the last key
    fn key(&self, message: Token, index: u32) -> Option<String>;

    /// Value of `key` in a message, `None` if the key is not set
    fn get(&self, message: Token, key: &CStr) -> Option<String>;

    /// Tear down a client session
    fn close(&self, token: Token);

    /// Drop one reference to an object
    fn release(&self, token: Token);

    /// Free an object outright (legacy teardown path)
    fn free(&self, token: Token);
}

/// Store shared by every handle it minted
pub type SharedStore = Arc<dyn LogStore>;

/// The platform's system log store
#[cfg(target_os = "macos")]
pub fn system() -> Result<SharedStore> {
    Ok(Arc::new(AslStore::new()))
}

/// The platform's system log store
#[cfg(not(target_os = "macos"))]
pub fn system() -> Result<SharedStore> {
    Err(crate::error::AslError::StoreUnavailable(format!(
        "the system log is not available on {}",
        std::env::consts::OS
    )))
}
