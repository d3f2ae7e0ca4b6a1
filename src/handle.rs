// Handle - Lock-guarded owner of one native resource

use crate::store::{LogStore, SharedStore, Token};
use parking_lot::Mutex;
use std::ffi::CString;
use tracing::trace;

/// Kind of native resource behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Client,
    Query,
    Response,
    Message,
}

impl std::fmt::Display for HandleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleKind::Client => write!(f, "client"),
            HandleKind::Query => write!(f, "query"),
            HandleKind::Response => write!(f, "response"),
            HandleKind::Message => write!(f, "message"),
        }
    }
}

/// Owner of one native token and the lock that serializes calls on it.
///
/// Every native call on the token goes through [`Handle::with_lock`]. The
/// lock is never held while another handle's lock is taken.
///
/// Teardown is explicit and consumes the handle: dropping a handle without
/// calling `close`, `release` or `free` leaks the native resource. The three
/// teardown calls are distinct native operations; use the one that matches
/// the resource kind.
pub struct Handle {
    kind: HandleKind,
    token: Token,
    store: SharedStore,
    lock: Mutex<()>,
}

impl Handle {
    /// Allocate a native resource through `alloc`.
    ///
    /// Returns `None` when the store hands back a null token.
    pub fn acquire<F>(kind: HandleKind, store: &SharedStore, alloc: F) -> Option<Self>
    where
        F: FnOnce(&dyn LogStore) -> Option<Token>,
    {
        let token = alloc(store.as_ref())?;
        Some(Self::wrap(kind, store, token))
    }

    /// Take ownership of a token the store already handed out
    pub(crate) fn wrap(kind: HandleKind, store: &SharedStore, token: Token) -> Self {
        trace!("Acquired {} handle {:#x}", kind, token.as_raw());
        Self {
            kind,
            token,
            store: SharedStore::clone(store),
            lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// The store this handle's token belongs to
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run one native call with this handle's lock held.
    ///
    /// The lock is released on every exit path, unwinding included.
    pub fn with_lock<R, F>(&self, op: F) -> R
    where
        F: FnOnce(&dyn LogStore, Token) -> R,
    {
        let _guard = self.lock.lock();
        op(self.store.as_ref(), self.token)
    }

    /// Tear down a session
    pub fn close(self) {
        self.with_lock(|store, token| store.close(token));
        trace!("Closed {} handle {:#x}", self.kind, self.token.as_raw());
    }

    /// Drop the reference this handle holds
    pub fn release(self) {
        self.with_lock(|store, token| store.release(token));
        trace!("Released {} handle {:#x}", self.kind, self.token.as_raw());
    }

    /// Free the object outright
    pub fn free(self) {
        self.with_lock(|store, token| store.free(token));
        trace!("Freed {} handle {:#x}", self.kind, self.token.as_raw());
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("token", &format_args!("{:#x}", self.token.as_raw()))
            .finish()
    }
}

/// Convert to a C string, keeping the bytes before the first NUL
pub(crate) fn to_c_string(s: &str) -> CString {
    let bytes = s.as_bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    CString::new(&bytes[..end]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NativeCall};
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Store that records how many calls overlap
    #[derive(Default)]
    struct OverlapCounter {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl OverlapCounter {
        fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl LogStore for OverlapCounter {
        fn open(&self, _: Option<&CStr>, _: Option<&CStr>, _: u32) -> Option<Token> {
            Token::new(1)
        }
        fn new_query(&self) -> Option<Token> {
            Token::new(2)
        }
        fn set_query(&self, _: Token, _: &CStr, _: Option<&CStr>, _: u32) {
            self.enter();
        }
        fn search(&self, _: Token, _: Token) -> Option<Token> {
            None
        }
        fn next(&self, _: Token) -> Option<Token> {
            None
        }
        fn key(&self, _: Token, _: u32) -> Option<String> {
            None
        }
        fn get(&self, _: Token, _: &CStr) -> Option<String> {
            None
        }
        fn close(&self, _: Token) {}
        fn release(&self, _: Token) {}
        fn free(&self, _: Token) {}
    }

    #[test]
    fn test_with_lock_serializes_calls() {
        let counter = Arc::new(OverlapCounter::default());
        let store: SharedStore = counter.clone();
        let handle = Handle::acquire(HandleKind::Query, &store, |s| s.new_query()).unwrap();
        let key = to_c_string("Sender");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5 {
                        handle.with_lock(|s, token| s.set_query(token, &key, None, 0));
                    }
                });
            }
        });

        assert_eq!(counter.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lock_released_after_panic() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let handle = Handle::acquire(HandleKind::Query, &store, |s| s.new_query()).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handle.with_lock(|_, _| panic!("native call blew up"));
        }));
        assert!(result.is_err());

        // The lock must be free again
        assert_eq!(handle.with_lock(|_, token| token), handle.token());
    }

    #[test]
    fn test_acquire_null_token() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        assert!(Handle::acquire(HandleKind::Client, &store, |_| None).is_none());
    }

    #[test]
    fn test_teardown_calls_are_distinct() {
        let memory = Arc::new(MemoryStore::new().with_journal());
        let store: SharedStore = memory.clone();

        let a = Handle::acquire(HandleKind::Client, &store, |s| s.open(None, None, 0)).unwrap();
        let b = Handle::acquire(HandleKind::Query, &store, |s| s.new_query()).unwrap();
        let c = Handle::acquire(HandleKind::Query, &store, |s| s.new_query()).unwrap();
        let (ta, tb, tc) = (a.token(), b.token(), c.token());
        memory.clear_calls();

        a.close();
        b.release();
        c.free();

        assert_eq!(
            memory.calls(),
            vec![
                NativeCall::Close(ta),
                NativeCall::Release(tb),
                NativeCall::Free(tc)
            ]
        );
        assert_eq!(memory.live_objects(), 0);
    }

    #[test]
    fn test_to_c_string_truncates_at_nul() {
        assert_eq!(to_c_string("Sender").to_str().unwrap(), "Sender");
        assert_eq!(to_c_string("ab\0cd").to_str().unwrap(), "ab");
        assert_eq!(to_c_string("").to_str().unwrap(), "");
    }
}
