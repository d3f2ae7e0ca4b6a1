// Library exports for aslkit, a safe wrapper over the system log store

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod keys;
pub mod query;
pub mod search;
pub mod store;

pub use client::{Client, ClientOptions};
pub use error::{AslError, Result};
pub use handle::{Handle, HandleKind};
pub use keys::Level;
pub use query::{PredicateExpr, QueryFilter, QueryOp, Value};
pub use search::{Entry, LogFields, Record, RecordStream, SearchCursor};
pub use store::{LogStore, MemoryStore, SharedStore, Token};
