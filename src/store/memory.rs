// In-memory log store
//
// Evaluates queries the way the system store does. With the journal enabled it
// also records every call it receives, so the handle layer can be exercised
// without a system log.

use super::{LogStore, Token};
use crate::error::{AslError, Result};
use crate::query::{Comparison, QueryOp};
use crate::search::parse_or_zero;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Key/value pairs of one stored message, in key order
pub type Fields = Vec<(String, String)>;

/// A call received by a [`MemoryStore`], with C strings decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Open {
        ident: Option<String>,
        facility: Option<String>,
        options: u32,
    },
    NewQuery,
    SetQuery {
        query: Token,
        key: String,
        value: Option<String>,
        op: u32,
    },
    Search {
        client: Token,
        query: Token,
    },
    Next {
        response: Token,
    },
    Key {
        message: Token,
        index: u32,
    },
    Get {
        message: Token,
        key: String,
    },
    Close(Token),
    Release(Token),
    Free(Token),
}

#[derive(Debug, Clone)]
struct StoredPredicate {
    key: String,
    value: Option<String>,
    op: u32,
}

#[derive(Debug)]
enum Object {
    Client,
    Query(Vec<StoredPredicate>),
    Response(VecDeque<Arc<Fields>>),
    Message { owner: Token, fields: Arc<Fields> },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: usize,
    messages: Vec<Arc<Fields>>,
    objects: HashMap<Token, Object>,
    calls: Vec<NativeCall>,
    journal: bool,
    refuse_allocations: bool,
}

impl Inner {
    fn record(&mut self, call: impl FnOnce() -> NativeCall) {
        if self.journal {
            self.calls.push(call());
        }
    }

    fn allocate(&mut self, object: Object) -> Option<Token> {
        self.next_id += 1;
        let token = Token::new(self.next_id)?;
        self.objects.insert(token, object);
        Some(token)
    }

    fn message(&self, token: Token) -> Option<&Arc<Fields>> {
        match self.objects.get(&token) {
            Some(Object::Message { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    fn discard(&mut self, token: Token) {
        if let Some(Object::Response(_)) = self.objects.remove(&token) {
            // Messages handed out by a response die with it
            self.objects.retain(|_, object| {
                !matches!(object, Object::Message { owner, .. } if *owner == token)
            });
        }
    }
}

/// Thread-safe log store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with messages
    pub fn with_messages<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = Fields>,
    {
        let store = Self::new();
        for fields in messages {
            store.push(fields);
        }
        store
    }

    /// Load messages from a JSON fixture: an array of objects whose values
    /// are strings, numbers or booleans
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AslError::Fixture(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse messages from JSON fixture text
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(contents)
                .map_err(|e| AslError::Fixture(format!("Failed to parse JSON: {}", e)))?;

        let mut messages = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let mut fields = Fields::with_capacity(record.len());
            for (key, value) in record {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Null => continue,
                    _ => {
                        return Err(AslError::Fixture(format!(
                            "record {}: value of '{}' must be a string, number or boolean",
                            index, key
                        )))
                    }
                };
                fields.push((key, value));
            }
            messages.push(fields);
        }

        debug!("Loaded {} fixture messages", messages.len());
        Ok(Self::with_messages(messages))
    }

    /// Append a message; searches started afterwards will see it
    pub fn push(&self, fields: Fields) {
        self.inner.lock().messages.push(Arc::new(fields));
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every allocation (`open`, `new_query`) return null
    pub fn refuse_allocations(&self, refuse: bool) {
        self.inner.lock().refuse_allocations = refuse;
    }

    /// Same store with the call journal enabled
    pub fn with_journal(self) -> Self {
        self.record_calls(true);
        self
    }

    /// Start or stop journaling calls. Off by default; entries already
    /// recorded are kept.
    pub fn record_calls(&self, enabled: bool) {
        self.inner.lock().journal = enabled;
    }

    /// Calls journaled so far, oldest first
    pub fn calls(&self) -> Vec<NativeCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Number of objects not yet torn down
    pub fn live_objects(&self) -> usize {
        self.inner.lock().objects.len()
    }
}

fn decode(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl LogStore for MemoryStore {
    fn open(&self, ident: Option<&CStr>, facility: Option<&CStr>, options: u32) -> Option<Token> {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Open {
            ident: ident.map(decode),
            facility: facility.map(decode),
            options,
        });
        if inner.refuse_allocations {
            return None;
        }
        inner.allocate(Object::Client)
    }

    fn new_query(&self) -> Option<Token> {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::NewQuery);
        if inner.refuse_allocations {
            return None;
        }
        inner.allocate(Object::Query(Vec::new()))
    }

    fn set_query(&self, query: Token, key: &CStr, value: Option<&CStr>, op: u32) {
        let mut inner = self.inner.lock();
        let predicate = StoredPredicate {
            key: decode(key),
            value: value.map(decode),
            op,
        };
        inner.record(|| NativeCall::SetQuery {
            query,
            key: predicate.key.clone(),
            value: predicate.value.clone(),
            op,
        });
        if let Some(Object::Query(predicates)) = inner.objects.get_mut(&query) {
            predicates.push(predicate);
        }
    }

    fn search(&self, client: Token, query: Token) -> Option<Token> {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Search { client, query });

        if !matches!(inner.objects.get(&client), Some(Object::Client)) {
            return None;
        }
        let matchers: Vec<Matcher> = match inner.objects.get(&query) {
            Some(Object::Query(predicates)) => predicates.iter().map(Matcher::new).collect(),
            _ => return None,
        };

        let results: VecDeque<Arc<Fields>> = inner
            .messages
            .iter()
            .filter(|fields| matchers.iter().all(|m| m.matches(fields)))
            .cloned()
            .collect();

        debug!("Search matched {} of {} messages", results.len(), inner.messages.len());
        inner.allocate(Object::Response(results))
    }

    fn next(&self, response: Token) -> Option<Token> {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Next { response });
        let fields = match inner.objects.get_mut(&response) {
            Some(Object::Response(pending)) => pending.pop_front()?,
            _ => return None,
        };
        inner.allocate(Object::Message {
            owner: response,
            fields,
        })
    }

    fn key(&self, message: Token, index: u32) -> Option<String> {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Key { message, index });
        let fields = inner.message(message)?;
        let index = usize::try_from(index).ok()?;
        fields.get(index).map(|(key, _)| key.clone())
    }

    fn get(&self, message: Token, key: &CStr) -> Option<String> {
        let mut inner = self.inner.lock();
        let key = decode(key);
        let value = inner
            .message(message)
            .and_then(|fields| lookup(fields, &key))
            .map(str::to_string);
        inner.record(|| NativeCall::Get { message, key });
        value
    }

    fn close(&self, token: Token) {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Close(token));
        inner.discard(token);
    }

    fn release(&self, token: Token) {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Release(token));
        inner.discard(token);
    }

    fn free(&self, token: Token) {
        let mut inner = self.inner.lock();
        inner.record(|| NativeCall::Free(token));
        inner.discard(token);
    }
}

fn lookup<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// One predicate prepared for evaluation against many messages
struct Matcher {
    key: String,
    value: Option<String>,
    op: QueryOp,
    // Set for REGEX predicates whose pattern compiled
    regex: Option<Regex>,
}

impl Matcher {
    fn new(predicate: &StoredPredicate) -> Self {
        let op = QueryOp::from_bits_retain(predicate.op);
        let regex = match (&predicate.value, op.contains(QueryOp::REGEX)) {
            (Some(pattern), true) => RegexBuilder::new(pattern)
                .case_insensitive(op.contains(QueryOp::CASEFOLD))
                .build()
                .ok(),
            _ => None,
        };
        Self {
            key: predicate.key.clone(),
            value: predicate.value.clone(),
            op,
            regex,
        }
    }

    fn matches(&self, fields: &Fields) -> bool {
        let comparison = self.op.comparison();
        let actual = lookup(fields, &self.key);

        let Some(expected) = self.value.as_deref() else {
            // Null value: presence test
            return match comparison {
                Comparison::NotEqual => actual.is_none(),
                _ => actual.is_some(),
            };
        };
        let Some(actual) = actual else {
            return comparison == Comparison::NotEqual;
        };

        if comparison == Comparison::True {
            return true;
        }

        if self.op.contains(QueryOp::REGEX) {
            // An invalid pattern matches nothing
            let Some(regex) = &self.regex else {
                return false;
            };
            let found = regex.is_match(actual);
            return if comparison == Comparison::NotEqual {
                !found
            } else {
                found
            };
        }

        if self.op.contains(QueryOp::NUMERIC) {
            let actual: i64 = parse_or_zero(actual);
            let expected: i64 = parse_or_zero(expected);
            return comparison.holds(actual.cmp(&expected));
        }

        let (actual, expected): (Cow<'_, str>, Cow<'_, str>) =
            if self.op.contains(QueryOp::CASEFOLD) {
                (actual.to_lowercase().into(), expected.to_lowercase().into())
            } else {
                (actual.into(), expected.into())
            };

        let affix = self.op & QueryOp::SUBSTRING;
        let found = if affix == QueryOp::SUBSTRING {
            Some(actual.contains(expected.as_ref()))
        } else if affix == QueryOp::PREFIX {
            Some(actual.starts_with(expected.as_ref()))
        } else if affix == QueryOp::SUFFIX {
            Some(actual.ends_with(expected.as_ref()))
        } else {
            None
        };

        match (found, comparison) {
            (Some(found), Comparison::Equal) => found,
            (Some(found), Comparison::NotEqual) => !found,
            _ => comparison.holds(actual.cmp(&expected)),
        }
    }
}
