use super::LogFields;
use crate::handle::{to_c_string, Handle, HandleKind};
use crate::store::{SharedStore, Token};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One search result, read key by key.
///
/// Each [`super::SearchCursor::advance`] returns a fresh record. The record
/// stays readable until it is released or the cursor that produced it is
/// released.
#[derive(Debug)]
pub struct Record {
    handle: Handle,
}

impl Record {
    pub(crate) fn new(store: &SharedStore, message: Token) -> Self {
        Self {
            handle: Handle::wrap(HandleKind::Message, store, message),
        }
    }

    /// The key at `index` in the store's enumeration order, or an empty
    /// string past the last key
    pub fn key_at(&self, index: usize) -> String {
        let Ok(index) = u32::try_from(index) else {
            return String::new();
        };
        self.handle
            .with_lock(|store, message| store.key(message, index))
            .unwrap_or_default()
    }

    /// All keys, probing [`Record::key_at`] until the first empty result.
    ///
    /// A record whose first key is empty reports no keys.
    pub fn keys(&self) -> Vec<String> {
        (0..)
            .map(|index| self.key_at(index))
            .take_while(|key| !key.is_empty())
            .collect()
    }

    /// Value of `key`.
    ///
    /// An empty string means the key is absent or set to an empty value; use
    /// [`Record::is_set`] to tell the two apart.
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    /// Whether `key` is present, even with an empty value
    pub fn is_set(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let c_key = to_c_string(key);
        self.handle
            .with_lock(|store, message| store.get(message, &c_key))
    }

    /// Copy every field into an owned [`Entry`]
    pub fn to_entry(&self) -> Entry {
        let fields = self
            .keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect();
        Entry { fields }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Drop one reference to the message. Records are also reclaimed when
    /// the cursor that produced them is released.
    pub fn release(self) {
        self.handle.release();
    }

    /// Free the message through the legacy free call
    pub fn free(self) {
        self.handle.free();
    }
}

impl LogFields for Record {
    fn field(&self, key: &str) -> String {
        self.get(key)
    }
}

/// Owned copy of a record's fields, in the store's key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of `key`, `None` when the key is absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl LogFields for Entry {
    fn field(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}

// Serialized as a JSON object that keeps the key order
impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LogStore, MemoryStore, NativeCall};
    use std::sync::Arc;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Fetch the first message of a match-all search
    fn first_record(messages: Vec<Vec<(String, String)>>) -> (Arc<MemoryStore>, Record) {
        let memory = Arc::new(MemoryStore::with_messages(messages).with_journal());
        let store: SharedStore = memory.clone();
        let client = memory.open(None, None, 0).unwrap();
        let query = memory.new_query().unwrap();
        let response = memory.search(client, query).unwrap();
        let message = memory.next(response).unwrap();
        (memory, Record::new(&store, message))
    }

    #[test]
    fn test_keys_in_store_order() {
        let (_, record) = first_record(vec![fields(&[
            ("Time", "1700000000"),
            ("Sender", "kernel"),
            ("Message", "boot"),
        ])]);

        assert_eq!(record.keys(), vec!["Time", "Sender", "Message"]);
        assert_eq!(record.key_at(1), "Sender");
        assert_eq!(record.key_at(3), "");
        assert_eq!(record.key_at(usize::MAX), "");
    }

    #[test]
    fn test_keys_stop_at_first_empty_key() {
        let (_, record) = first_record(vec![fields(&[
            ("Sender", "kernel"),
            ("", "hidden"),
            ("Message", "after the gap"),
        ])]);

        assert_eq!(record.keys(), vec!["Sender"]);
    }

    #[test]
    fn test_get_and_is_set() {
        let (_, record) = first_record(vec![fields(&[("Sender", "kernel"), ("Message", "")])]);

        assert_eq!(record.get("Sender"), "kernel");
        // Present-but-empty and absent look the same through get
        assert_eq!(record.get("Message"), "");
        assert_eq!(record.get("Host"), "");
        assert!(record.is_set("Message"));
        assert!(!record.is_set("Host"));
    }

    #[test]
    fn test_typed_accessors_read_through_store() {
        let (_, record) = first_record(vec![fields(&[
            ("Time", "1700000000"),
            ("PID", "88"),
            ("Level", "5"),
            ("UID", "not-a-number"),
        ])]);

        assert_eq!(record.time().timestamp(), 1_700_000_000);
        assert_eq!(record.pid(), 88);
        assert_eq!(record.level(), 5);
        assert_eq!(record.uid(), 0);
        assert_eq!(record.gid(), 0);
    }

    #[test]
    fn test_to_entry() {
        let (_, record) = first_record(vec![fields(&[("Sender", "kernel"), ("Level", "3")])]);
        let entry = record.to_entry();

        assert_eq!(entry.len(), 2);
        assert_eq!(entry.get("Sender"), Some("kernel"));
        assert_eq!(entry.get("Host"), None);
        assert_eq!(entry.level(), 3);
        assert_eq!(entry.keys().collect::<Vec<_>>(), vec!["Sender", "Level"]);
    }

    #[test]
    fn test_entry_serializes_in_key_order() {
        let entry = Entry::new(fields(&[("Time", "1"), ("Sender", "kernel"), ("Level", "3")]));
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"Time":"1","Sender":"kernel","Level":"3"}"#);
    }

    #[test]
    fn test_release_and_free() {
        let (memory, record) = first_record(vec![fields(&[("Sender", "a")])]);
        let token = record.handle().token();
        record.release();
        assert_eq!(memory.calls().last(), Some(&NativeCall::Release(token)));

        let (memory, record) = first_record(vec![fields(&[("Sender", "b")])]);
        let token = record.handle().token();
        record.free();
        assert_eq!(memory.calls().last(), Some(&NativeCall::Free(token)));
    }
}
