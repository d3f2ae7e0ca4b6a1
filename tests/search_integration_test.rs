// Integration tests for client, filter and cursor against a fixture store

use aslkit::keys::{KEY_LEVEL, KEY_MSG, KEY_REF_PID, KEY_SENDER, KEY_TIME_NSEC};
use aslkit::store::NativeCall;
use aslkit::{
    AslError, Client, ClientOptions, Level, LogFields, MemoryStore, PredicateExpr, QueryFilter,
    QueryOp, SharedStore,
};
use std::path::Path;
use std::sync::Arc;

fn fixture_store() -> (Arc<MemoryStore>, SharedStore) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/records.json");
    let memory = Arc::new(MemoryStore::from_json_file(&path).unwrap().with_journal());
    let store: SharedStore = memory.clone();
    (memory, store)
}

fn default_client(store: &SharedStore) -> Client {
    Client::open(store, "", "", ClientOptions::empty()).unwrap()
}

#[test]
fn test_open_with_defaults() {
    let (memory, store) = fixture_store();
    let client = default_client(&store);

    assert_eq!(
        memory.calls()[0],
        NativeCall::Open {
            ident: None,
            facility: None,
            options: 0,
        }
    );
    client.close();
    assert_eq!(memory.live_objects(), 0);
}

#[test]
fn test_case_insensitive_substring_search() {
    let (_, store) = fixture_store();
    let client = default_client(&store);
    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate(KEY_MSG, "boot", QueryOp::SUBSTRING | QueryOp::CASEFOLD);

    let cursor = client.search(&filter);
    let messages: Vec<String> = cursor.records().map(|r| r.get(KEY_MSG)).collect();

    assert_eq!(messages.len(), 2);
    for message in &messages {
        assert!(message.to_lowercase().contains("boot"), "{}", message);
    }
    assert!(cursor.is_exhausted());

    cursor.release();
    filter.release();
    client.close();
}

#[test]
fn test_integer_value_adds_numeric() {
    let (memory, store) = fixture_store();
    let client = default_client(&store);
    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate(KEY_LEVEL, 3, QueryOp::EQUAL);

    let query = filter.handle().token();
    assert!(memory.calls().contains(&NativeCall::SetQuery {
        query,
        key: KEY_LEVEL.to_string(),
        value: Some("3".to_string()),
        op: (QueryOp::EQUAL | QueryOp::NUMERIC).bits(),
    }));

    let cursor = client.search(&filter);
    let senders: Vec<String> = cursor.records().map(|r| r.sender()).collect();
    assert_eq!(senders, vec!["backupd", "syslogd"]);
    assert!(cursor.records().next().is_none());
}

#[test]
fn test_numeric_range() {
    let (_, store) = fixture_store();
    let client = default_client(&store);

    let filter = QueryFilter::new(&store).unwrap();
    filter.add(&"Level>=5".parse::<PredicateExpr>().unwrap());
    filter.add(&"Level<6".parse::<PredicateExpr>().unwrap());
    let senders: Vec<String> = client.search(&filter).records().map(|r| r.sender()).collect();
    assert_eq!(senders, vec!["kernel"]);

    let filter = QueryFilter::new(&store).unwrap();
    filter.add(&"Level<=4".parse::<PredicateExpr>().unwrap());
    let cursor = client.search(&filter);
    let levels: Vec<Option<Level>> = cursor.records().map(|r| r.severity()).collect();
    assert_eq!(levels, vec![Some(Level::Error), Some(Level::Error)]);
}

#[test]
fn test_absent_value_tests_presence() {
    let (memory, store) = fixture_store();
    let client = default_client(&store);

    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate(KEY_REF_PID, None::<i64>, QueryOp::EQUAL);
    let query = filter.handle().token();
    assert!(memory.calls().contains(&NativeCall::SetQuery {
        query,
        key: KEY_REF_PID.to_string(),
        value: None,
        op: QueryOp::EQUAL.bits(),
    }));

    let cursor = client.search(&filter);
    let record = cursor.advance().unwrap();
    assert_eq!(record.sender(), "syslogd");
    assert_eq!(record.ref_pid(), 311);
    assert_eq!(record.ref_proc(), "backupd");
    assert!(cursor.advance().is_none());

    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate(KEY_REF_PID, None::<i64>, QueryOp::NOT_EQUAL);
    assert_eq!(client.search(&filter).records().count(), 3);
}

#[test]
fn test_time_without_nanoseconds_field() {
    let (_, store) = fixture_store();
    let client = default_client(&store);
    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate(KEY_SENDER, "backupd", QueryOp::EQUAL);

    let cursor = client.search(&filter);
    let record = cursor.advance().unwrap();
    assert!(!record.is_set(KEY_TIME_NSEC));
    assert_eq!(record.time().timestamp(), 1_700_000_003);
    assert_eq!(record.time().timestamp_subsec_nanos(), 0);
}

#[test]
fn test_time_with_nanoseconds_field() {
    let (_, store) = fixture_store();
    let client = default_client(&store);
    let filter = QueryFilter::new(&store).unwrap();
    filter.add(&"Sender=kernel".parse::<PredicateExpr>().unwrap());

    let record = client.search(&filter).advance().unwrap();
    assert_eq!(record.time().timestamp(), 1_700_000_000);
    assert_eq!(record.time().timestamp_subsec_nanos(), 250_000_000);
}

#[test]
fn test_prefix_and_regex() {
    let (_, store) = fixture_store();
    let client = default_client(&store);

    let filter = QueryFilter::new(&store).unwrap();
    filter.set_predicate("Facility", "com.apple", QueryOp::EQUAL | QueryOp::PREFIX);
    let senders: Vec<String> = client.search(&filter).records().map(|r| r.sender()).collect();
    assert_eq!(senders, vec!["backupd"]);

    let filter = QueryFilter::new(&store).unwrap();
    filter.add(&"Sender~^(kernel|syslogd)$".parse::<PredicateExpr>().unwrap());
    let senders: Vec<String> = client.search(&filter).records().map(|r| r.sender()).collect();
    assert_eq!(senders, vec!["kernel", "syslogd"]);
}

#[test]
fn test_refused_allocations() {
    let (memory, store) = fixture_store();
    let client = default_client(&store);
    memory.refuse_allocations(true);

    assert!(matches!(QueryFilter::new(&store), Err(AslError::QueryCreate)));
    assert!(matches!(
        Client::open(&store, "backupd", "daemon", ClientOptions::NO_DELAY),
        Err(AslError::ClientOpen { .. })
    ));

    memory.refuse_allocations(false);
    client.close();
}

#[test]
fn test_released_cursor_frees_records() {
    let (memory, store) = fixture_store();
    let client = default_client(&store);
    let filter = QueryFilter::new(&store).unwrap();

    let cursor = client.search(&filter);
    let records: Vec<_> = cursor.records().take(2).collect();
    assert_eq!(records.len(), 2);

    cursor.release();
    // Messages died with their response
    assert_eq!(records[0].get(KEY_MSG), "");
    assert!(records[0].keys().is_empty());

    filter.release();
    client.close();
    assert_eq!(memory.live_objects(), 0);
}
