// Query module - Predicate filters for searches

mod expr;
mod ops;
mod value;

pub use expr::PredicateExpr;
pub use ops::{Comparison, QueryOp};
pub use value::Value;

use crate::error::{AslError, Result};
use crate::handle::{to_c_string, Handle, HandleKind};
use crate::store::SharedStore;
use tracing::{debug, trace};

/// A conjunctive set of key/operator/value predicates.
///
/// Predicates can only be added. Their order has no effect on the search.
#[derive(Debug)]
pub struct QueryFilter {
    handle: Handle,
}

impl QueryFilter {
    /// Allocate an empty filter on `store`
    pub fn new(store: &SharedStore) -> Result<Self> {
        let handle = Handle::acquire(HandleKind::Query, store, |s| s.new_query())
            .ok_or(AslError::QueryCreate)?;
        debug!("Created query {:#x}", handle.token().as_raw());
        Ok(Self { handle })
    }

    /// Add a predicate.
    ///
    /// Numeric values always get [`QueryOp::NUMERIC`] added to `op`. An
    /// absent value is submitted as a null value, turning the predicate into a
    /// test for the key's presence (or absence, with `NOT_EQUAL`).
    pub fn set_predicate<V: Into<Value>>(&self, key: &str, value: V, op: QueryOp) {
        let value = value.into();
        let op = if value.is_numeric() {
            op | QueryOp::NUMERIC
        } else {
            op
        };

        let c_key = to_c_string(key);
        let c_value = value.render().map(|v| to_c_string(&v));

        trace!(
            "Query {:#x}: {} {:#x} {:?}",
            self.handle.token().as_raw(),
            key,
            op.bits(),
            c_value
        );
        self.handle.with_lock(|store, query| {
            store.set_query(query, &c_key, c_value.as_deref(), op.bits())
        });
    }

    /// Add a parsed predicate expression
    pub fn add(&self, expr: &PredicateExpr) {
        self.set_predicate(&expr.key, expr.value.clone(), expr.op);
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn release(self) {
        self.handle.release();
    }

    /// Free the query through the legacy free call
    pub fn free(self) {
        self.handle.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NativeCall};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn filter() -> (Arc<MemoryStore>, QueryFilter) {
        let memory = Arc::new(MemoryStore::new().with_journal());
        let store: SharedStore = memory.clone();
        let filter = QueryFilter::new(&store).unwrap();
        memory.clear_calls();
        (memory, filter)
    }

    fn submitted(memory: &MemoryStore) -> Vec<(String, Option<String>, u32)> {
        memory
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                NativeCall::SetQuery { key, value, op, .. } => Some((key, value, op)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_integer_value_adds_numeric() {
        let (memory, filter) = filter();
        filter.set_predicate("Level", 3, QueryOp::EQUAL);

        assert_eq!(
            submitted(&memory),
            vec![(
                "Level".to_string(),
                Some("3".to_string()),
                (QueryOp::EQUAL | QueryOp::NUMERIC).bits()
            )]
        );
    }

    #[test]
    fn test_absent_value_submits_null() {
        let (memory, filter) = filter();
        filter.set_predicate("RefPID", Value::Absent, QueryOp::EQUAL);
        filter.set_predicate("RefProc", None::<&str>, QueryOp::NOT_EQUAL);

        assert_eq!(
            submitted(&memory),
            vec![
                ("RefPID".to_string(), None, QueryOp::EQUAL.bits()),
                ("RefProc".to_string(), None, QueryOp::NOT_EQUAL.bits()),
            ]
        );
    }

    #[test]
    fn test_text_value_keeps_flags() {
        let (memory, filter) = filter();
        filter.set_predicate(
            "Message",
            "boot",
            QueryOp::SUBSTRING | QueryOp::CASEFOLD,
        );

        assert_eq!(
            submitted(&memory),
            vec![("Message".to_string(), Some("boot".to_string()), 0x70)]
        );
    }

    #[test]
    fn test_numeric_text_is_not_numeric() {
        let (memory, filter) = filter();
        filter.set_predicate("Level", "3", QueryOp::EQUAL);
        assert_eq!(submitted(&memory)[0].2, QueryOp::EQUAL.bits());
    }

    #[test]
    fn test_add_expression() {
        let (memory, filter) = filter();
        let expr: PredicateExpr = "Level<=4".parse().unwrap();
        filter.add(&expr);

        assert_eq!(
            submitted(&memory),
            vec![(
                "Level".to_string(),
                Some("4".to_string()),
                (QueryOp::LESS_EQUAL | QueryOp::NUMERIC).bits()
            )]
        );
    }

    #[test]
    fn test_new_failure() {
        let memory = Arc::new(MemoryStore::new());
        memory.refuse_allocations(true);
        let store: SharedStore = memory;
        assert!(matches!(QueryFilter::new(&store), Err(AslError::QueryCreate)));
    }

    #[test]
    fn test_release_and_free_are_distinct() {
        let (memory, released) = filter();
        let store: SharedStore = memory.clone();
        let freed = QueryFilter::new(&store).unwrap();
        let (a, b) = (released.handle().token(), freed.handle().token());
        memory.clear_calls();

        released.release();
        freed.free();
        assert_eq!(memory.calls(), vec![NativeCall::Release(a), NativeCall::Free(b)]);
    }

    fn any_numeric() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i8>().prop_map(Value::from),
            any::<i16>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<u8>().prop_map(Value::from),
            any::<u32>().prop_map(Value::from),
            any::<u64>().prop_map(Value::from),
            any::<usize>().prop_map(Value::from),
            any::<f32>().prop_map(Value::from),
            any::<f64>().prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn prop_numeric_values_always_numeric(value in any_numeric(), bits in any::<u32>()) {
            let (memory, filter) = filter();
            filter.set_predicate("PID", value, QueryOp::from_bits_retain(bits));

            let calls = submitted(&memory);
            prop_assert_eq!(calls.len(), 1);
            prop_assert!(QueryOp::from_bits_retain(calls[0].2).contains(QueryOp::NUMERIC));
            // Caller bits are kept
            prop_assert_eq!(calls[0].2 & bits, bits);
        }

        #[test]
        fn prop_absent_value_never_rendered(bits in any::<u32>(), key in "[A-Za-z]{1,12}") {
            let (memory, filter) = filter();
            filter.set_predicate(&key, Value::Absent, QueryOp::from_bits_retain(bits));

            let calls = submitted(&memory);
            prop_assert_eq!(calls[0].1.clone(), None);
            prop_assert_eq!(calls[0].2, bits);
        }
    }
}
