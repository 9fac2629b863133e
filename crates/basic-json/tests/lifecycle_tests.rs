//! Tests for allocation strategies and the owning-handle lifecycle,
//! including every failure path.

use basic_json::lifecycle::{self, Owned};
use basic_json::{
    AllocError, Arena, Array, Context, Global, JsonError, JsonString, Kind, Object, Tracked, TypeError, Value,
};
use bumpalo::Bump;
use serde_json::json;
use std::mem::size_of;
use std::panic::{self, AssertUnwindSafe};

// ============================================================================
// Owned handles
// ============================================================================

#[test]
fn create_admits_and_drop_releases() {
    let tracked = Tracked::new();
    let owned = lifecycle::create(&tracked, String::from("payload")).unwrap();
    assert_eq!(*owned, "payload");
    assert_eq!(tracked.stats().allocs, 1);
    assert_eq!(tracked.stats().live_bytes, size_of::<String>());

    lifecycle::destroy(owned);
    let stats = tracked.stats();
    assert_eq!(stats.frees, 1);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.peak_bytes, size_of::<String>());
}

#[test]
fn owned_derefs_mutably() {
    let mut owned = lifecycle::create(&Global, vec![1, 2]).unwrap();
    owned.push(3);
    assert_eq!(*owned, vec![1, 2, 3]);
    assert_eq!(format!("{owned:?}"), "[1, 2, 3]");
}

#[test]
fn owned_remembers_its_strategy() {
    let tracked = Tracked::new();
    let owned: Owned<u64, Tracked> = lifecycle::create(&tracked, 7).unwrap();
    assert!(owned.allocator().shares_ledger(&tracked));
    assert!(!owned.allocator().shares_ledger(&Tracked::new()));
}

#[test]
fn failed_constructor_returns_storage() {
    let tracked = Tracked::new();
    let result: Result<Owned<String, Tracked>, JsonError> = lifecycle::create_with(&tracked, || {
        Err(TypeError::new(501, "constructor failed", Context::None).into())
    });

    let err = result.unwrap_err();
    assert_eq!(err.exception().unwrap().id(), 501);
    let stats = tracked.stats();
    assert_eq!(stats.allocs, 1);
    assert_eq!(stats.frees, 1);
    assert_eq!(stats.live_bytes, 0);
}

#[test]
fn panicking_constructor_returns_storage() {
    let tracked = Tracked::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        lifecycle::create_with(&tracked, || -> Result<String, AllocError> {
            panic!("constructor panicked")
        })
    }));

    assert!(outcome.is_err());
    let stats = tracked.stats();
    assert_eq!(stats.allocs, 1);
    assert_eq!(stats.frees, 1);
    assert_eq!(stats.live(), 0);
}

#[test]
fn refused_allocation_skips_constructor() {
    let tracked = Tracked::with_limit(0);
    let mut ran = false;
    let result = lifecycle::create_with(&tracked, || {
        ran = true;
        Ok::<_, AllocError>(String::new())
    });

    assert!(result.is_err());
    assert!(!ran);
    assert_eq!(tracked.stats().allocs, 0);
    assert_eq!(tracked.stats().refused, 1);
}

// ============================================================================
// Budgets
// ============================================================================

/// Helper: live bytes a one-letter string value costs under `Tracked`.
fn one_letter_cost() -> usize {
    let meter = Tracked::new();
    let _sample = Value::try_string_in("a", &meter).unwrap();
    meter.stats().live_bytes
}

#[test]
fn owned_payload_lives_in_strategy_storage() {
    let arena = Arena::new();
    let owned = lifecycle::create(&arena, [7_u64; 4]).unwrap();
    assert!(arena.contains(owned.as_ptr()));
    assert!(!Arena::new().contains(owned.as_ptr()));
}

#[test]
fn budget_refuses_past_limit() {
    let cost = one_letter_cost();
    assert!(cost > size_of::<JsonString<Tracked>>(), "string bytes are charged too");

    let tracked = Tracked::with_limit(cost);
    let first = Value::try_string_in("a", &tracked).unwrap();
    assert_eq!(tracked.stats().live_bytes, cost);

    let err = Value::try_string_in("b", &tracked).unwrap_err();
    assert_eq!(
        err,
        AllocError {
            requested: size_of::<JsonString<Tracked>>(),
        }
    );
    assert_eq!(tracked.stats().refused, 1);

    // Releasing the first string makes room again.
    drop(first);
    assert!(Value::try_string_in("c", &tracked).is_ok());
}

#[test]
fn scalars_ignore_the_budget() {
    let tracked = Tracked::with_limit(0);
    for kind in [Kind::Null, Kind::Boolean, Kind::Integer, Kind::Unsigned, Kind::Float] {
        assert!(Value::try_with_kind_in(kind, &tracked).is_ok());
    }
    for kind in [Kind::String, Kind::Array, Kind::Object] {
        assert!(Value::try_with_kind_in(kind, &tracked).is_err());
    }
}

#[test]
fn failed_clone_releases_partial_copy() {
    let tracked = Tracked::new();
    let original =
        Value::try_from_json_in(json!({"a": [1, 2, {"b": "x"}], "c": "y", "d": [[], []]}), &tracked)
            .unwrap();
    let used = tracked.stats().live_bytes;
    tracked.set_limit(Some(used + used / 2));

    let err = original.try_clone().unwrap_err();
    assert!(err.requested > 0);

    let stats = tracked.stats();
    assert_eq!(stats.refused, 1);
    assert_eq!(stats.live_bytes, used);
    assert_eq!(original.to_json(), json!({"a": [1, 2, {"b": "x"}], "c": "y", "d": [[], []]}));
}

#[test]
fn failed_json_import_releases_partial_value() {
    let tracked = Tracked::with_limit(64);
    let result = Value::try_from_json_in(json!(["a", "b", "c", "d"]), &tracked);

    assert!(result.is_err());
    assert_eq!(tracked.stats().live_bytes, 0);
}

#[test]
fn alloc_error_converts_into_json_error() {
    let tracked = Tracked::with_limit(0);
    let err: JsonError = Value::try_with_kind_in(Kind::Array, &tracked).unwrap_err().into();
    assert!(matches!(err, JsonError::Alloc(_)));
    assert!(err.exception().is_none());
    assert_eq!(
        err.to_string(),
        format!("cannot allocate {} bytes", size_of::<Array<Tracked>>())
    );
}

#[test]
#[should_panic(expected = "fatal allocation failure")]
fn infallible_clone_panics_on_refusal() {
    let tracked = Tracked::new();
    let original = Value::try_with_kind_in(Kind::Object, &tracked).unwrap();
    tracked.set_limit(Some(0));
    let _ = original.clone();
}

// ============================================================================
// Payload storage
// ============================================================================

#[test]
fn budget_sees_string_bytes() {
    let tracked = Tracked::with_limit(64);
    let text = "x".repeat(1 << 20);

    let err = Value::try_string_in(&text, &tracked).unwrap_err();
    assert_eq!(err, AllocError { requested: 1 << 20 });

    let stats = tracked.stats();
    assert_eq!(stats.refused, 1);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.allocs, stats.frees);
}

#[test]
fn budget_sees_element_buffers() {
    let tracked = Tracked::new();
    let mut list = Value::try_with_kind_in(Kind::Array, &tracked).unwrap();
    let node = tracked.stats().live_bytes;

    for n in 0..50_000_i64 {
        list.push(Value::from(n)).unwrap();
    }
    // Growing through the accessor goes to the same strategy.
    let items = list.get_mut_ptr::<Array<Tracked>>().unwrap();
    for n in 50_000..100_000_i64 {
        items.push(Value::from(n));
    }
    let stats = tracked.stats();
    assert!(stats.live_bytes >= node + 100_000 * size_of::<Value<Tracked>>());
    // Growth swapped buffers; only the node and the current buffer remain.
    assert!(stats.frees > 0);
    assert_eq!(stats.live(), 2);

    drop(list);
    assert_eq!(tracked.stats().live_bytes, 0);
}

#[test]
fn push_past_budget_is_refused() {
    let tracked = Tracked::new();
    let mut list = Value::try_with_kind_in(Kind::Array, &tracked).unwrap();
    tracked.set_limit(Some(tracked.stats().live_bytes + 1024));

    let mut pushed = 0_usize;
    let err = loop {
        match list.push(Value::from(pushed as u64)) {
            Ok(()) => pushed += 1,
            Err(err) => break err,
        }
    };
    assert!(matches!(err, JsonError::Alloc(_)));
    assert!(pushed * size_of::<Value<Tracked>>() <= 1024);
    assert_eq!(list.len(), pushed);
    assert_eq!(tracked.stats().refused, 1);
}

#[test]
fn object_keys_are_charged() {
    let tracked = Tracked::new();
    let mut doc = Value::try_with_kind_in(Kind::Object, &tracked).unwrap();
    doc.insert("k", Value::null()).unwrap();
    let short = tracked.stats().live_bytes;

    doc.insert("k", Value::from(1)).unwrap();
    assert_eq!(tracked.stats().live_bytes, short, "replacing allocates nothing");

    doc.insert("a much longer key than the first", Value::null()).unwrap();
    assert!(tracked.stats().live_bytes >= short + "a much longer key than the first".len());
}

#[test]
fn arena_serves_every_payload() {
    let arena = Arena::new();
    let value = Value::try_from_json_in(json!({"list": [1, 2, 3], "text": "hello arena"}), &arena).unwrap();

    let fields = value.get_ptr::<Object<Arena>>().unwrap();
    let text = fields["text"].get_ptr::<JsonString<Arena>>().unwrap();
    let items = fields["list"].get_ptr::<Array<Arena>>().unwrap();

    assert!(arena.contains(fields));
    assert!(arena.contains(text));
    assert!(arena.contains(text.as_ptr()));
    assert!(arena.contains(items.as_ptr()));
    assert!(!arena.contains(&value));
    assert!(value.allocator().unwrap().shares_arena(&arena));
    assert_eq!(value.to_json(), json!({"list": [1, 2, 3], "text": "hello arena"}));
}

#[test]
fn arena_outlives_its_handle() {
    let value = {
        let arena = Arena::with_capacity(4096);
        let mut list = Value::try_with_kind_in(Kind::Array, &arena).unwrap();
        list.push(Value::try_string_in("kept alive", &arena).unwrap()).unwrap();
        list
    };
    assert_eq!(value.to_json(), json!(["kept alive"]));
    assert!(value.allocator().unwrap().allocated_bytes() >= 4096);
}

#[test]
fn borrowed_bump_is_a_strategy() {
    let bump = Bump::new();
    let mut list = Value::try_with_kind_in(Kind::Array, &&bump).unwrap();
    list.push(Value::try_string_in("in the bump", &&bump).unwrap()).unwrap();

    let copy = list.try_clone().unwrap();
    assert_eq!(copy.to_json(), json!(["in the bump"]));
    assert!(bump.allocated_bytes() > 0);
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn stats_track_peak_and_live() {
    let tracked = Tracked::new();
    let a = Value::try_with_kind_in(Kind::Array, &tracked).unwrap();
    let b = Value::try_with_kind_in(Kind::Object, &tracked).unwrap();
    let peak = tracked.stats().live_bytes;
    drop(a);
    drop(b);

    let stats = tracked.stats();
    assert_eq!(stats.peak_bytes, peak);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.live(), 0);
    assert!(stats.to_string().starts_with("allocs: 2  frees: 2  refused: 0  live: 0"));
}

#[test]
fn clones_share_one_ledger() {
    let tracked = Tracked::new();
    let handle = tracked.clone();
    assert!(handle.shares_ledger(&tracked));

    let _value = Value::try_with_kind_in(Kind::String, &handle).unwrap();
    assert_eq!(tracked.stats().allocs, 1);
    assert_eq!(tracked.limit(), None);
}
