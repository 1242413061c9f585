//! End-to-end invocation through the process-wide registry

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use dynacall_callback::{bind_args, placeholders::*, Callback, VariadicShape};
use dynacall_error::CallbackError;
use dynacall_value::{values, Value, ValueList};
use parking_lot::Mutex;
use proptest::prelude::*;

static WAS_CALLED: AtomicUsize = AtomicUsize::new(0);
static RESULT: AtomicI32 = AtomicI32::new(0);

fn static_void_no_args() {
    WAS_CALLED.fetch_add(1, Ordering::SeqCst);
}

fn static_int_no_args() -> i32 {
    42
}

fn static_void_with_args(a: i32, b: i32) {
    RESULT.store(a + b, Ordering::SeqCst);
}

fn add(a: i32, b: i32) -> i32 {
    a + b
}

fn digits(a: i64, b: i64, c: i64) -> i64 {
    a * 100 + b * 10 + c
}

#[test]
fn test_calling_void_static_no_arguments() {
    let before = WAS_CALLED.load(Ordering::SeqCst);
    let result = Callback::from_fn(static_void_no_args).call(&[]);
    assert!(result.is_valid());
    assert!(result.is_void());
    assert_eq!(WAS_CALLED.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_calling_int_static_no_arguments() {
    let result = Callback::from_fn(static_int_no_args).call(&[]);
    assert_eq!(result.to::<i32>(), Some(42));
}

#[test]
fn test_calling_void_static_with_arguments() {
    Callback::from_fn(static_void_with_args).call(&values![3, 4]);
    assert_eq!(RESULT.load(Ordering::SeqCst), 7);
}

#[test]
fn test_calling_int_static_with_arguments() {
    let result = Callback::from_fn(add).call(&values![3, 4]);
    assert_eq!(result.to::<i32>(), Some(7));
}

#[test]
fn test_excess_bound_arguments_are_rejected_at_call_time() {
    let bound = Callback::from_fn(add).bind(bind_args![2, 3, 4]);
    assert!(bound.is_valid());
    assert!(!bound.call(&[]).is_valid());
    assert_eq!(bound.try_call(&[]), Err(CallbackError::arity(2, 3)));
}

#[test]
fn test_fully_bound_literals_ignore_call_arguments() {
    let bound = Callback::from_fn(add).bind(bind_args![2, 3]);
    assert_eq!(bound.argument_count(), Some(0));
    assert_eq!(bound.try_call(&values![4]).map(|v| v.to::<i32>()), Ok(Some(5)));
    assert_eq!(bound.call(&[]).to::<i32>(), Some(5));
}

#[test]
fn test_string_arguments_are_coerced() {
    let result = Callback::from_fn(add).call(&values!["5", "4"]);
    assert_eq!(result.to::<i32>(), Some(9));
}

#[test]
fn test_unconvertible_argument_does_not_invoke() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let cb = Callback::from_fn(move |a: i32| {
        counter.fetch_add(1, Ordering::SeqCst);
        a
    });

    assert!(!cb.call(&values!["not a number"]).is_valid());
    assert!(!cb.call(&values![1, 2]).is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(cb.call(&values![5]).to::<i32>(), Some(5));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_void_is_distinct_from_failure() {
    let sink = Arc::new(AtomicI32::new(0));
    let store = sink.clone();
    let cb = Callback::from_fn(move |a: i32, b: i32| store.store(a + b, Ordering::SeqCst));
    let ran = cb.call(&values![1, 1]);
    let failed = cb.call(&values![1]);
    assert_eq!(sink.load(Ordering::SeqCst), 2);
    assert!(ran.is_valid() && ran.is_void());
    assert!(!failed.is_valid() && !failed.is_void());
}

#[test]
fn test_target_may_return_invalid() {
    let cb = Callback::from_fn(|| Value::invalid());
    assert_eq!(cb.try_call(&[]).map(|v| v.is_valid()), Ok(false));
}

#[test]
fn test_invalid_callback_has_no_side_effect() {
    let cb = Callback::invalid();
    let args = values![1, "x", true];
    assert!(!cb.call(&args).is_valid());
    assert!(!cb.bind(bind_args![_1]).call(&args).is_valid());
    assert_eq!(cb.try_call(&[]), Err(CallbackError::InvalidTarget));
    assert_eq!(args.len(), 3);
}

#[test]
fn test_variadic_collects_arguments() {
    let cb = Callback::variadic(|args: ValueList| args.len());
    let result = cb.call(&values![1, true, "x"]);
    assert_eq!(result.to::<usize>(), Some(3));
    assert_eq!(cb.signature().and_then(|s| s.variadic), Some(VariadicShape::NoExtra));
}

#[test]
fn test_variadic_leading_extra_from_binding() {
    let seen: Arc<Mutex<Option<(i32, usize)>>> = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let cb = Callback::variadic_leading(move |num: i32, rest: ValueList| {
        *sink.lock() = Some((num, rest.len()));
    });

    let bound = cb.bind(bind_args![456]);
    let result = bound.call(&values![1, true, "x"]);
    assert!(result.is_void());
    assert_eq!(*seen.lock(), Some((456, 3)));
}

#[test]
fn test_variadic_trailing_extra() {
    let cb = Callback::variadic_trailing(|rest: ValueList, sep: String| {
        rest.iter()
            .filter_map(|v| v.to::<String>())
            .collect::<Vec<_>>()
            .join(&sep)
    });
    let result = cb.call(&values!["a", "b", "c", "-"]);
    assert_eq!(result.to::<String>().as_deref(), Some("a-b-c"));
    assert!(!cb.call(&[]).is_valid());
}

#[test]
fn test_method_callbacks() {
    struct Account {
        balance: i64,
    }

    impl Account {
        fn balance(&self) -> i64 {
            self.balance
        }

        fn deposit(&mut self, amount: i64) -> i64 {
            self.balance += amount;
            self.balance
        }
    }

    let shared = Arc::new(Account { balance: 10 });
    let read = Callback::from_method(&shared, Account::balance);
    assert_eq!(read.call(&[]).to::<i64>(), Some(10));

    let locked = Arc::new(Mutex::new(Account { balance: 0 }));
    let deposit = Callback::from_method_mut(&locked, Account::deposit);
    deposit.call(&values![5]);
    assert_eq!(deposit.call(&values!["7"]).to::<i64>(), Some(12));
    assert_eq!(locked.lock().balance, 12);

    drop(shared);
    assert!(!read.call(&[]).is_valid());
    assert!(matches!(read.try_call(&[]), Err(CallbackError::InstanceDropped(_))));
}

#[test]
fn test_reentrant_mutating_method_fails_instead_of_deadlocking() {
    struct Node {
        visits: u32,
        again: Option<Callback>,
    }

    impl Node {
        fn visit(&mut self) -> bool {
            self.visits += 1;
            let again = self.again.clone().unwrap_or_default();
            matches!(again.try_call(&[]), Err(CallbackError::InstanceBusy(_)))
        }
    }

    let node = Arc::new(Mutex::new(Node { visits: 0, again: None }));
    let visit = Callback::from_method_mut(&node, Node::visit);
    node.lock().again = Some(visit.clone());

    assert_eq!(visit.call(&[]).to::<bool>(), Some(true));
    assert_eq!(visit.call(&[]).to::<bool>(), Some(true));
    assert_eq!(node.lock().visits, 2);
}

#[test]
fn test_callbacks_as_handler_list() {
    fn on_a() {}
    fn on_b() {}

    let mut handlers = vec![Callback::from_fn(on_a), Callback::from_fn(on_b)];
    let to_remove = Callback::from_fn(on_a);
    handlers.retain(|cb| *cb != to_remove);
    assert_eq!(handlers, vec![Callback::from_fn(on_b)]);
}

#[test]
fn test_concurrent_invocation_of_shared_callback() {
    let cb = Callback::from_fn(add).bind(bind_args![_1, 1]);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cb = cb.clone();
            std::thread::spawn(move || cb.call(&values![i]).to::<i32>())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Some(1), Some(2), Some(3), Some(4)]);
}

proptest! {
    #[test]
    fn prop_direct_call_matches_target(a in any::<i16>(), b in any::<i16>()) {
        let (a, b) = (i32::from(a), i32::from(b));
        let result = Callback::from_fn(add).call(&values![a, b]);
        prop_assert_eq!(result.to::<i32>(), Some(add(a, b)));
    }

    #[test]
    fn prop_left_prepend(a in -9_i64..10, b in -9_i64..10, c in -9_i64..10) {
        let cb = Callback::from_fn(digits);
        let bound = cb.bind(bind_args![a, b]).call(&values![c]);
        prop_assert_eq!(bound.to::<i64>(), cb.call(&values![a, b, c]).to::<i64>());
    }

    #[test]
    fn prop_placeholder_reversal(a in any::<i32>(), b in any::<i32>(), c in any::<i32>()) {
        let (a, b, c) = (i64::from(a), i64::from(b), i64::from(c));
        let cb = Callback::from_fn(digits);
        let reversed = cb.bind(bind_args![_3, _2, _1]).call(&values![a, b, c]);
        prop_assert_eq!(reversed.to::<i64>(), Some(digits(c, b, a)));
    }

    #[test]
    fn prop_mixed_literal_and_placeholder(a in any::<i32>(), b in any::<i32>()) {
        let (a, b) = (i64::from(a), i64::from(b));
        let cb = Callback::from_fn(digits);
        let mixed = cb.bind(bind_args![_2, 3_i64, _1]).call(&values![a, b]);
        prop_assert_eq!(mixed.to::<i64>(), cb.call(&values![b, 3_i64, a]).to::<i64>());
    }
}
