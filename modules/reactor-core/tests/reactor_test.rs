//! Integration tests for single-reactor dispatch, subscriptions and action
//! creators (literal, sync resolver, async resolver).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reactor_core::{create_reactor, Action, ActionKind, ReactorError, Reactor, ReducerMap};

// ---------------------------------------------------------------------------
// Test state and actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum CounterAction {
    Increment,
    Decrement,
    Explode,
    // Declared by the kind enum but never given a reducer.
    Unused,
}

impl ActionKind for CounterAction {
    fn name(&self) -> &'static str {
        match self {
            CounterAction::Increment => "increment",
            CounterAction::Decrement => "decrement",
            CounterAction::Explode => "explode",
            CounterAction::Unused => "unused",
        }
    }
}

use CounterAction::*;

fn counter_reducers() -> ReducerMap<Counter, CounterAction, i64> {
    ReducerMap::builder()
        .on(Increment, |s: &Counter, p: &i64| Counter {
            value: s.value + p,
        })
        .on(Decrement, |s: &Counter, p: &i64| Counter {
            value: s.value - p,
        })
        .try_on(Explode, |_: &Counter, p: &i64| {
            anyhow::bail!("refusing to explode by {p}")
        })
        .build()
        .unwrap()
}

fn counter() -> Reactor<Counter, CounterAction, i64> {
    create_reactor("counter", Counter { value: 0 }, counter_reducers(), vec![])
}

/// Subscribe and collect every observed value.
fn record_values(reactor: &Reactor<Counter, CounterAction, i64>) -> Arc<Mutex<Vec<i64>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    reactor.subscribe(move |state| sink.lock().push(state.value));
    seen
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn literal_then_async_payload() {
    let counter = counter();

    counter.actions()[Increment].send(5).unwrap();
    assert_eq!(*counter.get_state(), Counter { value: 5 });

    counter.actions()[Increment]
        .resolve(|_| async { anyhow::Ok(3i64) })
        .await
        .unwrap();
    assert_eq!(*counter.get_state(), Counter { value: 8 });
}

#[test]
fn unknown_kind_is_a_noop() {
    let counter = counter();
    counter.actions()[Increment].send(2).unwrap();
    let seen = record_values(&counter);
    let before = counter.get_state();

    counter.dispatch(Action::new(Unused, 100)).unwrap();

    assert!(Arc::ptr_eq(&before, &counter.get_state()));
    assert!(seen.lock().is_empty());
    assert!(!counter.recognizes(Unused));
    assert!(counter.actions().get(Unused).is_none());
}

#[test]
fn creators_generated_for_declared_kinds_only() {
    let counter = counter();
    let kinds: Vec<_> = counter.actions().iter().map(|creator| creator.kind()).collect();

    assert_eq!(kinds, vec![Increment, Decrement, Explode]);
    assert_eq!(counter.actions().len(), 3);
    assert!(!counter.actions().contains(Unused));
}

#[test]
fn subscriber_sees_every_commit_in_order() {
    let counter = counter();
    let seen = record_values(&counter);

    counter.actions()[Increment].send(1).unwrap();
    counter.actions()[Increment].send(2).unwrap();
    counter.actions()[Decrement].send(4).unwrap();
    counter.dispatch(Action::new(Increment, 10)).unwrap();

    assert_eq!(*seen.lock(), vec![1, 3, -1, 9]);
}

#[test]
fn unsubscribed_callback_is_silent() {
    let counter = counter();
    let calls = Arc::new(AtomicUsize::new(0));
    let sub = {
        let calls = calls.clone();
        counter.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    counter.actions()[Increment].send(1).unwrap();
    assert!(sub.unsubscribe());
    counter.actions()[Increment].send(1).unwrap();
    counter.actions()[Decrement].send(1).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(counter.get_state().value, 1);
}

#[test]
fn same_callback_subscribed_twice_is_two_registrations() {
    let counter = counter();
    let calls = Arc::new(AtomicUsize::new(0));
    let callback = {
        let calls = calls.clone();
        move |_: &Arc<Counter>| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    };

    let first = counter.subscribe(callback.clone());
    let _second = counter.subscribe(callback);
    counter.actions()[Increment].send(1).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    first.unsubscribe();
    counter.actions()[Increment].send(1).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn determinism_from_same_state() {
    let a = counter();
    let b = counter();
    for reactor in [&a, &b] {
        reactor.actions()[Increment].send(4).unwrap();
        reactor.actions()[Decrement].send(1).unwrap();
    }
    assert_eq!(*a.get_state(), *b.get_state());
}

#[test]
fn reducer_failure_leaves_state_and_subscribers_untouched() {
    let counter = counter();
    counter.actions()[Increment].send(7).unwrap();
    let seen = record_values(&counter);

    let err = counter.actions()[Explode].send(1).unwrap_err();

    match err {
        ReactorError::Reducer { reactor, kind, .. } => {
            assert_eq!(reactor, "counter");
            assert_eq!(kind, "explode");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(counter.get_state().value, 7);
    assert!(seen.lock().is_empty());
}

#[test]
fn sync_resolver_reads_live_state() {
    let counter = counter();
    counter.actions()[Increment].send(3).unwrap();

    // Double the current value.
    counter.actions()[Increment]
        .send_with(|store| Ok(store.get_state().value))
        .unwrap();

    assert_eq!(counter.get_state().value, 6);
}

#[tokio::test]
async fn async_resolver_dispatches_exactly_once() {
    let counter = counter();
    let seen = record_values(&counter);

    counter.actions()[Increment]
        .resolve(|_| async {
            tokio::task::yield_now().await;
            anyhow::Ok(5i64)
        })
        .await
        .unwrap();

    assert_eq!(counter.get_state().value, 5);
    assert_eq!(*seen.lock(), vec![5]);
}

#[tokio::test]
async fn failing_resolver_dispatches_nothing() {
    let counter = counter();
    let seen = record_values(&counter);

    let err = counter.actions()[Increment]
        .resolve(|_| async { Err::<i64, _>(anyhow::anyhow!("offline")) })
        .await
        .unwrap_err();

    assert!(matches!(err, ReactorError::Resolver { kind: "increment", .. }));
    assert_eq!(err.to_string(), "resolver for `increment` failed: offline");
    assert_eq!(counter.get_state().value, 0);
    assert!(seen.lock().is_empty());

    let err = counter.actions()[Decrement]
        .send_with(|_| anyhow::bail!("no payload"))
        .unwrap_err();
    assert!(matches!(err, ReactorError::Resolver { kind: "decrement", .. }));
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn later_sync_dispatch_can_overtake_pending_resolver() {
    let counter = counter();
    let seen = record_values(&counter);
    let (release, gate) = tokio::sync::oneshot::channel::<()>();
    let observed_before = Arc::new(Mutex::new(None));

    let creator = counter.actions()[Increment].clone();
    let observed = observed_before.clone();
    let pending = tokio::spawn(async move {
        creator
            .resolve(|store| async move {
                *observed.lock() = Some(store.get_state().value);
                gate.await?;
                // Re-reading picks up whatever landed meanwhile.
                anyhow::Ok(store.get_state().value * 10)
            })
            .await
    });

    // Let the resolver start and park on the gate.
    tokio::task::yield_now().await;
    assert_eq!(*observed_before.lock(), Some(0));

    counter.actions()[Increment].send(2).unwrap();
    release.send(()).unwrap();
    pending.await.unwrap().unwrap();

    assert_eq!(*seen.lock(), vec![2, 22]);
    assert_eq!(counter.get_state().value, 22);
}

#[test]
fn subscriber_may_dispatch_reentrantly() {
    let counter = counter();
    let seen = record_values(&counter);

    // Clamp anything above 10 back down.
    let handle = counter.clone();
    counter.subscribe(move |state| {
        if state.value > 10 {
            handle.actions()[Decrement].send(state.value - 10).unwrap();
        }
    });

    counter.actions()[Increment].send(15).unwrap();

    assert_eq!(counter.get_state().value, 10);
    // The nested commit notifies everyone before the outer round finishes.
    assert_eq!(*seen.lock(), vec![15, 10]);
}

#[test]
fn nested_dispatch_ahead_of_recorder_never_delivers_stale_state() {
    let counter = counter();

    let clamp_seen = Arc::new(Mutex::new(Vec::new()));
    {
        let handle = counter.clone();
        let clamp_seen = clamp_seen.clone();
        counter.subscribe(move |state| {
            clamp_seen.lock().push(state.value);
            if state.value > 10 {
                handle.actions()[Decrement].send(state.value - 10).unwrap();
            }
        });
    }
    let seen = record_values(&counter);

    counter.actions()[Increment].send(15).unwrap();

    let current = counter.get_state().value;
    assert_eq!(current, 10);
    assert_eq!(*clamp_seen.lock(), vec![15, 10]);
    // The outer round stops once the nested commit has notified everyone.
    assert_eq!(*seen.lock(), vec![10]);
    assert_eq!(clamp_seen.lock().last(), Some(&current));
    assert_eq!(seen.lock().last(), Some(&current));
}

#[test]
fn subscriber_unsubscribed_mid_round_is_not_called() {
    let counter = counter();
    let victim: Arc<Mutex<Option<reactor_core::Subscription>>> = Arc::default();
    {
        let victim = victim.clone();
        counter.subscribe(move |_| {
            if let Some(sub) = victim.lock().as_ref() {
                sub.unsubscribe();
            }
        });
    }
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = calls.clone();
        let sub = counter.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        *victim.lock() = Some(sub);
    }

    counter.actions()[Increment].send(1).unwrap();
    counter.actions()[Increment].send(1).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(counter.get_state().value, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatches_commit_in_order() {
    let counter = counter();
    let seen = record_values(&counter);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let counter = counter.clone();
            tokio::spawn(async move { counter.actions()[Increment].send(1) })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap().unwrap();
    }

    assert_eq!(counter.get_state().value, 50);
    assert_eq!(*seen.lock(), (1..=50).collect::<Vec<_>>());
}

#[tokio::test]
async fn many_resolvers_each_dispatch_once() {
    let counter = counter();
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = calls.clone();
        counter.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    let creator = &counter.actions()[Increment];
    let resolutions = (1..=10i64).map(|n| {
        creator.resolve(move |_| async move {
            tokio::task::yield_now().await;
            anyhow::Ok(n)
        })
    });
    for result in futures::future::join_all(resolutions).await {
        result.unwrap();
    }

    assert_eq!(counter.get_state().value, 55);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}
