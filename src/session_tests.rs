//! Tests for session synchronization.

use super::*;
use crate::error::QueueError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_result_propagates_unchanged() {
    let sync = SessionSynchronizer::new();

    let result: Result<i32, QueueError> = sync.atomically(|| Ok(42));
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_error_propagates_unchanged() {
    let sync = SessionSynchronizer::new();

    let result: Result<(), QueueError> = sync.atomically(|| {
        Err(QueueError::Provider {
            provider: "artemis".to_string(),
            message: "session closed".to_string(),
        })
    });

    let err = result.unwrap_err();
    assert!(matches!(err, QueueError::Provider { .. }));
    assert_eq!(err.to_string(), "Provider error (artemis): session closed");
}

#[test]
fn test_operations_never_interleave() {
    let sync = Arc::new(SessionSynchronizer::new());
    let active = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let sync = Arc::clone(&sync);
            let active = Arc::clone(&active);
            let overlaps = Arc::clone(&overlaps);
            let completed = Arc::clone(&completed);

            thread::spawn(move || {
                for _ in 0..100 {
                    let _: Result<(), ()> = sync.atomically(|| {
                        if active.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        active.store(false, Ordering::SeqCst);
                        completed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    });
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(completed.load(Ordering::SeqCst), 800);
}

#[test]
fn test_gate_survives_panicking_operation() {
    let sync = SessionSynchronizer::new();

    let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: Result<(), ()> = sync.atomically(|| panic!("session op blew up"));
    }));
    assert!(panicked.is_err());

    // Later callers are not wedged by the poisoned gate
    let after: Result<i32, QueueError> = sync.atomically(|| Ok(7));
    assert_eq!(after.unwrap(), 7);
}

#[test]
fn test_shared_across_threads_via_arc() {
    let sync = Arc::new(SessionSynchronizer::new());
    let total = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let sync = Arc::clone(&sync);
            let total = Arc::clone(&total);
            thread::spawn(move || {
                let _: Result<(), ()> = sync.atomically(|| {
                    total.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(total.load(Ordering::SeqCst), 4);
}
