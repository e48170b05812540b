//! Integration tests for the reactor under concurrent use.

use render_sync::{Reactor, ReactorState, SyncError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_concurrent_perform_starts_one_worker() {
    let reactor = Arc::new(Reactor::new());
    let done = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let reactor = Arc::clone(&reactor);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..25 {
                    let done = Arc::clone(&done);
                    reactor
                        .perform(move || {
                            done.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(reactor.starts(), 1);
    assert_eq!(reactor.state(), ReactorState::Running);

    reactor.stop();
    assert_eq!(done.load(Ordering::SeqCst), 16 * 25);
    assert_eq!(reactor.state(), ReactorState::Stopped);
}

#[test]
fn test_tasks_run_in_submission_order() {
    let reactor = Reactor::new();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    for i in 0..100 {
        let order = Arc::clone(&order);
        reactor
            .perform(move || {
                order.lock().push(i);
                Ok(())
            })
            .unwrap();
    }
    reactor.stop();

    assert_eq!(*order.lock(), (0..100).collect::<Vec<_>>());
}

#[test]
fn test_errors_are_contained_in_worker() {
    let reactor = Reactor::new();
    let done = Arc::new(AtomicUsize::new(0));

    reactor
        .perform(|| Err(SyncError::Network("timeout".into())))
        .unwrap();
    let counter = Arc::clone(&done);
    reactor
        .perform(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    reactor.stop();

    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(reactor.starts(), 1);
}

#[test]
fn test_stop_from_concurrent_callers() {
    let reactor = Arc::new(Reactor::new());
    reactor.perform(|| Ok(())).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reactor = Arc::clone(&reactor);
            thread::spawn(move || reactor.stop())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!reactor.is_running());
    reactor.perform(|| Ok(())).unwrap();
    assert_eq!(reactor.starts(), 2);
}
