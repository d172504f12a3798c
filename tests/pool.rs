//! Cross-thread behavior of the worker pool: FIFO execution, drain-on-stop,
//! rejection after stop, panic isolation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use busbar::{PoolError, WorkOutcome, WorkerPool};

#[test]
fn test_submitted_jobs_all_execute() {
    let pool = WorkerPool::new(4);
    let counter = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("pool is running")
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.wait(), WorkOutcome::Completed);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_single_worker_preserves_submission_order() {
    let pool = WorkerPool::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..50 {
        let order = Arc::clone(&order);
        handles.push(
            pool.submit(move || order.lock().push(i))
                .expect("pool is running"),
        );
    }
    for handle in handles {
        handle.wait();
    }

    assert_eq!(*order.lock(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_shutdown_drains_queued_items() {
    let pool = WorkerPool::new(1);
    let counter = Arc::new(AtomicUsize::new(0));

    // Park the single worker so the rest of the items pile up in the queue.
    let gate = Arc::new(AtomicUsize::new(0));
    let parked = Arc::clone(&gate);
    pool.submit(move || {
        while parked.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    })
    .expect("pool is running");

    for _ in 0..20 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("pool is running");
    }

    gate.store(1, Ordering::SeqCst);
    pool.shutdown();
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[test]
fn test_submit_after_shutdown_is_rejected() {
    let pool = WorkerPool::new(2);
    pool.shutdown();

    let err = pool.submit(|| {}).expect_err("stopped pool must reject");
    assert_eq!(err, PoolError::RejectedSubmission);
    assert_eq!(err.as_label(), "pool_rejected_submission");
}

#[test]
fn test_shutdown_is_idempotent() {
    let pool = WorkerPool::new(2);
    pool.shutdown();
    pool.shutdown();
}

#[test]
fn test_panicking_job_does_not_kill_the_worker() {
    let pool = WorkerPool::new(1);

    let panicked = pool
        .submit(|| panic!("job failure"))
        .expect("pool is running");
    assert_eq!(panicked.wait(), WorkOutcome::Panicked);

    // Same (only) worker must still be alive to run this.
    let ok = pool.submit(|| {}).expect("pool is running");
    assert_eq!(ok.wait(), WorkOutcome::Completed);
}

#[test]
fn test_pool_dropped_from_inside_a_job_completes_cleanly() {
    let pool = Arc::new(WorkerPool::new(1));

    // The sleep lets the main thread drop its handle first, so the job's
    // capture is the last one and the pool teardown runs on the worker.
    let inner = Arc::clone(&pool);
    let done = pool
        .submit(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(inner);
        })
        .expect("pool is running");
    drop(pool);

    // Teardown on the worker must not try to join the worker itself; the
    // job finishes normally rather than panicking mid-drop.
    assert_eq!(done.wait(), WorkOutcome::Completed);
}

#[test]
fn test_zero_workers_means_hardware_parallelism() {
    let pool = WorkerPool::new(0);
    assert!(pool.worker_count() >= 1);

    let done = pool.submit(|| {}).expect("pool is running");
    assert_eq!(done.wait(), WorkOutcome::Completed);
}

#[test]
fn test_try_wait_observes_completion() {
    let pool = WorkerPool::new(1);
    let handle = pool.submit(|| {}).expect("pool is running");
    handle.wait();
    assert_eq!(handle.try_wait(), Some(WorkOutcome::Completed));
}
