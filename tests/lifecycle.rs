//! Task lifecycle: start/stop/join semantics, cooperative stop, detach
//! unblocking a parked receive, stop-on-drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use busbar::{
    Bus, Command, CommandPayload, MessageRef, TaskFn, TaskIdAllocator, TaskRunner, TaskState,
};

fn json_message(value: serde_json::Value) -> MessageRef {
    Command::new(CommandPayload::Json(value)).into_message()
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_runner_states_are_forward_only() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let task = TaskFn::arc("idle", |_ctx| {
        std::thread::sleep(Duration::from_millis(5));
    });

    let runner = TaskRunner::new(task, &ids, bus.clone());
    assert_eq!(runner.state(), TaskState::Created);

    runner.attach().unwrap();
    runner.start();
    assert_eq!(runner.state(), TaskState::Running);

    runner.stop();
    assert_eq!(runner.state(), TaskState::Stopped);

    // No restart after stop.
    runner.start();
    assert_eq!(runner.state(), TaskState::Stopped);
    runner.stop(); // idempotent
}

#[test]
fn test_concurrent_start_and_stop_cannot_leak_the_thread() {
    for _ in 0..25 {
        let ids = TaskIdAllocator::new();
        let bus = Bus::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let runner = Arc::new(TaskRunner::new(
            TaskFn::arc("racer", move |_ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(1));
            }),
            &ids,
            bus.clone(),
        ));
        runner.attach().unwrap();

        let starter = {
            let runner = Arc::clone(&runner);
            std::thread::spawn(move || runner.start())
        };
        let stopper = {
            let runner = Arc::clone(&runner);
            std::thread::spawn(move || runner.stop())
        };
        starter.join().unwrap();
        stopper.join().unwrap();

        // Whichever interleaving happened, a final stop must leave no
        // thread still ticking.
        runner.stop();
        assert_eq!(runner.state(), TaskState::Stopped);
        let after_stop = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(
            ticks.load(Ordering::SeqCst),
            after_stop,
            "task thread still ticking after stop"
        );
    }
}

#[test]
fn test_each_runner_gets_a_distinct_id() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let a = TaskRunner::new(TaskFn::arc("a", |_ctx| {}), &ids, bus.clone());
    let b = TaskRunner::new(TaskFn::arc("b", |_ctx| {}), &ids, bus.clone());
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_tick_runs_repeatedly_until_stop() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let task = TaskFn::arc("ticker", move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
    });

    let runner = TaskRunner::new(task, &ids, bus.clone());
    runner.attach().unwrap();
    runner.start();

    assert!(wait_until(Duration::from_secs(2), || {
        ticks.load(Ordering::SeqCst) >= 3
    }));

    runner.stop();
    let after_stop = ticks.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
}

#[test]
fn test_stop_unblocks_a_tick_parked_in_recv() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let task = TaskFn::arc("listener", |ctx| {
        // Blocks until a message arrives or the runner detaches us.
        let _ = ctx.recv();
    });

    let runner = TaskRunner::new(task, &ids, bus.clone());
    runner.attach().unwrap();
    runner.start();
    std::thread::sleep(Duration::from_millis(50));

    // Must return: detach wakes the parked recv, the flag ends the loop.
    runner.stop();
    assert_eq!(runner.state(), TaskState::Stopped);
}

#[test]
fn test_messages_flow_between_running_tasks() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let received = Arc::new(AtomicUsize::new(0));

    let sender = TaskFn::arc("sender", |ctx| {
        let _ = ctx.send(json_message(serde_json::json!("tick")));
        std::thread::sleep(Duration::from_millis(10));
    });
    let sink = Arc::clone(&received);
    let receiver = TaskFn::arc("receiver", move |ctx| {
        if ctx.recv().is_some() {
            sink.fetch_add(1, Ordering::SeqCst);
        }
    });

    let sender = TaskRunner::new(sender, &ids, bus.clone());
    let receiver = TaskRunner::new(receiver, &ids, bus.clone());
    sender.attach().unwrap();
    receiver.attach().unwrap();
    receiver.start();
    sender.start();

    assert!(wait_until(Duration::from_secs(2), || {
        received.load(Ordering::SeqCst) >= 3
    }));

    sender.stop();
    receiver.stop();
    bus.shutdown();
}

#[test]
fn test_handler_is_registered_before_ticking_begins() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let handled = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&handled);
    let subscriber = TaskFn::new("subscriber", |_ctx| {
        std::thread::sleep(Duration::from_millis(5));
    })
    .with_handler(move |_msg| {
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .into_arc();

    let subscriber = TaskRunner::new(subscriber, &ids, bus.clone());
    subscriber.attach().unwrap();
    subscriber.start();

    // A broadcast sent right after start() must reach the handler.
    let outsider = ids.allocate();
    bus.attach(outsider, "outsider").unwrap();
    bus.send(outsider, json_message(serde_json::Value::Null)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        handled.load(Ordering::SeqCst) == 1
    }));
    subscriber.stop();
}

#[test]
fn test_drop_stops_the_task() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let ticks = Arc::new(AtomicUsize::new(0));

    {
        let counter = Arc::clone(&ticks);
        let runner = TaskRunner::new(
            TaskFn::arc("ephemeral", move |_ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
            }),
            &ids,
            bus.clone(),
        );
        runner.attach().unwrap();
        runner.start();
        assert!(wait_until(Duration::from_secs(2), || {
            ticks.load(Ordering::SeqCst) >= 1
        }));
        // Runner dropped here.
    }

    let after_drop = ticks.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
}

#[test]
fn test_stop_before_start_detaches_cleanly() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let runner = TaskRunner::new(TaskFn::arc("unstarted", |_ctx| {}), &ids, bus.clone());
    runner.attach().unwrap();

    runner.stop();
    assert_eq!(runner.state(), TaskState::Stopped);

    // The identity is free again after the detach.
    bus.attach(runner.id(), "reused").unwrap();
}

#[test]
fn test_join_waits_for_self_terminating_task() {
    let ids = TaskIdAllocator::new();
    let bus = Bus::new();
    let ticks = Arc::new(AtomicUsize::new(0));

    // Ends its own loop by blocking in recv until the bus shuts down.
    let counter = Arc::clone(&ticks);
    let task = TaskFn::arc("draining", move |ctx| {
        while ctx.recv().is_some() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        while ctx.is_running() {
            std::thread::sleep(Duration::from_millis(5));
        }
    });

    let runner = TaskRunner::new(task, &ids, bus.clone());
    runner.attach().unwrap();
    runner.start();

    let outsider = ids.allocate();
    bus.attach(outsider, "outsider").unwrap();
    bus.send(outsider, json_message(serde_json::Value::Null)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        ticks.load(Ordering::SeqCst) == 1
    }));

    runner.stop();
    runner.join(); // no thread left; must not hang
    bus.shutdown();
}
