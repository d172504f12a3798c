//! # busbar
//!
//! **Busbar** is an in-process publish/subscribe bus for threaded control
//! tasks.
//!
//! It decouples periodic control tasks (an inverter setpoint loop, a battery
//! telemetry aggregator, diagnostics) so that none of them holds a reference
//! to another: every message a task sends is broadcast to every other
//! attached task, and each task consumes from its own private FIFO inbox,
//! either by blocking on it or through a callback executed on a shared worker
//! pool.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskRunner  │   │  TaskRunner  │   │  TaskRunner  │
//!     │ (sender loop)│   │(receiver task)│  │ (diagnostics)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ send             │ recv / callback  │ recv
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus                                                              │
//! │  - Registry: TaskId → { name, inbox, callback, backlog }          │
//! │  - send: one critical section fans out to every inbox but the     │
//! │    sender's; callback work is captured under the lock and         │
//! │    executed after release                                         │
//! │  - receive: blocks on a condvar until inbox non-empty / shutdown  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   │ drain jobs (one per subscriber)
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │       WorkerPool       │
//!                       │  fixed OS threads, FIFO│
//!                       │  queue, drain-on-stop  │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                     callback(msg)    callback(msg)
//!                    (per subscriber, in send order)
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskRunner::new(task, &ids, bus)         Created
//!   ├─ attach()      → bus registry entry
//!   └─ start()       → Running: callback registered (if any),
//!   │                  dedicated thread: while running { tick(&ctx) }
//!   └─ stop()        → Stopped: flag cleared → detach (wakes recv) → join
//!
//! Bus::shutdown()    → idempotent; wakes every blocked receiver; queued
//!                      messages stay poppable, further sends are rejected
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types                                    |
//! |-----------------|----------------------------------------------------------|----------------------------------------------|
//! | **Bus**         | Broadcast fan-out, blocking receive, callbacks.          | [`Bus`], [`Callback`]                        |
//! | **Worker pool** | Fixed-size thread pool with drain-on-stop semantics.     | [`WorkerPool`], [`WorkHandle`]               |
//! | **Tasks**       | Periodic work on dedicated threads, cooperative stop.    | [`Task`], [`TaskFn`], [`TaskRunner`]         |
//! | **Identities**  | Injectable monotonic id allocation.                      | [`TaskId`], [`TaskIdAllocator`]              |
//! | **Commands**    | Typed payloads with JSON population.                     | [`Command`], [`InverterCommand`], [`BatteryStateCommand`] |
//! | **Config**      | Bus tuning plus a JSON-backed key-value store.           | [`BusConfig`], [`ConfigStore`], [`JsonStorage`] |
//! | **Errors**      | Typed recoverable conditions at each boundary.           | [`BusError`], [`PoolError`], [`PayloadError`], [`StorageError`] |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! use busbar::{
//!     Bus, Command, CommandPayload, InverterCommand, InverterMode, TaskFn, TaskIdAllocator,
//!     TaskRunner,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ids = TaskIdAllocator::new();
//!     let bus = Bus::new();
//!
//!     // A sender that emits one setpoint per tick.
//!     let sender = TaskFn::arc("setpoint", |ctx| {
//!         let cmd = InverterCommand::new(InverterMode::Charging, 54.0, 10.0);
//!         let _ = ctx.send(Command::new(CommandPayload::Inverter(cmd)).into_message());
//!         std::thread::sleep(Duration::from_millis(20));
//!     });
//!
//!     // A receiver that blocks on its inbox; recv() returns None on stop.
//!     let receiver = TaskFn::arc("controller", |ctx| {
//!         if let Some(msg) = ctx.recv() {
//!             println!("controller got {msg}");
//!         }
//!     });
//!
//!     let sender = TaskRunner::new(sender, &ids, bus.clone());
//!     let receiver = TaskRunner::new(receiver, &ids, bus.clone());
//!     sender.attach()?;
//!     receiver.attach()?;
//!     receiver.start();
//!     sender.start();
//!
//!     std::thread::sleep(Duration::from_millis(100));
//!
//!     sender.stop();
//!     receiver.stop();
//!     bus.shutdown();
//!     Ok(())
//! }
//! ```
mod bus;
mod commands;
mod config;
mod error;
mod ids;
mod pool;
mod tasks;

pub mod fault;

// ---- Public re-exports ----

pub use bus::{Bus, Callback};
pub use commands::{
    BatteryStateCommand, CanFrame, Command, CommandKind, CommandPayload, InverterCommand,
    InverterMode, MessageRef, PayloadError,
};
pub use config::{BusConfig, ConfigStore, JsonStorage, Storage, StorageError};
pub use error::{BusError, PoolError};
pub use ids::{TaskId, TaskIdAllocator};
pub use pool::{WorkHandle, WorkOutcome, WorkerPool};
pub use tasks::{Task, TaskContext, TaskFn, TaskRef, TaskRunner, TaskState};
