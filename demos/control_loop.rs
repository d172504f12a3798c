//! Inverter control loop over the bus.
//!
//! Wires the full stack together: configuration load (tolerating a missing
//! file), bus construction from config, a periodic setpoint sender, a
//! receiver that consumes both by callback and by polling its inbox, a
//! bounded run, then orderly teardown and a config save.
//!
//! Run with: `cargo run --example control_loop`

use std::time::Duration;

use busbar::{
    Bus, BusConfig, Command, CommandPayload, ConfigStore, InverterCommand, InverterMode,
    JsonStorage, StorageError, TaskFn, TaskIdAllocator, TaskRunner,
};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = ConfigStore::new(Box::new(JsonStorage::new()));
    match config.load("config.json") {
        Ok(()) => {}
        Err(StorageError::Unavailable(_)) => {
            warn!("config.json not found, using defaults");
        }
        Err(err) => return Err(err.into()),
    }

    let workers = config.get_or("max_threads", 0usize);
    let ids = TaskIdAllocator::new();
    let bus = Bus::with_config(BusConfig::default().with_workers(workers));

    // Emits a charging setpoint four times a second.
    let sender = TaskFn::arc("setpoint-sender", |ctx| {
        let cmd = InverterCommand::new(InverterMode::Charging, 54.0, 12.5);
        if let Err(err) = ctx.send(Command::new(CommandPayload::Inverter(cmd)).into_message()) {
            warn!(error = %err, "send failed");
        }
        std::thread::sleep(Duration::from_millis(250));
    });

    // Consumes by callback (push, on the pool) and by polling its inbox.
    let receiver = TaskFn::new("inverter-controller", |ctx| {
        if let Some(msg) = ctx.recv() {
            info!(task = ctx.name(), %msg, "polled from inbox");
        }
    })
    .with_handler(|msg| {
        if let CommandPayload::Inverter(cmd) = msg.payload() {
            info!(mode = %cmd.mode, voltage_v = cmd.voltage_v, "callback setpoint");
        }
    })
    .into_arc();

    let sender = TaskRunner::new(sender, &ids, bus.clone());
    let receiver = TaskRunner::new(receiver, &ids, bus.clone());
    sender.attach()?;
    receiver.attach()?;
    receiver.start();
    sender.start();

    std::thread::sleep(Duration::from_secs(3));

    sender.stop();
    receiver.stop();
    bus.shutdown();

    config.set("log_level", "debug");
    config.save("updated_config.json")?;
    info!("control loop finished");
    Ok(())
}
