//! Battery telemetry publisher plus a diagnostics task.
//!
//! The publisher builds an aggregated battery state from a JSON telemetry
//! document each tick and broadcasts it; diagnostics periodically reports
//! whether the bus is still running.
//!
//! Run with: `cargo run --example battery_feed`

use std::time::Duration;

use busbar::{
    BatteryStateCommand, Bus, Command, CommandPayload, TaskFn, TaskIdAllocator, TaskRunner,
};
use tracing::{info, warn};

const TELEMETRY: &str = r#"{
    "Cube_Num": 8,
    "Cube_OP": 7,
    "Voltage": {"MIN": 49800, "MAX": 53100},
    "SOC": {"AVG": 7200}
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let ids = TaskIdAllocator::new();
    let bus = Bus::new();

    let publisher = TaskFn::arc("battery-publisher", |ctx| {
        let mut state = BatteryStateCommand::default();
        match state.apply_json(TELEMETRY) {
            Ok(()) => {
                let msg = Command::new(CommandPayload::Battery(state)).into_message();
                if let Err(err) = ctx.send(msg) {
                    warn!(error = %err, "publish failed");
                }
            }
            Err(err) => warn!(error = %err, "telemetry rejected"),
        }
        std::thread::sleep(Duration::from_millis(500));
    });

    let monitor = TaskFn::arc("battery-monitor", |ctx| {
        if let Some(msg) = ctx.recv() {
            if let CommandPayload::Battery(state) = msg.payload() {
                info!(
                    soc = state.soc_mean(),
                    voltage_mv = state.voltage_mean_mv(),
                    ready = state.ready_cubes(),
                    "battery state"
                );
            }
        }
    });

    let diag_bus = bus.clone();
    let diagnostics = TaskFn::arc("diagnostics", move |_ctx| {
        info!(
            bus_running = diag_bus.is_running(),
            attached = diag_bus.attached_count(),
            "diagnostics"
        );
        std::thread::sleep(Duration::from_millis(500));
    });

    let publisher = TaskRunner::new(publisher, &ids, bus.clone());
    let monitor = TaskRunner::new(monitor, &ids, bus.clone());
    let diagnostics = TaskRunner::new(diagnostics, &ids, bus.clone());
    publisher.attach()?;
    monitor.attach()?;
    diagnostics.attach()?;
    monitor.start();
    diagnostics.start();
    publisher.start();

    std::thread::sleep(Duration::from_secs(3));

    publisher.stop();
    monitor.stop();
    diagnostics.stop();
    bus.shutdown();
    info!("battery feed finished");
    Ok(())
}
