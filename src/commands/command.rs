//! # Command envelope: timestamp + tagged payload.
//!
//! [`Command`] is the unit the bus broadcasts. It is produced once by a
//! sender, wrapped in an [`Arc`] ([`MessageRef`]) and shared by every inbox
//! and deferred callback that references it; it is dropped only when the
//! last holder lets go.
//!
//! # Example
//! ```rust
//! use busbar::{Command, CommandKind, CommandPayload, InverterCommand};
//!
//! let cmd = Command::new(CommandPayload::Inverter(InverterCommand::default()));
//! assert_eq!(cmd.kind(), CommandKind::Inverter);
//! assert!(cmd.timestamp_ms() > 0);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{BatteryStateCommand, CanFrame, InverterCommand};

/// Shared, immutable handle to a sent command.
pub type MessageRef = Arc<Command>;

/// Type tag identifying a payload kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Inverter control command.
    Inverter,
    /// Aggregated battery state.
    Battery,
    /// Raw CAN frame forwarded by a gateway.
    Gateway,
    /// Free-form JSON document.
    Json,
}

/// Closed set of payload kinds the system exchanges.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandPayload {
    /// Inverter control command.
    Inverter(InverterCommand),
    /// Aggregated battery state.
    Battery(BatteryStateCommand),
    /// Raw CAN frame forwarded by a gateway.
    Gateway(CanFrame),
    /// Free-form JSON document.
    Json(serde_json::Value),
}

impl CommandPayload {
    /// Returns the type tag of this payload.
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::Inverter(_) => CommandKind::Inverter,
            CommandPayload::Battery(_) => CommandKind::Battery,
            CommandPayload::Gateway(_) => CommandKind::Gateway,
            CommandPayload::Json(_) => CommandKind::Json,
        }
    }
}

/// A bus message: creation timestamp plus a tagged payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    timestamp_ms: u64,
    payload: CommandPayload,
}

impl Command {
    /// Creates a command stamped with the current wall-clock time.
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            timestamp_ms: now_ms(),
            payload,
        }
    }

    /// Milliseconds since the Unix epoch at creation (or the last
    /// [`touch`](Self::touch)).
    #[inline]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Refreshes the timestamp to the current time.
    pub fn touch(&mut self) {
        self.timestamp_ms = now_ms();
    }

    /// Returns the payload's type tag.
    #[inline]
    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    /// Borrows the payload.
    #[inline]
    pub fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    /// Wraps the command for broadcasting.
    pub fn into_message(self) -> MessageRef {
        Arc::new(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            CommandPayload::Inverter(inv) => write!(f, "[{}] {inv}", self.timestamp_ms),
            CommandPayload::Battery(bat) => write!(f, "[{}] {bat}", self.timestamp_ms),
            CommandPayload::Gateway(frame) => write!(f, "[{}] {frame}", self.timestamp_ms),
            CommandPayload::Json(value) => write!(f, "[{}] json {value}", self.timestamp_ms),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_payload() {
        let cmd = Command::new(CommandPayload::Json(serde_json::json!({"k": 1})));
        assert_eq!(cmd.kind(), CommandKind::Json);

        let cmd = Command::new(CommandPayload::Battery(BatteryStateCommand::default()));
        assert_eq!(cmd.kind(), CommandKind::Battery);
    }

    #[test]
    fn test_touch_advances_or_keeps_timestamp() {
        let mut cmd = Command::new(CommandPayload::Json(serde_json::Value::Null));
        let before = cmd.timestamp_ms();
        cmd.touch();
        assert!(cmd.timestamp_ms() >= before);
    }
}
