//! # Typed command payloads carried over the bus.
//!
//! The bus core treats a message as opaque shared data with a timestamp and
//! a type tag; this module is where the concrete payload kinds live. Dispatch
//! is over the closed [`CommandPayload`] sum type — matching on the tag, not
//! on runtime type identity.
//!
//! Field population from JSON is the payload's own concern (`apply_json` on
//! the concrete types); the core never inspects payload contents.

mod battery;
mod command;
mod error;
mod gateway;
mod inverter;

pub use battery::BatteryStateCommand;
pub use command::{Command, CommandKind, CommandPayload, MessageRef};
pub use error::PayloadError;
pub use gateway::CanFrame;
pub use inverter::{InverterCommand, InverterMode};
