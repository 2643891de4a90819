//! Defines the protocol engine and the transports linking it to the host.

mod data;
pub mod firmata;
mod transports;

pub use data::*;
pub use firmata::{Diagnostic, DiagnosticHook, Engine};
pub use transports::serial::Serial;
pub use transports::*;
