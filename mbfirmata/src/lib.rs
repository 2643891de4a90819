#![doc(html_root_url = "https://docs.rs/mbfirmata/0.1.0")]

//! <h1 align="center">MBFIRMATA - Firmata for the micro:bit</h1>
//! <div style="text-align:center;font-style:italic;">The device side of the Firmata protocol, with the micro:bit display and sensor extensions - written in Rust.</div>
//! <br/>
//!
//! # Documentation
//!
//! This is the API documentation.<br/>
//! Firmata protocol documentation: <https://github.com/firmata/protocol>
//!
//! # Features
//!
//! **mbfirmata** turns a BBC micro:bit (or any board describable by a [`BoardLayout`](hardware::BoardLayout))
//! into a peripheral remotely controlled by a host speaking Firmata 2.6 (Johnny-Five, pyFirmata, Hermes-Five...).
//!
//! - Reassemble commands from a fragmented byte stream (Firmata core commands and sysex)
//! - Drive digital/PWM pins, pull resistors, the 5x5 display, touch pins and the light sensor
//!   through the [`Hardware`](hardware::Hardware) capability trait
//! - Stream digital ports on change and analog channels (pins, accelerometer, compass,
//!   thermometer, light level) at a configurable sampling interval
//! - Answer capability, analog mapping, pin state and firmware queries
//! - Talk to the host through any [`Transport`](io::Transport) ([`Serial`](io::Serial) provided)
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! mbfirmata = "0.1.0"
//! ```
//!
//! - Implement [`Hardware`](hardware::Hardware) for your board, then call
//!   [`Engine::step`](io::Engine::step) from the firmware main loop:
//! ```no_run
//! use mbfirmata::config::EngineConfig;
//! use mbfirmata::hardware::Hardware;
//! use mbfirmata::io::{Engine, Serial};
//!
//! fn firmware<H: Hardware>(board: H) -> Result<(), mbfirmata::errors::Error> {
//!     let mut transport = Serial::new("/dev/ttyACM0");
//!     transport.open()?;
//!
//!     let mut engine = Engine::new(EngineConfig::default(), board, transport)?;
//!     engine.on_diagnostic(|diagnostic| eprintln!("{}", diagnostic));
//!     engine.begin()?;
//!     loop {
//!         engine.step()?;
//!     }
//! }
//! ```
//!
//! Hosted boards (or simulators) may instead run the engine as a tokio task through
//! [`Runner`](utils::task::Runner).
//!
//! # Feature flags
//!
//! - **libudev** -- (enabled by default) Activates `serialport` crate _libudev_ feature under-the-hood (required on Linux only for port listing).
//! - **serde** -- Enables serialize/deserialize capabilities for the configuration and protocol data.
//! - **mocks** -- Provides mocked hardware, transport and serial port (useful for tests mostly).

pub mod config;
pub mod errors;
pub mod hardware;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod utils;
