//! Fakes of the engine collaborators, used by tests (and by downstream crates through the `mocks` feature).

pub mod hardware;
pub mod serial_port;
pub mod transport_layer;
