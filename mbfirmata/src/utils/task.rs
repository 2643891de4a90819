//! Drives an [`Engine`] from a tokio task, for hosted boards (or simulators) where the engine
//! does not own the main loop.
use std::sync::Arc;

use log::{error, info};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::errors::{Error, RuntimeError, Unknown};
use crate::hardware::Hardware;
use crate::io::{Engine, Transport};

#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        tokio::time::sleep(tokio::time::Duration::from_millis($ms as u64)).await
    };
}

#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}

/// Represents the handler of the engine task.
pub type TaskHandler = JoinHandle<Result<(), Error>>;

/// Runs `begin` once, then `step` every `period` milliseconds, until a step fails or the
/// runner is aborted.
///
/// The engine is shared: other tasks may lock it between two steps (to report events, send
/// debug strings or inspect the pin table).
pub struct Runner<H, T> {
    engine: Arc<Mutex<Engine<H, T>>>,
    handler: TaskHandler,
}

impl<H, T> Runner<H, T>
where
    H: Hardware + Send + 'static,
    T: Transport + 'static,
{
    /// Spawns the engine loop on the current tokio runtime.
    ///
    /// # Errors
    /// `RuntimeError` if not called from within a tokio runtime.
    ///
    /// # Example
    /// ```no_run
    /// use mbfirmata::io::Engine;
    /// use mbfirmata::utils::task::Runner;
    /// # use mbfirmata::hardware::Hardware;
    /// # use mbfirmata::io::Serial;
    /// # async fn run<H: Hardware + Send + 'static>(engine: Engine<H, Serial>) {
    ///
    /// let runner = Runner::start(engine, 1).expect("called within a tokio runtime");
    /// runner.join().await.expect("engine stopped on error");
    /// # }
    /// ```
    pub fn start(engine: Engine<H, T>, period: u64) -> Result<Self, Error> {
        let runtime = Handle::try_current().map_err(|_| RuntimeError)?;
        let engine = Arc::new(Mutex::new(engine));

        let shared = engine.clone();
        let handler = runtime.spawn(async move {
            let result = shared.lock().begin();
            if let Err(error) = result {
                error!("Engine startup failed: {}", error);
                return Err(error);
            }
            info!("Engine started (step every {}ms)", period);
            loop {
                let result = shared.lock().step();
                if let Err(error) = result {
                    error!("Engine step failed: {}", error);
                    return Err(error);
                }
                crate::pause!(period);
            }
        });

        Ok(Self { engine, handler })
    }

    /// Returns the shared engine.
    pub fn engine(&self) -> Arc<Mutex<Engine<H, T>>> {
        self.engine.clone()
    }

    /// Checks if the engine loop is still running.
    pub fn is_running(&self) -> bool {
        !self.handler.is_finished()
    }

    /// Stops the engine loop. The step in progress (if any) completes first.
    pub fn abort(&self) {
        self.handler.abort();
    }

    /// Waits for the engine loop to stop.
    ///
    /// # Errors
    /// The error which stopped the loop, or `Unknown` if the task was aborted or panicked.
    pub async fn join(self) -> Result<(), Error> {
        self.handler.await.map_err(|err| Unknown {
            info: err.to_string(),
        })?
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::io::PinModeId;
    use crate::mocks::hardware::{HardwareCall, MockHardware};
    use crate::mocks::transport_layer::MockTransport;
    use crate::utils::helpers::format_as_hex;

    use super::*;

    fn _create_mock_engine(
        transport: &MockTransport,
        hardware: &MockHardware,
    ) -> Engine<MockHardware, MockTransport> {
        Engine::new(EngineConfig::default(), hardware.clone(), transport.clone()).unwrap()
    }

    #[test]
    fn test_runner_requires_runtime() {
        let engine = _create_mock_engine(&MockTransport::default(), &MockHardware::default());
        let runner = Runner::start(engine, 10);
        assert!(runner.is_err());
        assert_eq!(
            runner.err().unwrap().to_string(),
            "Runtime error: Are you sure the engine runs inside a tokio runtime?"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_steps_periodically() {
        let transport = MockTransport::new(&[0xF9]);
        let hardware = MockHardware::default();
        let runner = Runner::start(_create_mock_engine(&transport, &hardware), 10).unwrap();

        // Startup announcement, then the answer to the pending version request.
        pause!(5);
        let output = transport.take_output();
        assert_eq!(
            output,
            [0xF9, 0x02, 0x06, 0xF9, 0x02, 0x06],
            "Unexpected output [{}]",
            format_as_hex(&output)
        );
        assert!(runner.is_running());

        // Processed by the next step only.
        transport.push_input(&[0xF4, 0x00, 0x01, 0xF5, 0x00, 0x01]);
        assert!(hardware.calls().is_empty());
        pause!(10);
        assert_eq!(
            hardware.writes(),
            vec![
                HardwareCall::SetDigitalOutput(0, false),
                HardwareCall::SetDigitalOutput(0, true),
            ]
        );
        assert_eq!(
            runner.engine().lock().pin(0).unwrap().mode,
            PinModeId::OUTPUT
        );

        runner.abort();
        pause!(10);
        assert!(!runner.is_running());
        assert!(runner.join().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_shares_engine() {
        let transport = MockTransport::default();
        let hardware = MockHardware::default();
        let runner = Runner::start(_create_mock_engine(&transport, &hardware), 10).unwrap();
        pause!(5);
        transport.take_output();

        let result = runner.engine().lock().send_debug("ok");
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(transport.take_output(), [0xF0, 0x0E, 0x6F, 0x6B, 0xF7]);
        runner.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_stops_on_transport_error() {
        let transport = MockTransport::default();
        let hardware = MockHardware::default();
        let runner = Runner::start(_create_mock_engine(&transport, &hardware), 10).unwrap();
        pause!(25);
        assert!(runner.is_running());

        transport.break_connection();
        pause!(10);
        assert!(!runner.is_running());
        let result = runner.join().await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Protocol error: Mock connection lost."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_stops_on_startup_error() {
        let transport = MockTransport::default();
        transport.break_connection();
        let runner =
            Runner::start(_create_mock_engine(&transport, &MockHardware::default()), 10).unwrap();
        let result = runner.join().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pause() {
        let start = std::time::Instant::now();
        pause!(20);
        assert!(start.elapsed().as_millis() >= 20);
        pause_sync!(5);
        assert!(start.elapsed().as_millis() >= 25);
    }
}
