//! Monitor module - Switch monitor inputs over DDC/CI
//!
//! A [`DisplayBackend`] enumerates the controllable monitors and sends VCP
//! feature commands to them. [`MonitorController`] combines the two into a
//! single "set every monitor to input X" operation.
//!
//! Handles are scoped to one `set_input` call. Each one is dropped right after
//! its command is sent, and dropping a handle releases the OS resource.

use thiserror::Error;

use crate::config::InputTable;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod ddcutil;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsDisplayBackend as PlatformDisplayBackend;

#[cfg(target_os = "linux")]
pub use ddcutil::DdcutilDisplayBackend as PlatformDisplayBackend;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use UnsupportedDisplayBackend as PlatformDisplayBackend;

/// VCP feature code for input source select
pub const INPUT_SELECT_VCP: u8 = 0x60;

/// Errors that can occur while switching inputs
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitor enumeration failed: {0}")]
    Enumeration(String),

    #[error("Monitor rejected command: {0}")]
    Command(String),

    #[error("{failed} of {attempted} monitors did not accept the command (first error: {first})")]
    CommandsFailed {
        failed: usize,
        attempted: usize,
        first: Box<MonitorError>,
    },

    #[cfg(any(test, not(any(target_os = "windows", target_os = "linux"))))]
    #[error("Monitor control is not supported on this platform")]
    NotSupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Platform access to controllable monitors
pub trait DisplayBackend: Send {
    /// Releases its OS resource when dropped
    type Handle;

    /// Fresh set of handles; the caller owns and drops them
    fn list_controllable_monitors(&self) -> MonitorResult<Vec<Self::Handle>>;

    fn send_feature_command(&self, handle: &Self::Handle, feature: u8, value: u32)
        -> MonitorResult<()>;
}

/// What a successful `set_input` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Input name not in the table; nothing was sent
    UnknownInput,
    /// Every enumerated monitor accepted the command
    Applied { code: u32, monitors: usize },
}

/// Anything that can point the monitors at a named input
pub trait InputSelector: Send {
    fn set_input(&self, input_name: &str) -> MonitorResult<SwitchOutcome>;
}

/// Sets all controllable monitors to one input
pub struct MonitorController<B> {
    backend: B,
    inputs: InputTable,
}

impl<B: DisplayBackend> MonitorController<B> {
    pub fn new(backend: B, inputs: InputTable) -> Self {
        Self { backend, inputs }
    }

    /// Number of monitors the backend can currently control
    pub fn monitor_count(&self) -> MonitorResult<usize> {
        Ok(self.backend.list_controllable_monitors()?.len())
    }
}

impl<B: DisplayBackend> InputSelector for MonitorController<B> {
    /// Send the input code to every monitor.
    ///
    /// A failed command does not stop the remaining monitors from being
    /// switched; failures are reported together once all were attempted.
    fn set_input(&self, input_name: &str) -> MonitorResult<SwitchOutcome> {
        let Some(code) = self.inputs.resolve(input_name) else {
            tracing::debug!("Ignoring unknown input '{}'", input_name);
            return Ok(SwitchOutcome::UnknownInput);
        };

        let handles = self.backend.list_controllable_monitors()?;
        let attempted = handles.len();
        let mut failures = Vec::new();

        for (index, handle) in handles.into_iter().enumerate() {
            let result = self.backend.send_feature_command(&handle, INPUT_SELECT_VCP, code);
            drop(handle);

            match result {
                Ok(()) => tracing::debug!("Monitor {} set to {} ({:#04x})", index, input_name, code),
                Err(e) => {
                    tracing::warn!("Monitor {} rejected input {}: {}", index, input_name, e);
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            return Ok(SwitchOutcome::Applied {
                code,
                monitors: attempted,
            });
        }

        let failed = failures.len();
        let first = failures.swap_remove(0);
        Err(MonitorError::CommandsFailed {
            failed,
            attempted,
            first: Box::new(first),
        })
    }
}

/// Decode a fixed-size UTF-16 buffer up to its first NUL
#[cfg(any(test, target_os = "windows"))]
fn decode_wide(raw: &[u16]) -> String {
    let len = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    String::from_utf16_lossy(&raw[..len])
}

/// Backend for platforms without a monitor control implementation
#[cfg(any(test, not(any(target_os = "windows", target_os = "linux"))))]
#[derive(Debug, Default)]
pub struct UnsupportedDisplayBackend;

#[cfg(any(test, not(any(target_os = "windows", target_os = "linux"))))]
impl UnsupportedDisplayBackend {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(test, not(any(target_os = "windows", target_os = "linux"))))]
impl DisplayBackend for UnsupportedDisplayBackend {
    type Handle = ();

    fn list_controllable_monitors(&self) -> MonitorResult<Vec<()>> {
        Err(MonitorError::NotSupported)
    }

    fn send_feature_command(&self, _handle: &(), _feature: u8, _value: u32) -> MonitorResult<()> {
        Err(MonitorError::NotSupported)
    }
}
