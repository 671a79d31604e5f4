//! Switcher module - The presence-driven switch loop
//!
//! Provides:
//! - [`SwitchController`], the state machine run once per poll
//! - [`RuntimeFlags`], the pause/stop flags shared with the control surface
//! - [`Ticker`], the injectable poll cadence
//!
//! The loop runs on its own thread with a single-threaded tokio runtime. The
//! presence check and monitor commands are blocking calls, and nothing else
//! shares that runtime.

mod controller;
mod flags;
mod ticker;

pub use controller::*;
pub use flags::*;
pub use ticker::*;

use std::thread::JoinHandle;
use std::time::Duration;

use crate::monitor::InputSelector;
use crate::presence::PresenceSource;

/// Start the switch loop on a dedicated background thread.
///
/// The loop runs until the controller's flags are stopped. Callers do not need
/// to join the returned handle.
pub fn spawn<P, S>(controller: SwitchController<P, S>, interval: Duration) -> std::io::Result<JoinHandle<()>>
where
    P: PresenceSource + 'static,
    S: InputSelector + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    std::thread::Builder::new()
        .name("switcher".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let ticker = IntervalTicker::new(interval);
                controller.run(ticker).await;
            });
        })
}
