//! Pause/stop flags shared between the control surface and the switch loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Externally visible state of the switch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitcherState {
    Running,
    Paused,
    /// Terminal
    Stopped,
}

/// The only mutable state shared across threads.
///
/// `stopped` never goes back to false once set. Stale reads of either flag
/// are fine for up to one poll interval.
#[derive(Debug, Default)]
pub struct RuntimeFlags {
    paused: AtomicBool,
    stopped: AtomicBool,
    stop_signal: Notify,
}

impl RuntimeFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Flip `paused`, returning the new value
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Request termination. Also wakes a switch loop waiting for its next tick.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // A single loop waits on this; notify_one keeps a permit if it is not
        // waiting yet.
        self.stop_signal.notify_one();
    }

    /// Resolves once [`stop`](Self::stop) has been called
    pub async fn stopped(&self) {
        if self.is_stopped() {
            return;
        }
        self.stop_signal.notified().await;
    }

    pub fn state(&self) -> SwitcherState {
        if self.is_stopped() {
            SwitcherState::Stopped
        } else if self.is_paused() {
            SwitcherState::Paused
        } else {
            SwitcherState::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let flags = RuntimeFlags::new();
        assert!(!flags.is_paused());
        assert!(!flags.is_stopped());
        assert_eq!(flags.state(), SwitcherState::Running);
    }

    #[test]
    fn test_toggle_pause() {
        let flags = RuntimeFlags::new();
        assert!(flags.toggle_pause());
        assert_eq!(flags.state(), SwitcherState::Paused);
        assert!(!flags.toggle_pause());
        assert_eq!(flags.state(), SwitcherState::Running);
    }

    #[test]
    fn test_stop_is_terminal_and_wins_over_pause() {
        let flags = RuntimeFlags::new();
        flags.set_paused(true);
        flags.stop();
        assert_eq!(flags.state(), SwitcherState::Stopped);

        flags.set_paused(false);
        flags.toggle_pause();
        assert!(flags.is_stopped());
        assert_eq!(flags.state(), SwitcherState::Stopped);
    }

    #[test]
    fn test_stopped_resolves_after_stop() {
        let flags = RuntimeFlags::new();
        flags.stop();
        tokio_test::block_on(flags.stopped());
    }

    #[tokio::test]
    async fn test_stop_wakes_waiter() {
        let flags = RuntimeFlags::shared();
        let waiter = {
            let flags = flags.clone();
            tokio::spawn(async move { flags.stopped().await })
        };

        tokio::task::yield_now().await;
        flags.stop();

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not woken")
            .unwrap();
    }
}
