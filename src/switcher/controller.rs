//! Presence-driven input switching state machine

use std::sync::Arc;

use super::flags::{RuntimeFlags, SwitcherState};
use super::ticker::Ticker;
use crate::config::Config;
use crate::monitor::{InputSelector, SwitchOutcome};
use crate::presence::{Detection, PresenceSource};

/// Which device to watch and which input to select for each presence state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPlan {
    pub target_name: String,
    pub plugged_in: String,
    pub unplugged: String,
}

impl SwitchPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_name: config.device.name.clone(),
            plugged_in: config.switching.plugged_in.clone(),
            unplugged: config.switching.unplugged.clone(),
        }
    }

    pub fn input_for(&self, present: bool) -> &str {
        if present {
            &self.plugged_in
        } else {
            &self.unplugged
        }
    }
}

impl Default for SwitchPlan {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Stop was requested; the loop must exit
    Stopped,
    /// Paused; nothing was checked
    Paused,
    /// Presence matches the recorded state
    Unchanged { present: bool },
    /// Presence changed and the input command went out
    Switched {
        present: bool,
        input: String,
        outcome: SwitchOutcome,
    },
    /// Presence changed but the input command failed
    SwitchFailed { present: bool, input: String },
}

/// Polls presence and switches monitor inputs on transitions.
///
/// The recorded presence starts as `true`, so the first observation of a
/// present device does nothing. The record follows every observed transition
/// even when the switch fails, so a failing monitor is not retried every
/// cycle.
pub struct SwitchController<P, S> {
    presence: P,
    selector: S,
    plan: SwitchPlan,
    flags: Arc<RuntimeFlags>,
    last_present: bool,
    inconclusive: bool,
}

impl<P: PresenceSource, S: InputSelector> SwitchController<P, S> {
    pub fn new(presence: P, selector: S, plan: SwitchPlan, flags: Arc<RuntimeFlags>) -> Self {
        Self {
            presence,
            selector,
            plan,
            flags,
            last_present: true,
            inconclusive: false,
        }
    }

    /// Last recorded presence
    #[cfg(test)]
    fn last_present(&self) -> bool {
        self.last_present
    }

    /// Run a single poll cycle
    pub fn step(&mut self) -> CycleOutcome {
        match self.flags.state() {
            SwitcherState::Stopped => return CycleOutcome::Stopped,
            SwitcherState::Paused => return CycleOutcome::Paused,
            SwitcherState::Running => {}
        }

        let detection = self.presence.detect(&self.plan.target_name);
        self.note_inconclusive(&detection);
        let present = detection.is_present();

        if present == self.last_present {
            return CycleOutcome::Unchanged { present };
        }

        let input = self.plan.input_for(present).to_string();
        if present {
            tracing::info!("{} connected, switching to {}", self.plan.target_name, input);
        } else {
            tracing::info!("{} disconnected, switching to {}", self.plan.target_name, input);
        }

        let outcome = match self.selector.set_input(&input) {
            Ok(outcome) => {
                match outcome {
                    SwitchOutcome::Applied { monitors, .. } => {
                        tracing::info!("Switched {} monitor(s) to {}", monitors, input)
                    }
                    SwitchOutcome::UnknownInput => {
                        tracing::warn!("Input '{}' is not in the input table, nothing switched", input)
                    }
                }
                CycleOutcome::Switched {
                    present,
                    input,
                    outcome,
                }
            }
            Err(e) => {
                tracing::error!("Failed to switch to {}: {}", input, e);
                CycleOutcome::SwitchFailed { present, input }
            }
        };

        self.last_present = present;
        outcome
    }

    /// Poll until stopped, waiting one tick between cycles
    pub async fn run<T: Ticker>(mut self, mut ticker: T) {
        tracing::info!("Watching for '{}'", self.plan.target_name);

        loop {
            if self.step() == CycleOutcome::Stopped {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.flags.stopped() => {}
            }
        }

        tracing::info!("Switch loop stopped");
    }

    fn note_inconclusive(&mut self, detection: &Detection) {
        match detection {
            Detection::Inconclusive(e) if !self.inconclusive => {
                tracing::debug!("HID enumeration failed, assuming device present: {}", e);
                self.inconclusive = true;
            }
            Detection::Present | Detection::Absent if self.inconclusive => {
                tracing::debug!("HID enumeration recovered");
                self.inconclusive = false;
            }
            _ => {}
        }
    }
}
