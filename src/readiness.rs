// src/readiness.rs
//
// Composite readiness gate. Three independent subsystems must all be
// Ready before the scheduler may run; any transition re-derives the
// composite and broadcasts it.

use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Models,
    Video,
    Backend,
}

impl Subsystem {
    fn name(&self) -> &'static str {
        match self {
            Subsystem::Models => "models",
            Subsystem::Video => "video",
            Subsystem::Backend => "backend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemState {
    Idle,
    Loading,
    Ready,
    /// Terminal. No retry is attempted; the gate can never activate again.
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    models: SubsystemState,
    video: SubsystemState,
    backend: SubsystemState,
}

impl Flags {
    fn get(&self, subsystem: Subsystem) -> SubsystemState {
        match subsystem {
            Subsystem::Models => self.models,
            Subsystem::Video => self.video,
            Subsystem::Backend => self.backend,
        }
    }

    fn set(&mut self, subsystem: Subsystem, state: SubsystemState) {
        match subsystem {
            Subsystem::Models => self.models = state,
            Subsystem::Video => self.video = state,
            Subsystem::Backend => self.backend = state,
        }
    }

    fn all_ready(&self) -> bool {
        self.models == SubsystemState::Ready
            && self.video == SubsystemState::Ready
            && self.backend == SubsystemState::Ready
    }
}

pub struct ReadinessGate {
    flags: Mutex<Flags>,
    active_tx: watch::Sender<bool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (active_tx, _) = watch::channel(false);
        Self {
            flags: Mutex::new(Flags {
                models: SubsystemState::Idle,
                video: SubsystemState::Idle,
                backend: SubsystemState::Idle,
            }),
            active_tx,
        }
    }

    /// Receiver for the composite predicate. The scheduler selects on this.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.active_tx.subscribe()
    }

    pub fn active(&self) -> bool {
        *self.active_tx.borrow()
    }

    pub fn state(&self, subsystem: Subsystem) -> SubsystemState {
        self.flags.lock().expect("gate lock poisoned").get(subsystem)
    }

    pub fn begin_loading(&self, subsystem: Subsystem) {
        self.transition(subsystem, SubsystemState::Loading);
    }

    pub fn mark_ready(&self, subsystem: Subsystem) {
        self.transition(subsystem, SubsystemState::Ready);
    }

    /// Subsystem became unavailable again (e.g. video stream lost).
    pub fn mark_not_ready(&self, subsystem: Subsystem) {
        self.transition(subsystem, SubsystemState::Idle);
    }

    /// Surfaced once; Failed is terminal so repeat calls are ignored.
    pub fn mark_failed(&self, subsystem: Subsystem, err: &anyhow::Error) {
        let was_failed = self.state(subsystem) == SubsystemState::Failed;
        if !was_failed {
            error!("{} subsystem failed: {:#}", subsystem.name(), err);
        }
        self.transition(subsystem, SubsystemState::Failed);
    }

    fn transition(&self, subsystem: Subsystem, next: SubsystemState) {
        let mut flags = self.flags.lock().expect("gate lock poisoned");
        let current = flags.get(subsystem);

        if !legal(current, next) {
            if current == SubsystemState::Failed {
                debug!(
                    "{} is Failed (terminal), ignoring transition to {:?}",
                    subsystem.name(),
                    next
                );
            } else {
                warn!(
                    "illegal {} transition {:?} → {:?}, ignoring",
                    subsystem.name(),
                    current,
                    next
                );
            }
            return;
        }

        flags.set(subsystem, next);
        let active = flags.all_ready();
        drop(flags);

        debug!("{} → {:?}", subsystem.name(), next);

        // Re-derive the composite on every transition.
        self.active_tx.send_if_modified(|value| {
            if *value != active {
                if active {
                    info!("✓ Pipeline active: all subsystems ready");
                } else {
                    info!("Pipeline inactive: {} no longer ready", subsystem.name());
                }
                *value = active;
                true
            } else {
                false
            }
        });
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

fn legal(current: SubsystemState, next: SubsystemState) -> bool {
    use SubsystemState::*;
    match (current, next) {
        (Failed, _) => false,
        (_, Failed) => true,
        (Idle, Loading) => true,
        (Idle, Ready) => true,
        (Loading, Ready) => true,
        (Ready, Idle) => true,
        (state, next) => state == next,
    }
}
