//! Playback state - lifecycle phase plus the reactive readiness and position.

use std::cell::Cell;

use spark_signals::{signal, Signal};

/// Controller lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    /// `init` called, waiting for the first `ready`.
    Initializing,
    Ready,
    Destroyed,
}

/// Plain copy of the playback state at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackSnapshot {
    pub is_ready: bool,
    /// Seconds.
    pub position: f64,
    /// Last position the engine itself reported, in seconds.
    pub last_reported_position: f64,
}

/// Owned by the controller, mutated only by engine events and explicit loads.
pub(crate) struct PlaybackState {
    is_ready: Signal<bool>,
    position: Signal<f64>,
    last_reported: Cell<f64>,
    phase: Cell<Phase>,
    source_loading: Cell<bool>,
}

impl PlaybackState {
    pub(crate) fn new() -> Self {
        Self {
            is_ready: signal(false),
            position: signal(0.0),
            last_reported: Cell::new(0.0),
            phase: Cell::new(Phase::Uninitialized),
            source_loading: Cell::new(false),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.is_ready.get()
    }

    pub(crate) fn is_ready_signal(&self) -> Signal<bool> {
        self.is_ready.clone()
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        if self.is_ready.get() != ready {
            self.is_ready.set(ready);
        }
    }

    pub(crate) fn position(&self) -> f64 {
        self.position.get()
    }

    pub(crate) fn position_signal(&self) -> Signal<f64> {
        self.position.clone()
    }

    pub(crate) fn set_position(&self, seconds: f64) {
        self.position.set(seconds);
    }

    /// Position reported by the engine. The only writer of `last_reported`.
    pub(crate) fn report_position(&self, seconds: f64) {
        self.position.set(seconds);
        self.last_reported.set(seconds);
    }

    pub(crate) fn last_reported(&self) -> f64 {
        self.last_reported.get()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.set(phase);
    }

    pub(crate) fn is_source_loading(&self) -> bool {
        self.source_loading.get()
    }

    pub(crate) fn set_source_loading(&self, loading: bool) {
        self.source_loading.set(loading);
    }

    pub(crate) fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_ready: self.is_ready(),
            position: self.position(),
            last_reported_position: self.last_reported(),
        }
    }
}
