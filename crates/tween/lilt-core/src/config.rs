//! Scheduler configuration and per-task settings.

use serde::{Deserialize, Serialize};

use crate::cycle::CycleMode;
use crate::ease::Ease;
use crate::error::TweenError;
use crate::time::Phase;

/// Scheduler-wide configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Slots pre-allocated by [`crate::Scheduler::new`].
    pub initial_capacity: usize,
    /// Report [`TweenError::CapacityExceeded`] whenever the pool doubles.
    pub warn_on_capacity_growth: bool,
    /// Report [`TweenError::TargetDestroyed`] when a task outlives its target.
    pub warn_on_destroyed_target: bool,
    /// Maximum retained diagnostics; later ones are counted as dropped.
    pub max_diagnostics: usize,
    /// Ease substituted for [`Ease::Default`].
    pub default_ease: Ease,
    /// Seed of the master generator used by shakes.
    pub random_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 200,
            warn_on_capacity_growth: true,
            warn_on_destroyed_target: true,
            max_diagnostics: 1024,
            default_ease: Ease::OutQuad,
            random_seed: 0x5EED,
        }
    }
}

impl Config {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TweenError> {
        serde_json::from_str(json).map_err(|e| TweenError::Config {
            message: e.to_string(),
        })
    }
}

/// Timing and easing of a single tween or delay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    pub duration: f32,
    pub ease: Ease,
    /// Number of cycles; [`crate::INFINITE_CYCLES`] repeats forever.
    pub cycles: i32,
    pub cycle_mode: CycleMode,
    /// Applied at the start of every cycle.
    pub start_delay: f32,
    /// Applied at the end of every cycle.
    pub end_delay: f32,
    pub use_unscaled_time: bool,
    pub phase: Phase,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            duration: 1.0,
            ease: Ease::Default,
            cycles: 1,
            cycle_mode: CycleMode::Restart,
            start_delay: 0.0,
            end_delay: 0.0,
            use_unscaled_time: false,
            phase: Phase::Update,
        }
    }
}

impl TaskSettings {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_cycles(mut self, cycles: i32, mode: CycleMode) -> Self {
        self.cycles = cycles;
        self.cycle_mode = mode;
        self
    }

    pub fn with_delays(mut self, start: f32, end: f32) -> Self {
        self.start_delay = start;
        self.end_delay = end;
        self
    }

    pub fn with_unscaled_time(mut self, unscaled: bool) -> Self {
        self.use_unscaled_time = unscaled;
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

/// Settings of a sequence. Its duration is derived from its children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub cycles: i32,
    pub cycle_mode: CycleMode,
    /// Maps the sequence's own progress to its timeline position.
    pub ease: Ease,
    pub use_unscaled_time: bool,
    pub phase: Phase,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            cycles: 1,
            cycle_mode: CycleMode::Restart,
            ease: Ease::Linear,
            use_unscaled_time: false,
            phase: Phase::Update,
        }
    }
}

impl SequenceSettings {
    pub fn with_cycles(mut self, cycles: i32, mode: CycleMode) -> Self {
        self.cycles = cycles;
        self.cycle_mode = mode;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_unscaled_time(mut self, unscaled: bool) -> Self {
        self.use_unscaled_time = unscaled;
        self
    }
}
