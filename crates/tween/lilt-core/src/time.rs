//! Frame time and update phases.

use serde::{Deserialize, Serialize};

/// Update phase a task is stepped in. A task keeps its phase for life.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    FixedUpdate,
    #[default]
    Update,
    LateUpdate,
}

impl Phase {
    /// Order in which [`crate::Scheduler::tick`] steps phases.
    pub const ALL: [Phase; 3] = [Phase::FixedUpdate, Phase::Update, Phase::LateUpdate];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Phase::FixedUpdate => 0,
            Phase::Update => 1,
            Phase::LateUpdate => 2,
        }
    }
}

/// Clock deltas for one step, in seconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Delta affected by the host's global time scale.
    pub delta: f32,
    /// Real-time delta, used by tasks with `use_unscaled_time`.
    pub unscaled_delta: f32,
}

impl FrameTime {
    pub fn new(delta: f32, unscaled_delta: f32) -> Self {
        Self {
            delta,
            unscaled_delta,
        }
    }

    /// Same delta on both clocks.
    pub fn uniform(dt: f32) -> Self {
        Self::new(dt, dt)
    }

    #[inline]
    pub(crate) fn pick(&self, unscaled: bool) -> f32 {
        let dt = if unscaled {
            self.unscaled_delta
        } else {
            self.delta
        };
        if dt.is_finite() {
            dt
        } else {
            0.0
        }
    }
}
