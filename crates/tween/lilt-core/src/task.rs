//! Arena record for one task.

use crate::cycle::{CycleMode, CycleState, Timing};
use crate::ease::Ease;
use crate::ids::{TaskHandle, TaskId};
use crate::scheduler::Scheduler;
use crate::shake::ShakeState;
use crate::target::{Binding, TargetKey};
use crate::time::Phase;
use crate::value::Value;

/// Fired when a task completes. Nested tasks fire every time they finish
/// while their sequence moves forward.
pub type CompleteFn = Box<dyn FnMut(&mut Scheduler, TaskHandle)>;
/// Fired after every value change with the value just produced.
pub type UpdateFn = Box<dyn FnMut(&mut Scheduler, TaskHandle, Value)>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Tween,
    Delay,
    /// Zero-length task whose only job is its completion callback.
    Callback,
    Sequence,
    Shake,
}

pub(crate) struct TaskSlot {
    pub id: TaskId,
    pub kind: TaskKind,
    pub phase: Phase,
    pub alive: bool,

    pub target: Option<Binding>,
    pub start: Value,
    pub diff: Value,
    pub current: Value,

    pub timing: Timing,
    pub ease: Ease,
    pub elapsed: f32,
    pub progress: f32,
    pub cycles_done: i32,
    pub state: CycleState,
    pub time_scale: f32,
    pub paused: bool,
    pub unscaled: bool,
    /// Set by the first step; a started task can no longer be nested.
    pub started: bool,
    /// Set while this task is being advanced.
    pub updating: bool,
    pub busy_reported: bool,

    pub on_complete: Option<CompleteFn>,
    pub on_update: Option<UpdateFn>,

    // sequence links (arena indices)
    pub parent: Option<u32>,
    pub first_child: Option<u32>,
    pub last_child: Option<u32>,
    pub prev_sibling: Option<u32>,
    pub next_sibling: Option<u32>,
    pub insert_time: f32,
    pub last_insert: f32,
    /// Last timeline position children were driven to.
    pub position: f32,

    pub shake: Option<Box<ShakeState>>,
}

impl TaskSlot {
    pub fn vacant() -> Self {
        Self {
            id: TaskId::NONE,
            kind: TaskKind::Delay,
            phase: Phase::Update,
            alive: false,
            target: None,
            start: Value::Float(0.0),
            diff: Value::Float(0.0),
            current: Value::Float(0.0),
            timing: Timing {
                duration: 0.0,
                start_delay: 0.0,
                end_delay: 0.0,
                cycles: 1,
                cycle_mode: CycleMode::Restart,
            },
            ease: Ease::Linear,
            elapsed: 0.0,
            progress: 0.0,
            cycles_done: 0,
            state: CycleState::Before,
            time_scale: 1.0,
            paused: false,
            unscaled: false,
            started: false,
            updating: false,
            busy_reported: false,
            on_complete: None,
            on_update: None,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            insert_time: 0.0,
            last_insert: 0.0,
            position: 0.0,
            shake: None,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.alive && !self.id.is_none()
    }

    #[inline]
    pub fn target_key(&self) -> Option<TargetKey> {
        self.target.as_ref().map(Binding::key)
    }

    #[inline]
    pub fn total_duration(&self) -> f32 {
        self.timing.total_duration()
    }

    /// Anything left over from a previous incarnation?
    #[cfg(test)]
    pub fn is_pristine(&self) -> bool {
        self.id.is_none()
            && !self.alive
            && self.target.is_none()
            && self.on_complete.is_none()
            && self.on_update.is_none()
            && self.parent.is_none()
            && self.first_child.is_none()
            && self.next_sibling.is_none()
            && self.prev_sibling.is_none()
            && self.shake.is_none()
    }
}
