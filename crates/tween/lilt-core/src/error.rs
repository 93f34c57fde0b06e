//! Error taxonomy shared by every scheduler operation.

use serde::Serialize;
use thiserror::Error;

use crate::ids::TaskId;
use crate::time::Phase;
use crate::value::ValueKind;

/// Everything the scheduler can report.
///
/// Configuration errors are recoverable (a safe default is substituted and the
/// call proceeds). Misuse errors leave state unchanged and are returned as
/// `Err`. Both kinds are recorded in [`crate::Diagnostics`].
#[derive(Clone, Debug, Error, PartialEq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum TweenError {
    // configuration
    #[error("invalid duration {value}; using 0")]
    InvalidDuration { value: f32 },
    #[error("invalid delay {value}; using 0")]
    InvalidDelay { value: f32 },
    #[error("invalid cycle count {value}; using {substituted}")]
    InvalidCycles { value: i32, substituted: i32 },
    #[error("cycle mode {mode} is not supported for {context}")]
    UnsupportedCycleMode { mode: String, context: String },
    #[error("malformed curve: {reason}")]
    MalformedCurve { reason: String },
    #[error("invalid shake frequency {value}; using {substituted}")]
    InvalidFrequency { value: f32, substituted: f32 },
    #[error("asymmetry {value} outside [0, 1]")]
    InvalidAsymmetry { value: f32 },
    #[error("invalid time scale {value}")]
    InvalidTimeScale { value: f32 },
    #[error("invalid time {value}")]
    InvalidTime { value: f32 },
    #[error("config parse error: {message}")]
    Config { message: String },

    // target lifetime
    #[error("target of task {id:?} was destroyed; stopping its tree")]
    TargetDestroyed { id: TaskId },
    #[error("target of task {id:?} is already borrowed; value skipped")]
    TargetUnavailable { id: TaskId },

    // misuse
    #[error("handle does not refer to a live task")]
    InvalidHandle,
    #[error("task {id:?} is not a sequence")]
    NotASequence { id: TaskId },
    #[error("task {id:?} is nested in a sequence; control its root instead")]
    NestedMutation { id: TaskId },
    #[error("task {id:?} is being stepped; mutation ignored")]
    ReentrantMutation { id: TaskId },
    #[error("task {id:?} already belongs to a sequence")]
    AlreadyInSequence { id: TaskId },
    #[error("task {id:?} has already started")]
    AlreadyStarted { id: TaskId },
    #[error("sequence {id:?} has already started")]
    SequenceStarted { id: TaskId },
    #[error("sequence {id:?} cannot contain itself")]
    SelfInsertion { id: TaskId },
    #[error("task {id:?} has infinite cycles and cannot be nested")]
    InfiniteChild { id: TaskId },
    #[error("phase mismatch: sequence runs in {sequence:?}, child in {child:?}")]
    PhaseMismatch { sequence: Phase, child: Phase },
    #[error("value kind mismatch: {start:?} vs {end:?}")]
    KindMismatch { start: ValueKind, end: ValueKind },
    #[error("shakes cannot animate {kind:?}")]
    UnsupportedShakeKind { kind: ValueKind },
    #[error("task {id:?} already has an {callback} callback")]
    DuplicateCallback { id: TaskId, callback: &'static str },
    #[error("update called from inside a step")]
    NestedUpdate,

    // callbacks
    #[error("{callback} callback of task {id:?} panicked: {message}")]
    CallbackPanicked {
        id: TaskId,
        callback: &'static str,
        message: String,
    },

    // resources
    #[error("task pool grew from {from} to {to}")]
    CapacityExceeded { from: usize, to: usize },
}

impl TweenError {
    /// Panics are logged at error level; everything else is a warning.
    pub fn is_severe(&self) -> bool {
        matches!(self, TweenError::CallbackPanicked { .. })
    }
}
