//! Lilt Core (engine-agnostic)
//!
//! Pooled, allocation-free-per-frame scheduler for value tweens. The crate
//! defines the value model, easing and cycle math, an arena of task slots with
//! per-phase live/staged buffers, sequences that drive nested tasks along a
//! shared timeline, and procedural shakes.
//!
//! Hosts own a [`Scheduler`], create tasks bound to their objects through
//! [`Binding`], and call [`Scheduler::tick`] (or [`Scheduler::update`] per
//! phase) once per frame.

pub mod commands;
pub mod config;
pub mod cycle;
pub mod diagnostics;
pub mod ease;
pub mod error;
pub mod ids;
pub mod interp;
pub mod pool;
pub mod scheduler;
pub mod scratch;
pub mod sequence;
pub mod shake;
pub mod target;
pub mod task;
pub mod time;
pub mod value;

// Re-exports for hosts
pub use commands::BulkCommand;
pub use config::{Config, SequenceSettings, TaskSettings};
pub use cycle::{CycleMode, CycleState, INFINITE_CYCLES};
pub use diagnostics::Diagnostics;
pub use ease::{CustomCurve, Ease};
pub use error::TweenError;
pub use ids::{SequenceHandle, TaskHandle, TaskId};
pub use pool::PoolStats;
pub use scheduler::Scheduler;
pub use sequence::SequenceBuilder;
pub use shake::{Envelope, ShakeSettings};
pub use target::{Binding, TargetKey};
pub use task::{CompleteFn, TaskKind, UpdateFn};
pub use time::{FrameTime, Phase};
pub use value::{Value, ValueKind};
