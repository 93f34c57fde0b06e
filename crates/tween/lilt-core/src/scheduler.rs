//! Scheduler: owns the task arena and steps it phase by phase.
//!
//! Methods:
//! - creation: create_task, create_delay (sequences and shakes live in their own modules)
//! - stepping: tick, update
//! - handle ops: stop, complete, set_paused, set_time_scale, set_elapsed_time,
//!   on_complete, on_update, plus read-only queries
//! - bulk ops: stop_all, complete_all, set_paused_all, live_count

use std::panic::{catch_unwind, AssertUnwindSafe};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::commands::{BulkCommand, CommandQueue};
use crate::config::{Config, TaskSettings};
use crate::cycle::{self, CycleMode, CycleSample, CycleState, Timing};
use crate::diagnostics::Diagnostics;
use crate::ease::Ease;
use crate::error::TweenError;
use crate::ids::{IdAllocator, TaskHandle};
use crate::pool::{PhaseBucket, Pool, PoolStats};
use crate::scratch::Scratch;
use crate::target::{ApplyOutcome, Binding, TargetKey};
use crate::task::{CompleteFn, TaskKind, TaskSlot, UpdateFn};
use crate::time::{FrameTime, Phase};
use crate::value::Value;

/// Owner of every task. One instance per animation domain; there is no
/// global state.
pub struct Scheduler {
    pub(crate) cfg: Config,
    pub(crate) ids: IdAllocator,
    pub(crate) pool: Pool,
    pub(crate) phases: [PhaseBucket; 3],
    pub(crate) commands: CommandQueue,
    pub(crate) scratch: Scratch,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) rng: StdRng,
    /// Depth of steps, bulk operations and callback-firing handle
    /// operations currently on the stack.
    pub(crate) stepping: u32,
    /// Nonzero while a rewind parks children on an earlier cycle's end.
    pub(crate) muted: u32,
}

/// Everything needed to stage a fresh slot.
pub(crate) struct SlotInit {
    pub kind: TaskKind,
    pub phase: Phase,
    pub target: Option<Binding>,
    pub start: Value,
    pub diff: Value,
    pub timing: Timing,
    pub ease: Ease,
    pub unscaled: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Scheduler {
    pub fn new(cfg: Config) -> Self {
        let cap = cfg.initial_capacity;
        let per_phase = cap / 3 + 1;
        Self {
            ids: IdAllocator::new(),
            pool: Pool::with_capacity(cap),
            phases: [
                PhaseBucket::with_capacity(per_phase),
                PhaseBucket::with_capacity(per_phase),
                PhaseBucket::with_capacity(per_phase),
            ],
            commands: CommandQueue::default(),
            scratch: Scratch::with_capacity(32),
            diagnostics: Diagnostics::new(cfg.max_diagnostics),
            rng: StdRng::seed_from_u64(cfg.random_seed),
            stepping: 0,
            muted: 0,
            cfg,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Drain recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<TweenError> {
        self.diagnostics.drain()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Pre-allocate vacant slots so that `n` tasks fit without growth.
    pub fn set_pool_capacity(&mut self, n: usize) {
        log::debug!("pre-filling task pool to {n} slots");
        self.pool.prefill(n);
    }

    pub(crate) fn report(&mut self, err: TweenError) -> TweenError {
        self.diagnostics.report(err.clone());
        err
    }

    // ---------------------------------------------------------------------
    // creation
    // ---------------------------------------------------------------------

    /// Tween `target` from `start` to `end`. The start value is written to
    /// the target immediately; stepping begins with the next update of the
    /// task's phase.
    pub fn create_task(
        &mut self,
        target: Option<Binding>,
        start: Value,
        end: Value,
        settings: TaskSettings,
    ) -> Result<TaskHandle, TweenError> {
        let Some(diff) = Value::delta(&start, &end) else {
            return Err(self.report(TweenError::KindMismatch {
                start: start.kind(),
                end: end.kind(),
            }));
        };
        let timing = self.sanitize_timing(
            settings.duration,
            settings.start_delay,
            settings.end_delay,
            settings.cycles,
            settings.cycle_mode,
            false,
        );
        let ease = self.resolve_ease(settings.ease);
        Ok(self.spawn(SlotInit {
            kind: TaskKind::Tween,
            phase: settings.phase,
            target,
            start,
            diff,
            timing,
            ease,
            unscaled: settings.use_unscaled_time,
        }))
    }

    /// A task with no target. Its update value is the eased progress.
    pub fn create_delay(&mut self, settings: TaskSettings) -> TaskHandle {
        let timing = self.sanitize_timing(
            settings.duration,
            settings.start_delay,
            settings.end_delay,
            settings.cycles,
            settings.cycle_mode,
            false,
        );
        let ease = self.resolve_ease(settings.ease);
        self.spawn(SlotInit {
            kind: TaskKind::Delay,
            phase: settings.phase,
            target: None,
            start: Value::Float(0.0),
            diff: Value::Float(1.0),
            timing,
            ease,
            unscaled: settings.use_unscaled_time,
        })
    }

    /// Zero-length task that runs `f` once when reached.
    pub(crate) fn create_callback(&mut self, phase: Phase, f: CompleteFn) -> TaskHandle {
        let handle = self.spawn(SlotInit {
            kind: TaskKind::Callback,
            phase,
            target: None,
            start: Value::Float(0.0),
            diff: Value::Float(1.0),
            timing: Timing {
                duration: 0.0,
                start_delay: 0.0,
                end_delay: 0.0,
                cycles: 1,
                cycle_mode: CycleMode::Restart,
            },
            ease: Ease::Linear,
            unscaled: false,
        });
        self.pool.get_mut(handle.index).on_complete = Some(f);
        handle
    }

    pub(crate) fn spawn(&mut self, init: SlotInit) -> TaskHandle {
        let fetched = self.pool.fetch();
        if let Some((from, to)) = fetched.grew {
            if self.cfg.warn_on_capacity_growth {
                self.report(TweenError::CapacityExceeded { from, to });
            }
        }
        let index = fetched.index;
        let id = self.ids.alloc();
        let slot = self.pool.get_mut(index);
        *slot = TaskSlot::vacant();
        slot.id = id;
        slot.alive = true;
        slot.kind = init.kind;
        slot.phase = init.phase;
        slot.target = init.target;
        slot.start = init.start;
        slot.diff = init.diff;
        slot.current = init.start;
        slot.timing = init.timing;
        slot.ease = init.ease;
        slot.unscaled = init.unscaled;
        self.phases[init.phase.index()].stage(index);
        log::debug!("created {:?} task {:?} in {:?}", init.kind, id, init.phase);
        let handle = TaskHandle::new(index, id);
        self.apply_initial(index);
        handle
    }

    /// Write the progress-zero value without firing `on_update`.
    pub(crate) fn apply_initial(&mut self, index: u32) {
        let slot = self.pool.get_mut(index);
        let value = match slot.kind {
            TaskKind::Tween => {
                let eased = cycle::eased_progress(
                    &slot.ease,
                    slot.timing.cycle_mode,
                    &CycleSample::BEFORE,
                    slot.timing.cycles,
                    false,
                );
                slot.progress = eased;
                Value::evaluate(&slot.start, &slot.diff, eased)
            }
            TaskKind::Shake => slot.start,
            TaskKind::Delay | TaskKind::Callback | TaskKind::Sequence => return,
        };
        slot.current = value;
        self.apply_value(index, value);
    }

    pub(crate) fn sanitize_timing(
        &mut self,
        duration: f32,
        start_delay: f32,
        end_delay: f32,
        cycles: i32,
        mode: CycleMode,
        sequence: bool,
    ) -> Timing {
        let duration = if duration.is_finite() && duration >= 0.0 {
            duration
        } else {
            self.report(TweenError::InvalidDuration { value: duration });
            0.0
        };
        let delay = |d: f32, s: &mut Self| {
            if d.is_finite() && d >= 0.0 {
                d
            } else {
                s.report(TweenError::InvalidDelay { value: d });
                0.0
            }
        };
        let start_delay = delay(start_delay, self);
        let end_delay = delay(end_delay, self);
        let cycles = match cycles {
            0 => {
                self.report(TweenError::InvalidCycles {
                    value: 0,
                    substituted: 1,
                });
                1
            }
            c if c < cycle::INFINITE_CYCLES => {
                self.report(TweenError::InvalidCycles {
                    value: c,
                    substituted: cycle::INFINITE_CYCLES,
                });
                cycle::INFINITE_CYCLES
            }
            c => c,
        };
        let cycle_mode = match (mode, sequence) {
            (CycleMode::YoyoChildren, false) => {
                self.report(TweenError::UnsupportedCycleMode {
                    mode: "YoyoChildren".to_string(),
                    context: "a non-sequence task; using Yoyo".to_string(),
                });
                CycleMode::Yoyo
            }
            (CycleMode::Incremental, true) => {
                self.report(TweenError::UnsupportedCycleMode {
                    mode: "Incremental".to_string(),
                    context: "a sequence; using Restart".to_string(),
                });
                CycleMode::Restart
            }
            (m, _) => m,
        };
        Timing {
            duration,
            start_delay,
            end_delay,
            cycles,
            cycle_mode,
        }
    }

    /// Replace `Default` with the configured ease and fall back on malformed
    /// user curves.
    pub(crate) fn resolve_ease(&mut self, ease: Ease) -> Ease {
        let ease = match ease {
            Ease::Default => self.cfg.default_ease.clone(),
            e => e,
        };
        match ease.validate() {
            Ok(()) => ease,
            Err(e) => {
                self.report(e);
                match self.cfg.default_ease.validate() {
                    Ok(()) => self.cfg.default_ease.clone(),
                    Err(_) => Ease::Linear,
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // stepping
    // ---------------------------------------------------------------------

    /// Step every phase in order: fixed, regular, late.
    pub fn tick(&mut self, time: FrameTime) -> Result<(), TweenError> {
        for phase in Phase::ALL {
            self.update(phase, time)?;
        }
        Ok(())
    }

    /// Promote staged tasks, step live roots, recycle dead slots and run any
    /// bulk operations deferred during the step.
    pub fn update(&mut self, phase: Phase, time: FrameTime) -> Result<(), TweenError> {
        if self.stepping > 0 {
            return Err(self.report(TweenError::NestedUpdate));
        }
        self.stepping += 1;
        let p = phase.index();
        self.phases[p].promote(&mut self.pool);
        self.phases[p].lock += 1;
        let len = self.phases[p].live.len();
        for i in 0..len {
            let index = self.phases[p].live[i];
            self.step_root(index, &time);
        }
        self.phases[p].lock -= 1;
        self.phases[p].compact(&mut self.pool);
        self.stepping -= 1;
        self.drain_commands();
        Ok(())
    }

    fn step_root(&mut self, index: u32, time: &FrameTime) {
        let slot = self.pool.get_mut(index);
        if !slot.alive || slot.paused || slot.updating || slot.parent.is_some() {
            return;
        }
        let dt = time.pick(slot.unscaled) * slot.time_scale;
        let elapsed = (slot.elapsed + dt).max(0.0);
        slot.started = true;
        let handle = TaskHandle::new(index, slot.id);
        if self.advance(index, elapsed, dt >= 0.0, false) && self.is_current(handle) {
            self.finish(index);
        }
    }

    /// Move a task to `elapsed` in its own time. Returns true when the task
    /// reached its end while moving forward during this call.
    pub(crate) fn advance(
        &mut self,
        index: u32,
        elapsed: f32,
        forward: bool,
        reverse_ease: bool,
    ) -> bool {
        let slot = self.pool.get_mut(index);
        let handle = TaskHandle::new(index, slot.id);
        let was_after = slot.state == CycleState::After;
        slot.updating = true;
        slot.started = true;
        if slot.kind == TaskKind::Sequence {
            self.advance_sequence(index, elapsed, forward, reverse_ease);
        } else {
            self.advance_leaf(index, elapsed, forward, reverse_ease);
        }
        if !self.is_current(handle) {
            return false;
        }
        let slot = self.pool.get_mut(index);
        slot.updating = false;
        slot.alive && forward && !was_after && slot.state == CycleState::After
    }

    fn advance_leaf(&mut self, index: u32, elapsed: f32, forward: bool, reverse_ease: bool) {
        let slot = self.pool.get(index);
        let s = cycle::sample(&slot.timing, elapsed, slot.cycles_done, forward);
        let eased = cycle::eased_progress(
            &slot.ease,
            slot.timing.cycle_mode,
            &s,
            slot.timing.cycles,
            reverse_ease,
        );
        let changed =
            eased != slot.progress || s.cycles_done != slot.cycles_done || slot.kind == TaskKind::Shake;

        let slot = self.pool.get_mut(index);
        slot.elapsed = elapsed.clamp(0.0, slot.timing.total_duration());
        slot.cycles_done = s.cycles_done;
        slot.state = s.state;
        slot.progress = eased;
        if !changed {
            return;
        }
        let value = match slot.kind {
            TaskKind::Tween => Value::evaluate(&slot.start, &slot.diff, eased),
            TaskKind::Shake => {
                let rest = slot.start;
                let duration = slot.timing.duration;
                let offset = slot
                    .shake
                    .as_mut()
                    .map(|sh| sh.offset(s.t, s.state, duration))
                    .unwrap_or([0.0; 3]);
                rest.with_offset(offset).unwrap_or(rest)
            }
            TaskKind::Delay | TaskKind::Callback | TaskKind::Sequence => Value::Float(eased),
        };
        slot.current = value;
        if self.apply_value(index, value) {
            self.fire_update(index, value);
        }
    }

    /// Write a value into the task's target. Returns false if the task's
    /// tree was stopped as a result.
    pub(crate) fn apply_value(&mut self, index: u32, value: Value) -> bool {
        let slot = self.pool.get_mut(index);
        let id = slot.id;
        let Some(binding) = slot.target.as_mut() else {
            return true;
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| binding.apply(&value)));
        match outcome {
            Ok(ApplyOutcome::Applied) => true,
            Ok(ApplyOutcome::Busy) => {
                let slot = self.pool.get_mut(index);
                if !slot.busy_reported {
                    slot.busy_reported = true;
                    self.report(TweenError::TargetUnavailable { id });
                }
                true
            }
            Ok(ApplyOutcome::Destroyed) => {
                if self.cfg.warn_on_destroyed_target {
                    self.report(TweenError::TargetDestroyed { id });
                }
                self.emergency_stop(index);
                false
            }
            Err(payload) => {
                self.report(TweenError::CallbackPanicked {
                    id,
                    callback: "setter",
                    message: panic_message(payload.as_ref()),
                });
                self.emergency_stop(index);
                false
            }
        }
    }

    pub(crate) fn fire_update(&mut self, index: u32, value: Value) {
        let slot = self.pool.get_mut(index);
        let Some(mut f) = slot.on_update.take() else {
            return;
        };
        let handle = TaskHandle::new(index, slot.id);
        let result = catch_unwind(AssertUnwindSafe(|| f(self, handle, value)));
        if self.is_current(handle) {
            let slot = self.pool.get_mut(index);
            if slot.on_update.is_none() {
                slot.on_update = Some(f);
            }
        }
        if let Err(payload) = result {
            self.callback_panicked(handle, "on_update", payload.as_ref());
        }
    }

    pub(crate) fn fire_complete(&mut self, index: u32) {
        let slot = self.pool.get_mut(index);
        let Some(mut f) = slot.on_complete.take() else {
            return;
        };
        let handle = TaskHandle::new(index, slot.id);
        let result = catch_unwind(AssertUnwindSafe(|| f(self, handle)));
        if self.is_current(handle) {
            let slot = self.pool.get_mut(index);
            if slot.on_complete.is_none() {
                slot.on_complete = Some(f);
            }
        }
        if let Err(payload) = result {
            self.callback_panicked(handle, "on_complete", payload.as_ref());
        }
    }

    fn callback_panicked(
        &mut self,
        handle: TaskHandle,
        callback: &'static str,
        payload: &(dyn std::any::Any + Send),
    ) {
        self.report(TweenError::CallbackPanicked {
            id: handle.id,
            callback,
            message: panic_message(payload),
        });
        if self.is_current(handle) {
            self.emergency_stop(handle.index);
        }
    }

    /// Kill the whole tree containing `index`, without callbacks.
    pub(crate) fn emergency_stop(&mut self, index: u32) {
        let root = self.root_of(index);
        log::debug!("emergency stop of tree rooted at slot {root}");
        self.kill_tree(root);
    }

    pub(crate) fn root_of(&self, mut index: u32) -> u32 {
        while let Some(parent) = self.pool.get(index).parent {
            index = parent;
        }
        index
    }

    /// Mark `index` and all of its descendants dead. Slots are recycled by
    /// the next compaction of their phase.
    pub(crate) fn kill_tree(&mut self, index: u32) {
        let mut stack = self.scratch.take_stack();
        stack.push(index);
        while let Some(i) = stack.pop() {
            let slot = self.pool.get_mut(i);
            slot.alive = false;
            let mut child = slot.first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.pool.get(c).next_sibling;
            }
        }
        self.scratch.restore_stack(stack);
    }

    /// Kill, then fire `on_complete` once.
    pub(crate) fn finish(&mut self, index: u32) {
        self.kill_tree(index);
        self.fire_complete(index);
    }

    #[inline]
    pub(crate) fn is_current(&self, handle: TaskHandle) -> bool {
        self.pool
            .slots
            .get(handle.index as usize)
            .is_some_and(|s| s.id == handle.id && !s.id.is_none())
    }

    // ---------------------------------------------------------------------
    // handle resolution
    // ---------------------------------------------------------------------

    pub(crate) fn resolve(&mut self, handle: TaskHandle) -> Result<u32, TweenError> {
        if self.live_slot(handle).is_some() {
            Ok(handle.index)
        } else {
            Err(self.report(TweenError::InvalidHandle))
        }
    }

    /// Resolve a handle for an operation that changes playback state.
    pub(crate) fn resolve_mutable(&mut self, handle: TaskHandle) -> Result<u32, TweenError> {
        let index = self.resolve(handle)?;
        let slot = self.pool.get(index);
        let (nested, updating) = (slot.parent.is_some(), slot.updating);
        if nested {
            return Err(self.report(TweenError::NestedMutation { id: handle.id }));
        }
        if updating {
            return Err(self.report(TweenError::ReentrantMutation { id: handle.id }));
        }
        Ok(index)
    }

    /// Handle is current and the task has not been killed.
    #[inline]
    pub(crate) fn is_running(&self, handle: TaskHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    fn live_slot(&self, handle: TaskHandle) -> Option<&TaskSlot> {
        self.pool
            .slots
            .get(handle.index as usize)
            .filter(|s| s.is_live() && s.id == handle.id)
    }

    // ---------------------------------------------------------------------
    // handle operations
    // ---------------------------------------------------------------------

    /// Kill the task (and its children) without firing callbacks.
    pub fn stop(&mut self, handle: impl Into<TaskHandle>) -> Result<(), TweenError> {
        let index = self.resolve_mutable(handle.into())?;
        self.kill_tree(index);
        Ok(())
    }

    /// Jump to the end, apply the final value and fire `on_complete`.
    /// Infinite tasks end their current cycle.
    pub fn complete(&mut self, handle: impl Into<TaskHandle>) -> Result<(), TweenError> {
        let index = self.resolve_mutable(handle.into())?;
        self.guarded(|s| s.complete_index(index));
        Ok(())
    }

    pub(crate) fn complete_index(&mut self, index: u32) {
        let slot = self.pool.get_mut(index);
        let handle = TaskHandle::new(index, slot.id);
        if slot.timing.is_infinite() {
            // the running cycle becomes the last one
            let s = cycle::sample(&slot.timing, slot.elapsed, slot.cycles_done, true);
            slot.timing.cycles = s.cycles_done.saturating_add(1).max(1);
        }
        let end = slot.timing.total_duration();
        if slot.state != CycleState::After {
            self.advance(index, end, true, false);
        }
        if self.is_running(handle) {
            self.finish(index);
        }
    }

    /// Pause or resume. Resuming a task that already sits at its end with a
    /// positive time scale finishes it.
    pub fn set_paused(&mut self, handle: impl Into<TaskHandle>, paused: bool) -> Result<(), TweenError> {
        let index = self.resolve_mutable(handle.into())?;
        self.guarded(|s| s.set_paused_index(index, paused));
        Ok(())
    }

    pub(crate) fn set_paused_index(&mut self, index: u32, paused: bool) {
        let slot = self.pool.get_mut(index);
        slot.paused = paused;
        if !paused && slot.state == CycleState::After && slot.time_scale > 0.0 {
            self.finish(index);
        }
    }

    /// Negative scales play backwards. Non-finite scales are rejected.
    pub fn set_time_scale(&mut self, handle: impl Into<TaskHandle>, scale: f32) -> Result<(), TweenError> {
        let index = self.resolve_mutable(handle.into())?;
        if !scale.is_finite() {
            return Err(self.report(TweenError::InvalidTimeScale { value: scale }));
        }
        self.pool.get_mut(index).time_scale = scale;
        Ok(())
    }

    /// Seek. Negative or NaN times are clamped to 0 and reported; times past
    /// the end complete the task unless it is paused.
    pub fn set_elapsed_time(&mut self, handle: impl Into<TaskHandle>, time: f32) -> Result<(), TweenError> {
        let index = self.resolve_mutable(handle.into())?;
        let time = if time.is_nan() || time < 0.0 {
            self.report(TweenError::InvalidTime { value: time });
            0.0
        } else {
            time
        };
        self.guarded(|s| s.seek_index(index, time));
        Ok(())
    }

    fn seek_index(&mut self, index: u32, time: f32) {
        let slot = self.pool.get(index);
        let handle = TaskHandle::new(index, slot.id);
        let time = time.min(slot.timing.total_duration());
        let forward = time >= slot.elapsed;
        self.advance(index, time, forward, false);
        if !self.is_current(handle) {
            return;
        }
        let slot = self.pool.get(index);
        if slot.alive && slot.state == CycleState::After && !slot.paused {
            self.finish(index);
        }
    }

    /// Run a handle operation that may advance tasks or fire callbacks as a
    /// step: nested updates are rejected and bulk calls wait until it ends.
    fn guarded<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        self.stepping += 1;
        let out = op(self);
        self.stepping -= 1;
        self.drain_commands();
        out
    }

    /// Register the completion callback. Allowed on nested tasks.
    pub fn on_complete(
        &mut self,
        handle: impl Into<TaskHandle>,
        f: impl FnMut(&mut Scheduler, TaskHandle) + 'static,
    ) -> Result<(), TweenError> {
        let handle = handle.into();
        let index = self.resolve(handle)?;
        if self.pool.get(index).on_complete.is_some() {
            return Err(self.report(TweenError::DuplicateCallback {
                id: handle.id,
                callback: "on_complete",
            }));
        }
        self.pool.get_mut(index).on_complete = Some(Box::new(f));
        Ok(())
    }

    /// Register the per-change callback. Allowed on nested tasks.
    pub fn on_update(
        &mut self,
        handle: impl Into<TaskHandle>,
        f: impl FnMut(&mut Scheduler, TaskHandle, Value) + 'static,
    ) -> Result<(), TweenError> {
        let handle = handle.into();
        let index = self.resolve(handle)?;
        if self.pool.get(index).on_update.is_some() {
            return Err(self.report(TweenError::DuplicateCallback {
                id: handle.id,
                callback: "on_update",
            }));
        }
        let f: UpdateFn = Box::new(f);
        self.pool.get_mut(index).on_update = Some(f);
        Ok(())
    }

    // queries

    pub fn is_alive(&self, handle: impl Into<TaskHandle>) -> bool {
        self.live_slot(handle.into()).is_some()
    }

    pub fn is_paused(&self, handle: impl Into<TaskHandle>) -> bool {
        self.live_slot(handle.into()).is_some_and(|s| s.paused)
    }

    pub fn elapsed_time(&self, handle: impl Into<TaskHandle>) -> Option<f32> {
        self.live_slot(handle.into()).map(|s| s.elapsed)
    }

    /// Eased progress including the cycle mode (may leave [0, 1]).
    pub fn progress(&self, handle: impl Into<TaskHandle>) -> Option<f32> {
        self.live_slot(handle.into()).map(|s| s.progress)
    }

    pub fn cycles_done(&self, handle: impl Into<TaskHandle>) -> Option<i32> {
        self.live_slot(handle.into()).map(|s| s.cycles_done)
    }

    /// Length of one cycle without delays. For sequences this is the span.
    pub fn duration(&self, handle: impl Into<TaskHandle>) -> Option<f32> {
        self.live_slot(handle.into()).map(|s| s.timing.duration)
    }

    pub fn total_duration(&self, handle: impl Into<TaskHandle>) -> Option<f32> {
        self.live_slot(handle.into()).map(|s| s.total_duration())
    }

    pub fn time_scale(&self, handle: impl Into<TaskHandle>) -> Option<f32> {
        self.live_slot(handle.into()).map(|s| s.time_scale)
    }

    /// Last value produced. Sequences report their elapsed time.
    pub fn current_value(&self, handle: impl Into<TaskHandle>) -> Option<Value> {
        self.live_slot(handle.into()).map(|s| s.current)
    }

    // ---------------------------------------------------------------------
    // bulk operations
    // ---------------------------------------------------------------------

    /// Stop every root task, or only those bound to `target`. Returns how
    /// many were stopped; calls made during a step are deferred and return 0.
    pub fn stop_all(&mut self, target: Option<TargetKey>) -> usize {
        self.bulk(BulkCommand::StopAll { target })
    }

    pub fn complete_all(&mut self, target: Option<TargetKey>) -> usize {
        self.bulk(BulkCommand::CompleteAll { target })
    }

    pub fn set_paused_all(&mut self, paused: bool, target: Option<TargetKey>) -> usize {
        self.bulk(BulkCommand::SetPausedAll { paused, target })
    }

    /// Tasks alive right now, nested and staged ones included.
    pub fn live_count(&self, target: Option<TargetKey>) -> usize {
        self.pool
            .slots
            .iter()
            .filter(|s| s.is_live())
            .filter(|s| target.is_none() || s.target_key() == target)
            .count()
    }

    fn bulk(&mut self, cmd: BulkCommand) -> usize {
        if self.stepping > 0 {
            self.commands.push(cmd);
            return 0;
        }
        let n = self.execute(cmd);
        self.drain_commands();
        n
    }

    fn drain_commands(&mut self) {
        while self.stepping == 0 {
            let Some(cmd) = self.commands.pop() else {
                break;
            };
            self.execute(cmd);
        }
    }

    fn execute(&mut self, cmd: BulkCommand) -> usize {
        self.stepping += 1;
        let target = cmd.target();
        let mut handles = self.scratch.take_handles();
        handles.extend(
            self.pool
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_live() && s.parent.is_none() && !s.updating)
                .filter(|(_, s)| target.is_none() || s.target_key() == target)
                .map(|(i, s)| TaskHandle::new(i as u32, s.id)),
        );
        let mut count = 0;
        for &handle in &handles {
            // earlier entries may have killed this one through a callback
            let slot = self.pool.get(handle.index);
            if !self.is_current(handle) || !slot.alive || slot.updating {
                continue;
            }
            match cmd {
                BulkCommand::StopAll { .. } => self.kill_tree(handle.index),
                BulkCommand::CompleteAll { .. } => self.complete_index(handle.index),
                BulkCommand::SetPausedAll { paused, .. } => {
                    self.set_paused_index(handle.index, paused)
                }
            }
            count += 1;
        }
        self.scratch.restore_handles(handles);
        self.stepping -= 1;
        log::debug!("{cmd:?} affected {count} tasks");
        count
    }
}
