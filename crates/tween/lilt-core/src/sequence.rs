//! Sequences: tasks whose value is time and whose step drives their children.
//!
//! A sequence keeps its children as an intrusive doubly linked list of arena
//! indices, ordered by insertion. Each child carries the time it was inserted
//! at; the sequence's span is the latest end time among them.

use crate::config::{SequenceSettings, TaskSettings};
use crate::cycle::{self, CycleMode, CycleSample, CycleState};
use crate::ease::Ease;
use crate::error::TweenError;
use crate::ids::{SequenceHandle, TaskHandle};
use crate::scheduler::{Scheduler, SlotInit};
use crate::task::TaskKind;
use crate::value::Value;

#[derive(Copy, Clone, Debug)]
enum Placement {
    /// After everything inserted so far.
    Chain,
    /// Alongside the most recently inserted item.
    Group,
    At(f32),
}

impl Scheduler {
    pub fn create_sequence(&mut self, settings: SequenceSettings) -> SequenceHandle {
        let timing = self.sanitize_timing(
            0.0,
            0.0,
            0.0,
            settings.cycles,
            settings.cycle_mode,
            true,
        );
        let ease = self.resolve_ease(settings.ease);
        let handle = self.spawn(SlotInit {
            kind: TaskKind::Sequence,
            phase: settings.phase,
            target: None,
            start: Value::Float(0.0),
            diff: Value::Float(0.0),
            timing,
            ease,
            unscaled: settings.use_unscaled_time,
        });
        SequenceHandle(handle)
    }

    /// Create a sequence and return a fluent builder for it.
    pub fn build_sequence(&mut self, settings: SequenceSettings) -> SequenceBuilder<'_> {
        let seq = self.create_sequence(settings);
        SequenceBuilder {
            scheduler: self,
            seq,
        }
    }

    /// Append `child` after the current end of the sequence.
    pub fn chain(
        &mut self,
        seq: SequenceHandle,
        child: impl Into<TaskHandle>,
    ) -> Result<(), TweenError> {
        self.add_child(seq, child.into(), Placement::Chain)
    }

    /// Start `child` together with the most recently added item.
    pub fn group(
        &mut self,
        seq: SequenceHandle,
        child: impl Into<TaskHandle>,
    ) -> Result<(), TweenError> {
        self.add_child(seq, child.into(), Placement::Group)
    }

    /// Start `child` at an arbitrary time. Non-finite or negative times become 0.
    pub fn insert(
        &mut self,
        seq: SequenceHandle,
        at: f32,
        child: impl Into<TaskHandle>,
    ) -> Result<(), TweenError> {
        let at = self.sanitize_insert_time(at);
        self.add_child(seq, child.into(), Placement::At(at))
    }

    /// Append a callback that runs each time the sequence passes it moving
    /// forward.
    pub fn chain_callback(
        &mut self,
        seq: SequenceHandle,
        f: impl FnMut(&mut Scheduler) + 'static,
    ) -> Result<TaskHandle, TweenError> {
        self.callback_child(seq, Placement::Chain, f)
    }

    pub fn insert_callback(
        &mut self,
        seq: SequenceHandle,
        at: f32,
        f: impl FnMut(&mut Scheduler) + 'static,
    ) -> Result<TaskHandle, TweenError> {
        let at = self.sanitize_insert_time(at);
        self.callback_child(seq, Placement::At(at), f)
    }

    fn sanitize_insert_time(&mut self, at: f32) -> f32 {
        if at.is_finite() && at >= 0.0 {
            at
        } else {
            self.report(TweenError::InvalidTime { value: at });
            0.0
        }
    }

    /// Append an empty interval.
    pub fn chain_delay(
        &mut self,
        seq: SequenceHandle,
        duration: f32,
    ) -> Result<TaskHandle, TweenError> {
        let index = self.resolve(seq.0)?;
        let phase = self.pool.get(index).phase;
        let delay = self.create_delay(
            TaskSettings::new(duration)
                .with_ease(Ease::Linear)
                .with_phase(phase),
        );
        if let Err(e) = self.chain(seq, delay) {
            self.kill_tree(delay.index);
            return Err(e);
        }
        Ok(delay)
    }

    fn callback_child(
        &mut self,
        seq: SequenceHandle,
        placement: Placement,
        mut f: impl FnMut(&mut Scheduler) + 'static,
    ) -> Result<TaskHandle, TweenError> {
        let index = self.resolve(seq.0)?;
        let phase = self.pool.get(index).phase;
        let cb = self.create_callback(
            phase,
            Box::new(move |sched: &mut Scheduler, _: TaskHandle| f(sched)),
        );
        if let Err(e) = self.add_child(seq, cb, placement) {
            // never stepped, so it never fires
            self.kill_tree(cb.index);
            return Err(e);
        }
        Ok(cb)
    }

    fn add_child(
        &mut self,
        seq: SequenceHandle,
        child: TaskHandle,
        placement: Placement,
    ) -> Result<(), TweenError> {
        let s = self.resolve(seq.0)?;
        let sid = seq.0.id;
        let (kind, nested, updating, started, phase, span, last_insert, last_child) = {
            let slot = self.pool.get(s);
            (
                slot.kind,
                slot.parent.is_some(),
                slot.updating,
                slot.started,
                slot.phase,
                slot.timing.duration,
                slot.last_insert,
                slot.last_child,
            )
        };
        if kind != TaskKind::Sequence {
            return Err(self.report(TweenError::NotASequence { id: sid }));
        }
        if nested {
            return Err(self.report(TweenError::NestedMutation { id: sid }));
        }
        if updating {
            return Err(self.report(TweenError::ReentrantMutation { id: sid }));
        }
        if started {
            return Err(self.report(TweenError::SequenceStarted { id: sid }));
        }

        let c = self.resolve(child)?;
        if c == s {
            return Err(self.report(TweenError::SelfInsertion { id: sid }));
        }
        let (c_parent, c_started, c_phase, c_infinite, c_total) = {
            let slot = self.pool.get(c);
            (
                slot.parent.is_some(),
                slot.started,
                slot.phase,
                slot.timing.is_infinite(),
                slot.total_duration(),
            )
        };
        if c_parent {
            return Err(self.report(TweenError::AlreadyInSequence { id: child.id }));
        }
        if c_started {
            return Err(self.report(TweenError::AlreadyStarted { id: child.id }));
        }
        if c_phase != phase {
            return Err(self.report(TweenError::PhaseMismatch {
                sequence: phase,
                child: c_phase,
            }));
        }
        if c_infinite {
            return Err(self.report(TweenError::InfiniteChild { id: child.id }));
        }

        let at = match placement {
            Placement::Chain => span,
            Placement::Group => last_insert,
            Placement::At(t) => t,
        };

        {
            let cs = self.pool.get_mut(c);
            cs.parent = Some(s);
            cs.insert_time = at;
            cs.prev_sibling = last_child;
            cs.next_sibling = None;
        }
        match last_child {
            Some(last) => self.pool.get_mut(last).next_sibling = Some(c),
            None => self.pool.get_mut(s).first_child = Some(c),
        }
        let ss = self.pool.get_mut(s);
        ss.last_child = Some(c);
        ss.last_insert = at;
        ss.timing.duration = span.max(at + c_total);
        log::debug!(
            "inserted {:?} into sequence {:?} at {at}, span now {}",
            child.id,
            sid,
            ss.timing.duration
        );

        // a later child wrote its start value on creation; restore the ones
        // that actually play first
        if at > 0.0 {
            self.reapply_time_zero(s);
        }
        Ok(())
    }

    fn reapply_time_zero(&mut self, seq: u32) {
        let mut cur = self.pool.get(seq).first_child;
        while let Some(child) = cur {
            let slot = self.pool.get(child);
            cur = slot.next_sibling;
            if slot.insert_time != 0.0 {
                continue;
            }
            if slot.kind == TaskKind::Sequence {
                self.reapply_time_zero(child);
            } else {
                self.apply_initial(child);
            }
        }
    }

    /// Timeline position at the start (`t = 0`) or end (`t = 1`) of cycle `c`.
    fn edge_position(&self, seq: u32, c: i32, t: f32, reverse_ease: bool) -> f32 {
        let slot = self.pool.get(seq);
        let s = CycleSample {
            cycles_done: c,
            t,
            state: CycleState::Running,
        };
        let eased = cycle::eased_progress(
            &slot.ease,
            slot.timing.cycle_mode,
            &s,
            slot.timing.cycles,
            reverse_ease,
        );
        eased * slot.timing.duration
    }

    pub(crate) fn advance_sequence(
        &mut self,
        index: u32,
        elapsed: f32,
        forward: bool,
        reverse_ease: bool,
    ) {
        let slot = self.pool.get(index);
        let handle = TaskHandle::new(index, slot.id);
        let timing = slot.timing;
        let s = cycle::sample(&timing, elapsed, slot.cycles_done, forward);
        let eased = cycle::eased_progress(
            &slot.ease,
            timing.cycle_mode,
            &s,
            timing.cycles,
            reverse_ease,
        );
        let changed = eased != slot.progress || s.cycles_done != slot.cycles_done;
        let last_cycle = (timing.cycles - 1).max(0);
        let c_old = if slot.state == CycleState::After {
            last_cycle
        } else {
            slot.cycles_done
        };
        let c_new = if s.state == CycleState::After {
            last_cycle
        } else {
            s.cycles_done
        };
        let restart = timing.cycle_mode == CycleMode::Restart;

        // visit every crossed boundary so no child misses its end
        if c_new > c_old {
            for c in c_old..c_new {
                let end = self.edge_position(index, c, 1.0, reverse_ease);
                if !self.drive_children(handle, end, c, reverse_ease, None) {
                    return;
                }
                let start = self.edge_position(index, c + 1, 0.0, reverse_ease);
                let force = restart.then_some(false);
                if !self.drive_children(handle, start, c + 1, reverse_ease, force) {
                    return;
                }
            }
        } else if c_new < c_old {
            for c in ((c_new + 1)..=c_old).rev() {
                let start = self.edge_position(index, c, 0.0, reverse_ease);
                if !self.drive_children(handle, start, c, reverse_ease, None) {
                    return;
                }
                let end = self.edge_position(index, c - 1, 1.0, reverse_ease);
                let force = restart.then_some(true);
                // children land on the end edge, but nothing completes moving back
                self.muted += 1;
                let running = self.drive_children(handle, end, c - 1, reverse_ease, force);
                self.muted -= 1;
                if !running {
                    return;
                }
            }
        }

        // zero-length endless sequences only ever sit on a boundary
        let degenerate = timing.is_infinite() && timing.cycle_duration() <= 0.0;
        if !degenerate {
            let pos = eased * timing.duration;
            if !self.drive_children(handle, pos, c_new, reverse_ease, None) {
                return;
            }
        }

        let slot = self.pool.get_mut(index);
        slot.elapsed = elapsed.clamp(0.0, timing.total_duration());
        slot.cycles_done = s.cycles_done;
        slot.state = s.state;
        slot.progress = eased;
        let value = Value::Float(slot.elapsed);
        slot.current = value;
        if changed {
            self.fire_update(index, value);
        }
    }

    /// Drive every child of `seq` to timeline position `pos`. Returns false
    /// if the sequence's tree died along the way.
    fn drive_children(
        &mut self,
        seq: TaskHandle,
        pos: f32,
        c: i32,
        reverse_ease: bool,
        force_forward: Option<bool>,
    ) -> bool {
        let slot = self.pool.get_mut(seq.index);
        let mode = slot.timing.cycle_mode;
        let old = slot.position;
        let forward = force_forward.unwrap_or(if pos > old {
            true
        } else if pos < old {
            false
        } else {
            cycle::cycle_forward(mode, c)
        });
        slot.position = pos;
        let child_reverse = reverse_ease ^ (mode == CycleMode::YoyoChildren && c % 2 != 0);

        let mut cur = if forward {
            slot.first_child
        } else {
            slot.last_child
        };
        while let Some(child) = cur {
            let cs = self.pool.get(child);
            cur = if forward {
                cs.next_sibling
            } else {
                cs.prev_sibling
            };
            self.drive_child(child, pos, forward, child_reverse);
            if !self.is_running(seq) {
                return false;
            }
        }
        true
    }

    fn drive_child(&mut self, child: u32, pos: f32, forward: bool, reverse_ease: bool) {
        let cs = self.pool.get(child);
        if !cs.alive {
            return;
        }
        let total = cs.total_duration();
        let local = pos - cs.insert_time;
        let before_region = local < 0.0 || (local <= 0.0 && !forward);
        if before_region && cs.state == CycleState::Before {
            return;
        }
        if !before_region && local >= total && cs.state == CycleState::After {
            return;
        }
        let handle = TaskHandle::new(child, cs.id);
        if self.advance(child, local.min(total), forward, reverse_ease)
            && self.muted == 0
            && self.is_current(handle)
        {
            self.fire_complete(child);
        }
    }
}

/// Fluent sequence construction. Errors are reported to diagnostics and the
/// offending step is skipped.
pub struct SequenceBuilder<'a> {
    scheduler: &'a mut Scheduler,
    seq: SequenceHandle,
}

impl<'a> SequenceBuilder<'a> {
    pub fn handle(&self) -> SequenceHandle {
        self.seq
    }

    pub fn chain(self, child: impl Into<TaskHandle>) -> Self {
        let _ = self.scheduler.chain(self.seq, child);
        self
    }

    pub fn group(self, child: impl Into<TaskHandle>) -> Self {
        let _ = self.scheduler.group(self.seq, child);
        self
    }

    pub fn insert(self, at: f32, child: impl Into<TaskHandle>) -> Self {
        let _ = self.scheduler.insert(self.seq, at, child);
        self
    }

    /// Create a task with the scheduler and chain it.
    pub fn chain_with(
        self,
        make: impl FnOnce(&mut Scheduler) -> Result<TaskHandle, TweenError>,
    ) -> Self {
        if let Ok(child) = make(self.scheduler) {
            let _ = self.scheduler.chain(self.seq, child);
        }
        self
    }

    /// Create a task with the scheduler and group it with the last item.
    pub fn group_with(
        self,
        make: impl FnOnce(&mut Scheduler) -> Result<TaskHandle, TweenError>,
    ) -> Self {
        if let Ok(child) = make(self.scheduler) {
            let _ = self.scheduler.group(self.seq, child);
        }
        self
    }

    pub fn callback(self, f: impl FnMut(&mut Scheduler) + 'static) -> Self {
        let _ = self.scheduler.chain_callback(self.seq, f);
        self
    }

    pub fn delay(self, duration: f32) -> Self {
        let _ = self.scheduler.chain_delay(self.seq, duration);
        self
    }

    pub fn build(self) -> SequenceHandle {
        self.seq
    }
}
