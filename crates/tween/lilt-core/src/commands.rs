//! Bulk operations deferred while a step is in progress.
//!
//! Callbacks may call `stop_all` and friends while the scheduler is iterating
//! a live buffer. Those calls are queued here and drained, in order, once the
//! outermost step returns.

use std::collections::VecDeque;

use crate::target::TargetKey;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BulkCommand {
    StopAll { target: Option<TargetKey> },
    CompleteAll { target: Option<TargetKey> },
    SetPausedAll { paused: bool, target: Option<TargetKey> },
}

impl BulkCommand {
    pub fn target(&self) -> Option<TargetKey> {
        match *self {
            BulkCommand::StopAll { target }
            | BulkCommand::CompleteAll { target }
            | BulkCommand::SetPausedAll { target, .. } => target,
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<BulkCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, cmd: BulkCommand) {
        log::debug!("deferring {cmd:?} until the current step finishes");
        self.pending.push_back(cmd);
    }

    pub fn pop(&mut self) -> Option<BulkCommand> {
        self.pending.pop_front()
    }
}
