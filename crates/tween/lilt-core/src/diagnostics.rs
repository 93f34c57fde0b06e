//! Bounded record of reported errors.

use serde::Serialize;

use crate::error::TweenError;

#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<TweenError>,
    /// Entries dropped because the list was full.
    pub dropped: usize,
    #[serde(skip)]
    cap: usize,
}

impl Diagnostics {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap.min(64)),
            dropped: 0,
            cap,
        }
    }

    /// Log the error and keep it if there is room.
    pub fn report(&mut self, err: TweenError) {
        if err.is_severe() {
            log::error!("{err}");
        } else {
            log::warn!("{err}");
        }
        if self.entries.len() < self.cap {
            self.entries.push(err);
        } else {
            self.dropped += 1;
        }
    }

    pub fn entries(&self) -> &[TweenError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pred: impl Fn(&TweenError) -> bool) -> bool {
        self.entries.iter().any(pred)
    }

    /// Remove and return all entries, resetting the dropped counter.
    pub fn drain(&mut self) -> Vec<TweenError> {
        self.dropped = 0;
        std::mem::take(&mut self.entries)
    }
}
