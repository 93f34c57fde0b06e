//! Cycle math: maps elapsed time onto (cycles done, in-cycle progress, state)
//! and folds cycle modes into eased progress.

use serde::{Deserialize, Serialize};

use crate::ease::Ease;

/// Sentinel cycle count meaning "repeat forever".
pub const INFINITE_CYCLES: i32 = -1;

/// How consecutive cycles relate to each other.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleMode {
    /// Every cycle runs start → end.
    #[default]
    Restart,
    /// Each cycle continues from where the previous ended (progress keeps growing).
    Incremental,
    /// Odd cycles run end → start, mirroring the ease.
    Yoyo,
    /// Odd cycles play the forward cycle backwards in time.
    Rewind,
    /// Sequence only: like `Yoyo`, but children also reverse their own eases.
    YoyoChildren,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleState {
    /// Elapsed is before the first cycle's start.
    Before,
    Running,
    /// All finite cycles are done.
    After,
}

/// Timing description shared by every task kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Timing {
    pub duration: f32,
    pub start_delay: f32,
    pub end_delay: f32,
    pub cycles: i32,
    pub cycle_mode: CycleMode,
}

impl Timing {
    /// Length of one cycle including both delays.
    #[inline]
    pub fn cycle_duration(&self) -> f32 {
        self.start_delay + self.duration + self.end_delay
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.cycles < 0
    }

    /// Sum over all cycles, `f32::INFINITY` for infinite tasks.
    pub fn total_duration(&self) -> f32 {
        if self.is_infinite() {
            f32::INFINITY
        } else {
            self.cycle_duration() * self.cycles as f32
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CycleSample {
    pub cycles_done: i32,
    /// Linear progress inside the current cycle, in [0, 1].
    pub t: f32,
    pub state: CycleState,
}

impl CycleSample {
    pub const BEFORE: CycleSample = CycleSample {
        cycles_done: 0,
        t: 0.0,
        state: CycleState::Before,
    };
}

/// Sample a timing at `elapsed`.
///
/// `prev_cycles_done` is only consulted for zero-length infinite cycles, which
/// advance at most one cycle per evaluation. `forward` disambiguates the
/// elapsed == 0 edge: arriving at 0 backwards lands before the start.
pub fn sample(timing: &Timing, elapsed: f32, prev_cycles_done: i32, forward: bool) -> CycleSample {
    if elapsed < 0.0 || (elapsed <= 0.0 && !forward) {
        return CycleSample::BEFORE;
    }
    let cycle = timing.cycle_duration();
    if cycle <= 0.0 {
        if !timing.is_infinite() {
            return CycleSample {
                cycles_done: timing.cycles,
                t: 1.0,
                state: CycleState::After,
            };
        }
        let done = if forward {
            prev_cycles_done.saturating_add(1)
        } else {
            prev_cycles_done
        };
        return CycleSample {
            cycles_done: done,
            t: 1.0,
            state: CycleState::Running,
        };
    }

    let raw = (elapsed / cycle).floor();
    if !timing.is_infinite() && raw >= timing.cycles as f32 {
        return CycleSample {
            cycles_done: timing.cycles,
            t: 1.0,
            state: CycleState::After,
        };
    }
    let done = if raw >= i32::MAX as f32 {
        i32::MAX
    } else {
        raw as i32
    };
    let in_cycle = elapsed - cycle * done as f32 - timing.start_delay;
    if in_cycle < 0.0 {
        let state = if done == 0 {
            CycleState::Before
        } else {
            CycleState::Running
        };
        return CycleSample {
            cycles_done: done,
            t: 0.0,
            state,
        };
    }
    let t = if timing.duration <= 0.0 {
        1.0
    } else {
        (in_cycle / timing.duration).min(1.0)
    };
    CycleSample {
        cycles_done: done,
        t,
        state: CycleState::Running,
    }
}

#[inline]
fn apply_ease(ease: &Ease, x: f32, reverse_ease: bool) -> f32 {
    if reverse_ease {
        1.0 - ease.evaluate(1.0 - x)
    } else {
        ease.evaluate(x)
    }
}

/// Eased progress for a sample, folding in the cycle mode.
///
/// Progress is unclamped: overshooting eases and incremental cycles leave
/// [0, 1]. `total_cycles` is only read in the `After` state.
pub fn eased_progress(
    ease: &Ease,
    mode: CycleMode,
    sample: &CycleSample,
    total_cycles: i32,
    reverse_ease: bool,
) -> f32 {
    let e = |x: f32| apply_ease(ease, x, reverse_ease);
    if sample.state == CycleState::After {
        let odd_total = total_cycles % 2 != 0;
        return match mode {
            CycleMode::Restart => e(1.0),
            CycleMode::Incremental => e(1.0) + (total_cycles - 1).max(0) as f32,
            CycleMode::Yoyo | CycleMode::YoyoChildren => {
                if odd_total {
                    e(1.0)
                } else {
                    1.0 - e(1.0)
                }
            }
            CycleMode::Rewind => {
                if odd_total {
                    e(1.0)
                } else {
                    e(0.0)
                }
            }
        };
    }
    let odd = sample.cycles_done % 2 != 0;
    match mode {
        CycleMode::Restart => e(sample.t),
        CycleMode::Incremental => e(sample.t) + sample.cycles_done as f32,
        CycleMode::Yoyo | CycleMode::YoyoChildren => {
            if odd {
                1.0 - e(sample.t)
            } else {
                e(sample.t)
            }
        }
        CycleMode::Rewind => {
            if odd {
                e(1.0 - sample.t)
            } else {
                e(sample.t)
            }
        }
    }
}

/// Whether cycle `cycle_index` traverses the timeline start → end.
#[inline]
pub fn cycle_forward(mode: CycleMode, cycle_index: i32) -> bool {
    match mode {
        CycleMode::Restart | CycleMode::Incremental => true,
        CycleMode::Yoyo | CycleMode::YoyoChildren | CycleMode::Rewind => cycle_index % 2 == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(duration: f32, cycles: i32, mode: CycleMode) -> Timing {
        Timing {
            duration,
            start_delay: 0.0,
            end_delay: 0.0,
            cycles,
            cycle_mode: mode,
        }
    }

    #[test]
    fn before_and_after() {
        let t = timing(1.0, 2, CycleMode::Restart);
        assert_eq!(sample(&t, -0.1, 0, true).state, CycleState::Before);
        assert_eq!(sample(&t, 0.0, 0, false).state, CycleState::Before);
        assert_eq!(sample(&t, 0.0, 0, true).state, CycleState::Running);
        let s = sample(&t, 5.0, 0, true);
        assert_eq!(s.state, CycleState::After);
        assert_eq!(s.cycles_done, 2);
    }

    #[test]
    fn yoyo_mid_third_cycle() {
        let t = timing(1.0, 3, CycleMode::Yoyo);
        let s = sample(&t, 2.5, 0, true);
        assert_eq!(s.cycles_done, 2);
        assert!((s.t - 0.5).abs() < 1e-6);
        assert!(cycle_forward(CycleMode::Yoyo, s.cycles_done));
    }

    #[test]
    fn delays_apply_every_cycle() {
        let t = Timing {
            duration: 1.0,
            start_delay: 0.5,
            end_delay: 0.5,
            cycles: 2,
            cycle_mode: CycleMode::Restart,
        };
        assert_eq!(t.total_duration(), 4.0);
        assert_eq!(sample(&t, 0.25, 0, true).state, CycleState::Before);
        let s = sample(&t, 2.25, 0, true);
        assert_eq!(s.cycles_done, 1);
        assert_eq!(s.t, 0.0);
        assert_eq!(s.state, CycleState::Running);
        assert_eq!(sample(&t, 3.0, 0, true).t, 0.5);
    }

    #[test]
    fn zero_length_infinite_consumes_one_cycle() {
        let t = timing(0.0, INFINITE_CYCLES, CycleMode::Restart);
        let s = sample(&t, 10.0, 4, true);
        assert_eq!(s.cycles_done, 5);
        assert_eq!(s.state, CycleState::Running);
    }

    #[test]
    fn terminal_values_per_mode() {
        let after = CycleSample {
            cycles_done: 2,
            t: 1.0,
            state: CycleState::After,
        };
        let lin = Ease::Linear;
        assert_eq!(eased_progress(&lin, CycleMode::Yoyo, &after, 2, false), 0.0);
        assert_eq!(eased_progress(&lin, CycleMode::Yoyo, &after, 3, false), 1.0);
        assert_eq!(eased_progress(&lin, CycleMode::Rewind, &after, 2, false), 0.0);
        assert_eq!(eased_progress(&lin, CycleMode::Incremental, &after, 3, false), 3.0);
        assert_eq!(eased_progress(&lin, CycleMode::Restart, &after, 7, false), 1.0);
    }

    #[test]
    fn reverse_ease_mirrors_the_curve() {
        let s = CycleSample {
            cycles_done: 0,
            t: 0.25,
            state: CycleState::Running,
        };
        let fwd = eased_progress(&Ease::InQuad, CycleMode::Restart, &s, 1, false);
        let rev = eased_progress(&Ease::InQuad, CycleMode::Restart, &s, 1, true);
        assert!((fwd - 0.0625).abs() < 1e-6);
        assert!((rev - 0.4375).abs() < 1e-6);
    }
}
