//! Procedural shakes and punches.
//!
//! A shake jitters a positional value around its rest value. Every
//! `1 / frequency` seconds it picks a new random waypoint and eases towards
//! it; the whole displacement is scaled by an envelope over the cycle.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::cycle::{CycleMode, CycleState};
use crate::ease::{CustomCurve, Ease};
use crate::error::TweenError;
use crate::ids::TaskHandle;
use crate::interp::functions::lerp_vec3;
use crate::scheduler::{Scheduler, SlotInit};
use crate::target::Binding;
use crate::task::TaskKind;
use crate::time::Phase;
use crate::value::{Value, ValueKind};

pub const DEFAULT_FREQUENCY: f32 = 10.0;

/// Amplitude multiplier over the progress of one cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    Constant,
    /// `1 - ease(p)`.
    FadeOut(Ease),
    /// `sin(pi * p)`: silent at both ends.
    FadeInOut,
    Curve(CustomCurve),
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::FadeOut(Ease::Linear)
    }
}

impl Envelope {
    pub fn evaluate(&self, p: f32) -> f32 {
        let p = p.clamp(0.0, 1.0);
        match self {
            Envelope::Constant => 1.0,
            Envelope::FadeOut(ease) => 1.0 - ease.evaluate(p),
            Envelope::FadeInOut => (std::f32::consts::PI * p).sin(),
            Envelope::Curve(curve) => curve.evaluate(p),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeSettings {
    /// Maximum displacement per axis (x, y, z). Unused axes are ignored.
    pub strength: [f32; 3],
    pub duration: f32,
    /// Waypoints per second.
    pub frequency: f32,
    pub envelope: Envelope,
    pub ease_between_shakes: Ease,
    /// 0 swings equally both ways; 1 never crosses to the negative side of
    /// the main axis.
    pub asymmetry: f32,
    /// Axis that alternates sign. Defaults to the strongest one.
    pub main_axis: Option<usize>,
    pub cycles: i32,
    pub start_delay: f32,
    pub end_delay: f32,
    pub use_unscaled_time: bool,
    pub phase: Phase,
}

impl Default for ShakeSettings {
    fn default() -> Self {
        Self {
            strength: [1.0, 1.0, 1.0],
            duration: 0.5,
            frequency: DEFAULT_FREQUENCY,
            envelope: Envelope::default(),
            ease_between_shakes: Ease::OutQuad,
            asymmetry: 0.0,
            main_axis: None,
            cycles: 1,
            start_delay: 0.0,
            end_delay: 0.0,
            use_unscaled_time: false,
            phase: Phase::Update,
        }
    }
}

impl ShakeSettings {
    pub fn new(strength: [f32; 3], duration: f32) -> Self {
        Self {
            strength,
            duration,
            ..Self::default()
        }
    }

    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_asymmetry(mut self, asymmetry: f32) -> Self {
        self.asymmetry = asymmetry;
        self
    }

    pub fn with_main_axis(mut self, axis: usize) -> Self {
        self.main_axis = Some(axis);
        self
    }
}

/// Per-task waypoint generator.
pub(crate) struct ShakeState {
    strength: [f32; 3],
    frequency: f32,
    envelope: Envelope,
    ease_between: Ease,
    asymmetry: f32,
    main_axis: usize,
    dims: usize,
    punch: bool,
    seed: u64,
    rng: StdRng,
    segment: i64,
    sign: f32,
    from: [f32; 3],
    to: [f32; 3],
}

impl ShakeState {
    #[allow(clippy::too_many_arguments)]
    fn new(
        strength: [f32; 3],
        frequency: f32,
        envelope: Envelope,
        ease_between: Ease,
        asymmetry: f32,
        main_axis: usize,
        dims: usize,
        punch: bool,
        seed: u64,
    ) -> Self {
        Self {
            strength,
            frequency,
            envelope,
            ease_between,
            asymmetry,
            main_axis,
            dims,
            punch,
            seed,
            rng: StdRng::seed_from_u64(seed),
            segment: -1,
            sign: -1.0,
            from: [0.0; 3],
            to: [0.0; 3],
        }
    }

    /// Back to the first segment with the original random stream, so
    /// scrubbing backwards replays the same motion.
    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.segment = -1;
        self.sign = -1.0;
        self.from = [0.0; 3];
        self.to = [0.0; 3];
    }

    fn next_waypoint(&mut self) -> [f32; 3] {
        let mut w = [0.0; 3];
        if self.punch {
            for (axis, out) in w.iter_mut().enumerate().take(self.dims) {
                *out = self.strength[axis] * self.rng.random_range(0.6f32..1.0);
            }
            return w;
        }
        self.sign = -self.sign;
        for (axis, out) in w.iter_mut().enumerate().take(self.dims) {
            let s = self.strength[axis];
            *out = if axis == self.main_axis {
                let mag = s * self.rng.random_range(0.6f32..1.0);
                if self.sign > 0.0 {
                    mag
                } else {
                    -mag * (1.0 - self.asymmetry)
                }
            } else {
                s * self.rng.random_range(-1.0f32..1.0)
            };
        }
        w
    }

    /// Displacement at in-cycle progress `t` of a cycle lasting `duration`.
    pub fn offset(&mut self, t: f32, state: CycleState, duration: f32) -> [f32; 3] {
        if state != CycleState::Running {
            return [0.0; 3];
        }
        let phase = t * duration * self.frequency;
        let segment = phase.floor() as i64;
        let frac = phase - segment as f32;
        if segment < self.segment {
            self.reset();
        }
        if segment == self.segment + 1 {
            self.from = self.to;
            self.to = self.next_waypoint();
        } else if segment > self.segment {
            self.from = self.next_waypoint();
            self.to = self.next_waypoint();
        }
        self.segment = segment;
        let env = self.envelope.evaluate(t);
        let p = lerp_vec3(self.from, self.to, self.ease_between.evaluate(frac));
        [p[0] * env, p[1] * env, p[2] * env]
    }
}

fn strongest_axis(strength: &[f32; 3], dims: usize) -> usize {
    let mut best = 0;
    for axis in 1..dims {
        if strength[axis].abs() > strength[best].abs() {
            best = axis;
        }
    }
    best
}

impl Scheduler {
    /// Shake `target` around `rest`. Only `Float`, `Vec2` and `Vec3` can
    /// be shaken.
    pub fn create_shake(
        &mut self,
        target: Option<Binding>,
        rest: Value,
        settings: ShakeSettings,
    ) -> Result<TaskHandle, TweenError> {
        self.spawn_shake(target, rest, settings, false)
    }

    /// Like a shake, but every waypoint keeps the sign of `strength`: the
    /// value kicks one way and settles back.
    pub fn create_punch(
        &mut self,
        target: Option<Binding>,
        rest: Value,
        settings: ShakeSettings,
    ) -> Result<TaskHandle, TweenError> {
        self.spawn_shake(target, rest, settings, true)
    }

    fn spawn_shake(
        &mut self,
        target: Option<Binding>,
        rest: Value,
        settings: ShakeSettings,
        punch: bool,
    ) -> Result<TaskHandle, TweenError> {
        let dims = match rest.kind() {
            ValueKind::Float => 1,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            kind => return Err(self.report(TweenError::UnsupportedShakeKind { kind })),
        };
        let frequency = if settings.frequency.is_finite() && settings.frequency > 0.0 {
            settings.frequency
        } else {
            self.report(TweenError::InvalidFrequency {
                value: settings.frequency,
                substituted: DEFAULT_FREQUENCY,
            });
            DEFAULT_FREQUENCY
        };
        let asymmetry = if (0.0..=1.0).contains(&settings.asymmetry) {
            settings.asymmetry
        } else {
            self.report(TweenError::InvalidAsymmetry {
                value: settings.asymmetry,
            });
            if settings.asymmetry.is_nan() {
                0.0
            } else {
                settings.asymmetry.clamp(0.0, 1.0)
            }
        };
        let envelope = match settings.envelope {
            Envelope::FadeOut(ease) => Envelope::FadeOut(self.resolve_ease(ease)),
            Envelope::Curve(curve) => match curve.validate() {
                Ok(()) => Envelope::Curve(curve),
                Err(e) => {
                    self.report(e);
                    Envelope::default()
                }
            },
            other => other,
        };
        let ease_between = self.resolve_ease(settings.ease_between_shakes);
        let main_axis = settings
            .main_axis
            .filter(|&axis| axis < dims)
            .unwrap_or_else(|| strongest_axis(&settings.strength, dims));
        let timing = self.sanitize_timing(
            settings.duration,
            settings.start_delay,
            settings.end_delay,
            settings.cycles,
            CycleMode::Restart,
            false,
        );
        let seed = self.rng.random_range(0..u64::MAX);
        let state = ShakeState::new(
            settings.strength,
            frequency,
            envelope,
            ease_between,
            asymmetry,
            main_axis,
            dims,
            punch,
            seed,
        );
        let handle = self.spawn(SlotInit {
            kind: TaskKind::Shake,
            phase: settings.phase,
            target,
            start: rest,
            diff: Value::zero(rest.kind()),
            timing,
            ease: Ease::Linear,
            unscaled: settings.use_unscaled_time,
        });
        self.pool.get_mut(handle.index).shake = Some(Box::new(state));
        Ok(handle)
    }
}
