//! Easing curves mapping linear progress to eased progress.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::TweenError;
use crate::interp::functions::bezier_ease_t;

/// Easing function applied to in-cycle progress.
///
/// Output is not clamped: `Back` and `Elastic` families overshoot [0, 1].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    /// Resolved to [`crate::Config::default_ease`] when a task is created.
    #[default]
    Default,
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
    /// CSS-style timing curve, control points (x1, y1, x2, y2).
    Bezier([f32; 4]),
    /// Piecewise-linear user curve.
    Custom(CustomCurve),
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

fn out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl Ease {
    /// Evaluate at `t`; input outside [0, 1] is clamped first.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear | Ease::Default => t,
            Ease::InSine => 1.0 - (t * FRAC_PI_2).cos(),
            Ease::OutSine => (t * FRAC_PI_2).sin(),
            Ease::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Ease::InQuad => t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::InCubic => t * t * t,
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
            Ease::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::InQuart => t.powi(4),
            Ease::OutQuart => 1.0 - (1.0 - t).powi(4),
            Ease::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Ease::InQuint => t.powi(5),
            Ease::OutQuint => 1.0 - (1.0 - t).powi(5),
            Ease::InOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Ease::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Ease::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Ease::InOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Ease::InCirc => 1.0 - (1.0 - t * t).sqrt(),
            Ease::OutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Ease::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Ease::InElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Ease::OutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Ease::InOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                        + 1.0
                }
            }
            Ease::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Ease::OutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
            }
            Ease::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Ease::InBounce => 1.0 - out_bounce(1.0 - t),
            Ease::OutBounce => out_bounce(t),
            Ease::InOutBounce => {
                if t < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
            Ease::Bezier(c) => bezier_ease_t(t, c[0], c[1], c[2], c[3]),
            Ease::Custom(curve) => curve.evaluate(t),
        }
    }

    /// Check user-supplied parameters. Built-in curves are always valid.
    pub fn validate(&self) -> Result<(), TweenError> {
        match self {
            Ease::Bezier(c) => {
                let ok = c.iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&c[0])
                    && (0.0..=1.0).contains(&c[2]);
                if ok {
                    Ok(())
                } else {
                    Err(TweenError::MalformedCurve {
                        reason: format!("bezier x control points must lie in [0, 1]: {c:?}"),
                    })
                }
            }
            Ease::Custom(curve) => curve.validate(),
            _ => Ok(()),
        }
    }
}

/// Piecewise-linear curve through `(x, y)` points with strictly increasing x.
///
/// Input before the first point or after the last is clamped to the end
/// values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomCurve {
    pub points: Vec<[f32; 2]>,
}

impl CustomCurve {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    pub fn validate(&self) -> Result<(), TweenError> {
        if self.points.len() < 2 {
            return Err(TweenError::MalformedCurve {
                reason: format!("need at least 2 points, got {}", self.points.len()),
            });
        }
        if self.points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TweenError::MalformedCurve {
                reason: "non-finite point".to_string(),
            });
        }
        if self.points.windows(2).any(|w| w[1][0] <= w[0][0]) {
            return Err(TweenError::MalformedCurve {
                reason: "x must be strictly increasing".to_string(),
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let pts = &self.points;
        match pts.len() {
            0 => return x,
            1 => return pts[0][1],
            _ => {}
        }
        let first = pts[0];
        let last = pts[pts.len() - 1];
        if x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }
        // first index whose x is > input; guaranteed in 1..len by the checks above
        let hi = pts.partition_point(|p| p[0] <= x);
        let a = pts[hi - 1];
        let b = pts[hi];
        let span = b[0] - a[0];
        if span <= 0.0 {
            return b[1];
        }
        a[1] + (b[1] - a[1]) * ((x - a[0]) / span)
    }
}
