//! Value kinds animated by tasks and the arithmetic used to tween them.

use serde::{Deserialize, Serialize};

use crate::interp::functions::{add_scaled, normalize4, slerp_quat, sub};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    ColorRgba,
    Quat,
    Rect,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector
    Vec3([f32; 3]),
    /// 4D vector
    Vec4([f32; 4]),
    /// RGBA color (linear by convention)
    ColorRgba([f32; 4]),
    /// Rotation quaternion (x, y, z, w)
    Quat([f32; 4]),
    /// Rectangle (x, y, width, height)
    Rect([f32; 4]),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Quat(_) => ValueKind::Quat,
            Value::Rect(_) => ValueKind::Rect,
        }
    }

    /// Zero of the given kind (identity rotation for `Quat`).
    pub fn zero(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::ColorRgba => Value::ColorRgba([0.0; 4]),
            ValueKind::Quat => Value::Quat([0.0, 0.0, 0.0, 1.0]),
            ValueKind::Rect => Value::Rect([0.0; 4]),
        }
    }

    /// Difference cached by a task at creation time.
    ///
    /// Linear kinds store `end - start`. Rotations cannot be expressed as a
    /// component-wise delta, so `Quat` stores the normalized end rotation and
    /// [`Value::evaluate`] slerps towards it. Returns `None` on kind mismatch.
    pub fn delta(start: &Value, end: &Value) -> Option<Value> {
        let d = match (start, end) {
            (Value::Float(a), Value::Float(b)) => Value::Float(b - a),
            (Value::Vec2(a), Value::Vec2(b)) => Value::Vec2(sub(*b, *a)),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(sub(*b, *a)),
            (Value::Vec4(a), Value::Vec4(b)) => Value::Vec4(sub(*b, *a)),
            (Value::ColorRgba(a), Value::ColorRgba(b)) => Value::ColorRgba(sub(*b, *a)),
            (Value::Rect(a), Value::Rect(b)) => Value::Rect(sub(*b, *a)),
            (Value::Quat(_), Value::Quat(b)) => Value::Quat(normalize4(*b)),
            _ => return None,
        };
        Some(d)
    }

    /// Value at eased progress `t` given a start and a cached delta.
    ///
    /// `t` may leave [0, 1] (overshooting eases, incremental cycles).
    /// Mismatched kinds fall back to `start` (fail-soft).
    pub fn evaluate(start: &Value, delta: &Value, t: f32) -> Value {
        match (start, delta) {
            (Value::Float(a), Value::Float(d)) => Value::Float(a + d * t),
            (Value::Vec2(a), Value::Vec2(d)) => Value::Vec2(add_scaled(*a, *d, t)),
            (Value::Vec3(a), Value::Vec3(d)) => Value::Vec3(add_scaled(*a, *d, t)),
            (Value::Vec4(a), Value::Vec4(d)) => Value::Vec4(add_scaled(*a, *d, t)),
            (Value::ColorRgba(a), Value::ColorRgba(d)) => {
                Value::ColorRgba(add_scaled(*a, *d, t))
            }
            (Value::Rect(a), Value::Rect(d)) => Value::Rect(add_scaled(*a, *d, t)),
            (Value::Quat(a), Value::Quat(end)) => {
                if t == 0.0 {
                    Value::Quat(*a)
                } else {
                    Value::Quat(slerp_quat(normalize4(*a), *end, t))
                }
            }
            _ => *start,
        }
    }

    /// Offset by a 3D displacement; used by shakes. Only positional kinds
    /// (`Float`, `Vec2`, `Vec3`) accept an offset.
    pub fn with_offset(&self, offset: [f32; 3]) -> Option<Value> {
        match self {
            Value::Float(a) => Some(Value::Float(a + offset[0])),
            Value::Vec2(a) => Some(Value::Vec2([a[0] + offset[0], a[1] + offset[1]])),
            Value::Vec3(a) => Some(Value::Vec3([
                a[0] + offset[0],
                a[1] + offset[1],
                a[2] + offset[2],
            ])),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Four-component payload of `Vec4`, `ColorRgba`, `Quat` or `Rect`.
    #[inline]
    pub fn as_array4(&self) -> Option<[f32; 4]> {
        match self {
            Value::Vec4(v) | Value::ColorRgba(v) | Value::Quat(v) | Value::Rect(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}
