//! Interpolation primitives shared by the value model and easing.

pub mod functions;

pub use functions::{bezier_ease_t, lerp_f32, nlerp_quat, slerp_quat};
