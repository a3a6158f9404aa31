//! Animation module
//!
//! Cooperative, frame-driven transitions. Nothing here owns a clock: every
//! transition is advanced by the render tick with the elapsed milliseconds.
//!
//! - `Easing`: curves applied to transition progress
//! - `Tween`: a fixed-duration transition between two values
//! - `TweenSlot`: at most one live transition per animated property
//! - `TweenHandle`: shared status used for cancellation and completion checks

pub mod easing;
pub mod tween;

pub use easing::Easing;
pub use tween::{Interpolate, Tween, TweenHandle, TweenSlot, TweenStatus};
