//! Eased transitions and single-flight transition slots
//!
//! A `TweenSlot` owns at most one running transition for one animated
//! property. Starting a new transition cancels the previous one, so two
//! writers never fight over the same value. Cancellation is cooperative: the
//! slot checks the shared `TweenHandle` status before every update.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use super::Easing;
use crate::units::Color;

/// Values that can be blended by a transition
pub trait Interpolate: Copy {
    /// Blend from `self` toward `to` by eased progress `t` (0-1)
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

impl Interpolate for Color {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.mix(to, t)
    }
}

/// Lifecycle of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenStatus {
    Running,
    Completed,
    Cancelled,
}

/// Shared handle to a transition, usable to observe or cancel it.
#[derive(Debug, Clone)]
pub struct TweenHandle {
    status: Rc<Cell<TweenStatus>>,
}

impl TweenHandle {
    fn new() -> Self {
        Self {
            status: Rc::new(Cell::new(TweenStatus::Running)),
        }
    }

    /// Current status
    pub fn status(&self) -> TweenStatus {
        self.status.get()
    }

    /// Whether the transition is still running
    pub fn is_running(&self) -> bool {
        self.status() == TweenStatus::Running
    }

    /// Whether the transition was cancelled before completing
    pub fn is_cancelled(&self) -> bool {
        self.status() == TweenStatus::Cancelled
    }

    /// Cancel the transition. No further updates are applied once cancelled.
    pub fn cancel(&self) {
        if self.is_running() {
            self.status.set(TweenStatus::Cancelled);
        }
    }

    fn complete(&self) {
        if self.is_running() {
            self.status.set(TweenStatus::Completed);
        }
    }
}

/// A fixed-duration eased transition between two values
#[derive(Debug, Clone, Copy)]
pub struct Tween<T> {
    from: T,
    to: T,
    duration_ms: f32,
    elapsed_ms: f32,
    easing: Easing,
}

impl<T: Interpolate> Tween<T> {
    /// Create a transition; a non-positive duration finishes on the first update
    pub fn new(from: T, to: T, duration_ms: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing,
        }
    }

    /// Linear progress (0-1)
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    /// Value at the current progress
    pub fn value(&self) -> T {
        let t = self.progress();
        if t >= 1.0 {
            return self.to;
        }
        self.from.interpolate(self.to, self.easing.apply(t))
    }

    /// Advance by `elapsed_ms` and return the new value
    pub fn advance(&mut self, elapsed_ms: f32) -> T {
        self.elapsed_ms += elapsed_ms.max(0.0);
        self.value()
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn target(&self) -> T {
        self.to
    }
}

type Completion = Box<dyn FnOnce()>;

struct ActiveTween<T> {
    tween: Tween<T>,
    handle: TweenHandle,
    on_complete: Option<Completion>,
}

/// Single-flight slot for one animated property
pub struct TweenSlot<T> {
    active: Option<ActiveTween<T>>,
    requests: u64,
}

impl<T> Default for TweenSlot<T> {
    fn default() -> Self {
        Self {
            active: None,
            requests: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TweenSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenSlot")
            .field("active", &self.active.as_ref().map(|a| a.handle.status()))
            .field("requests", &self.requests)
            .finish()
    }
}

impl<T: Interpolate> TweenSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition, superseding any running one
    pub fn start(&mut self, from: T, to: T, duration_ms: f32, easing: Easing) -> TweenHandle {
        self.start_tween(Tween::new(from, to, duration_ms, easing), None)
    }

    /// Start a transition with a completion callback, superseding any running one.
    ///
    /// The callback fires once, on the tick that reaches the target. It never
    /// fires if the transition is cancelled or superseded.
    pub fn start_with_completion(
        &mut self,
        from: T,
        to: T,
        duration_ms: f32,
        easing: Easing,
        on_complete: impl FnOnce() + 'static,
    ) -> TweenHandle {
        self.start_tween(Tween::new(from, to, duration_ms, easing), Some(Box::new(on_complete)))
    }

    fn start_tween(&mut self, tween: Tween<T>, on_complete: Option<Completion>) -> TweenHandle {
        self.cancel();
        self.requests += 1;
        let handle = TweenHandle::new();
        self.active = Some(ActiveTween {
            tween,
            handle: handle.clone(),
            on_complete,
        });
        handle
    }

    /// Cancel the running transition, if any
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.cancel();
        }
    }

    /// Whether a transition is live in this slot
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.handle.is_running())
    }

    /// Number of transitions ever requested through this slot
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Target of the live transition
    pub fn target(&self) -> Option<T> {
        self.active.as_ref().filter(|a| a.handle.is_running()).map(|a| a.tween.target())
    }

    /// Advance the live transition; returns the value to apply, if any
    pub fn tick(&mut self, elapsed_ms: f32) -> Option<T> {
        let active = self.active.as_mut()?;
        if !active.handle.is_running() {
            self.active = None;
            return None;
        }

        let value = active.tween.advance(elapsed_ms);
        if active.tween.is_finished() {
            if let Some(finished) = self.active.take() {
                finished.handle.complete();
                if let Some(callback) = finished.on_complete {
                    callback();
                }
            }
        }
        Some(value)
    }
}
