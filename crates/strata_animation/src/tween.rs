//! Tweens
//!
//! A tween is a pure function from elapsed time to a value. It never
//! advances itself; a [`Runner`](crate::Runner) or the caller drives it by
//! handing it an elapsed time.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use strata_animation::{Animation, Tween};
//!
//! let seen = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&seen);
//! let mut tween = Tween::new(0.0_f64, 1.0, move |v| sink.set(v)).duration(500.0);
//!
//! tween.goto_elapsed_time(250.0);
//! assert_eq!(seen.get(), 0.5);
//! ```

use crate::easing::Easing;
use crate::values::{Interpolate, Interpolation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tween duration in milliseconds
pub const DEFAULT_DURATION_MS: f64 = 750.0;

/// Anything that can be synced to an elapsed time
pub trait Animation {
    /// Sync to `time` milliseconds since the animation started
    fn goto_elapsed_time(&mut self, time: f64);

    /// Span from zero through the delay and every iteration
    ///
    /// Never infinite; endless animations report `f64::MAX`.
    fn total_elapsed(&self) -> f64;

    /// Jump to the final state
    fn goto_end(&mut self) {
        let end = self.total_elapsed();
        self.goto_elapsed_time(end);
    }
}

/// Playback direction of each iteration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    /// Every even-numbered iteration runs backwards
    Alternate,
}

impl Direction {
    /// Parse a direction keyword; unknown keywords mean forward
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "reverse" => Direction::Reverse,
            "alternate" => Direction::Alternate,
            _ => Direction::Forward,
        }
    }
}

/// Shared timing parameters of tweens and multi-tweens
#[derive(Clone, Debug)]
pub struct Timing {
    /// Length of one iteration in milliseconds
    pub duration: f64,
    /// Time before the first iteration starts
    pub delay: f64,
    /// Iteration count; `f64::INFINITY` repeats forever
    pub iterations: f64,
    pub direction: Direction,
    pub easing: Easing,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            delay: 0.0,
            iterations: 1.0,
            direction: Direction::Forward,
            easing: Easing::Linear,
        }
    }
}

impl Timing {
    /// `delay + duration * iterations`, clamped to `f64::MAX`
    pub fn total_elapsed(&self) -> f64 {
        clamp_infinite(self.delay + self.duration * self.iterations)
    }

    /// Eased, directioned progress at `time`, or `None` while delayed
    pub fn progress(&self, time: f64) -> Option<f64> {
        if time < self.delay {
            return None;
        }
        let duration = self.duration;
        let t = time.min(self.total_elapsed()) - self.delay;

        let mut progress = if duration > 0.0 {
            (t % duration) / duration
        } else {
            1.0
        };
        // The end of an iteration is 1, not the start of the next
        if progress == 0.0 && t != 0.0 {
            progress = 1.0;
        }
        progress = self.easing.apply(progress);

        let flip = match self.direction {
            Direction::Forward => false,
            Direction::Reverse => true,
            Direction::Alternate => duration > 0.0 && (t / duration).ceil() % 2.0 == 0.0,
        };
        if flip {
            progress = 1.0 - progress;
        }
        Some(progress)
    }
}

pub(crate) fn clamp_infinite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::MAX
    }
}

/// Transition of a single value
pub struct Tween<T> {
    from: T,
    to: T,
    timing: Timing,
    interpolation: Interpolation<T>,
    callback: Box<dyn FnMut(T)>,
}

impl<T: Interpolate> Tween<T> {
    /// Create a tween interpolating with the value type's lerp
    pub fn new<F>(from: T, to: T, callback: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        Self::with_interpolation(from, to, Interpolation::lerp(), callback)
    }
}

impl<T> Tween<T> {
    /// Create a tween with an explicit interpolation
    ///
    /// Works for any value type, including ones without an [`Interpolate`]
    /// impl when the interpolation is custom.
    pub fn with_interpolation<F>(
        from: T,
        to: T,
        interpolation: Interpolation<T>,
        callback: F,
    ) -> Self
    where
        F: FnMut(T) + 'static,
    {
        Self {
            from,
            to,
            timing: Timing::default(),
            interpolation,
            callback: Box::new(callback),
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    /// Set the duration of one iteration in milliseconds
    pub fn duration(mut self, ms: f64) -> Self {
        self.timing.duration = ms;
        self
    }

    /// Set the start delay in milliseconds
    pub fn delay(mut self, ms: f64) -> Self {
        self.timing.delay = ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.timing.easing = easing;
        self
    }

    /// Set the iteration count; fractional counts end part-way through
    pub fn iterations(mut self, count: f64) -> Self {
        self.timing.iterations = count;
        self
    }

    /// Repeat forever
    pub fn repeat_forever(mut self) -> Self {
        self.timing.iterations = f64::INFINITY;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.timing.direction = direction;
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation<T>) -> Self {
        self.interpolation = interpolation;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn from_value(&self) -> &T {
        &self.from
    }

    pub fn to_value(&self) -> &T {
        &self.to
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Value at `progress` without invoking the callback
    pub fn value_at(&self, progress: f64) -> T {
        self.interpolation.apply(&self.from, &self.to, progress)
    }
}

impl<T> Animation for Tween<T> {
    fn goto_elapsed_time(&mut self, time: f64) {
        if let Some(progress) = self.timing.progress(time) {
            let value = self.value_at(progress);
            (self.callback)(value);
        }
    }

    fn total_elapsed(&self) -> f64 {
        self.timing.total_elapsed()
    }
}

impl<T: fmt::Debug> fmt::Debug for Tween<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("timing", &self.timing)
            .field("interpolation", &self.interpolation)
            .finish_non_exhaustive()
    }
}
