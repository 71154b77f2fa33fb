//! Serializable tween presets
//!
//! Lets hosts keep animation timing in JSON or TOML next to the rest of
//! their settings:
//!
//! ```toml
//! duration = 300
//! delay = 50
//! iterations = "infinite"
//! direction = "alternate"
//! easing = "easeInOutCubic"
//! ```

use crate::easing::Easing;
use crate::tween::{Direction, Tween, DEFAULT_DURATION_MS};
use crate::values::Interpolate;
use serde::{Deserialize, Serialize};

/// The `"infinite"` keyword
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Infinite {
    Infinite,
}

/// Iteration count: a number or `"infinite"`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Iterations {
    Count(f64),
    Forever(Infinite),
}

impl Default for Iterations {
    fn default() -> Self {
        Iterations::Count(1.0)
    }
}

/// Timing description of a tween
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    /// Milliseconds per iteration
    pub duration: f64,
    /// Milliseconds before the first iteration
    pub delay: f64,
    pub iterations: Iterations,
    pub direction: Direction,
    /// Easing name, resolved with [`Easing::from_name`]
    pub easing: String,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            delay: 0.0,
            iterations: Iterations::default(),
            direction: Direction::Forward,
            easing: "linear".to_string(),
        }
    }
}

impl TweenConfig {
    /// Build a tween from this preset
    pub fn build<T, F>(&self, from: T, to: T, callback: F) -> Tween<T>
    where
        T: Interpolate,
        F: FnMut(T) + 'static,
    {
        let tween = Tween::new(from, to, callback)
            .duration(self.duration)
            .delay(self.delay)
            .direction(self.direction)
            .easing(Easing::from_name(&self.easing));
        match self.iterations {
            Iterations::Count(count) => tween.iterations(count),
            Iterations::Forever(_) => tween.repeat_forever(),
        }
    }
}
