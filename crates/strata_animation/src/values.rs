//! Animatable value types
//!
//! Provides the interpolation trait implemented by numbers, vectors and
//! colors, and the per-tween interpolation strategy.

use std::fmt;
use std::rc::Rc;
use strata_core::{Color, Vec3};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t
    ///
    /// `t` is not clamped; overshooting easings extrapolate.
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

// ============================================================================
// Scalars
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }
}

// ============================================================================
// Vec3 / Color
// ============================================================================

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Vec3::lerp(self, *other, t as f32)
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Color::lerp(self, other, t as f32)
    }
}

// ============================================================================
// Interpolation strategy
// ============================================================================

/// Signature of an interpolation function: `(from, to, progress) -> value`
pub type InterpolateFn<T> = dyn Fn(&T, &T, f64) -> T;

/// How a tween turns eased progress into a value
pub enum Interpolation<T> {
    /// The value type's own [`Interpolate`] impl
    Lerp(fn(&T, &T, f64) -> T),
    /// User-supplied function
    Custom(Rc<InterpolateFn<T>>),
}

impl<T: Interpolate> Interpolation<T> {
    pub fn lerp() -> Self {
        Interpolation::Lerp(T::lerp)
    }

    /// Resolve a builtin interpolation by name
    ///
    /// `"number"` and `"color"` both select the value type's lerp, which is
    /// also the fallback for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" | "color" => {}
            other => tracing::debug!(interpolation = other, "unknown interpolation, using lerp"),
        }
        Self::lerp()
    }
}

impl<T> Interpolation<T> {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&T, &T, f64) -> T + 'static,
    {
        Interpolation::Custom(Rc::new(f))
    }

    /// Interpolate between `from` and `to`
    pub fn apply(&self, from: &T, to: &T, progress: f64) -> T {
        match self {
            Interpolation::Lerp(f) => f(from, to, progress),
            Interpolation::Custom(f) => f(from, to, progress),
        }
    }
}

impl<T: Interpolate> Default for Interpolation<T> {
    fn default() -> Self {
        Self::lerp()
    }
}

impl<T> Clone for Interpolation<T> {
    fn clone(&self) -> Self {
        match self {
            Interpolation::Lerp(f) => Interpolation::Lerp(*f),
            Interpolation::Custom(f) => Interpolation::Custom(Rc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Interpolation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Lerp(_) => f.write_str("Lerp"),
            Interpolation::Custom(_) => f.write_str("Custom"),
        }
    }
}
