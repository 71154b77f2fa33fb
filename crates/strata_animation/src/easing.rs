//! Easing functions
//!
//! The standard Penner set plus a custom-function escape hatch. Names are
//! resolved once, when a tween is configured, never per frame.

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

/// Maps normalized progress to eased progress
///
/// Input is in `[0, 1]`. Output usually is too, but the elastic and back
/// families overshoot on purpose.
#[derive(Clone, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    /// User-supplied curve
    Custom(Rc<dyn Fn(f64) -> f64>),
}

const BACK_C1: f64 = 1.701_58;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

impl Easing {
    /// Wrap a custom easing curve
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Easing::Custom(Rc::new(f))
    }

    /// Resolve an easing by name
    ///
    /// Matching ignores case, `-` and `_`, so `easeInOutQuad`,
    /// `ease-in-out-quad` and `EASE_IN_OUT_QUAD` are the same curve.
    /// Unknown names fall back to [`Easing::Linear`].
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "easeinquad" => Easing::EaseInQuad,
            "easeoutquad" => Easing::EaseOutQuad,
            "easeinoutquad" => Easing::EaseInOutQuad,
            "easeincubic" => Easing::EaseInCubic,
            "easeoutcubic" => Easing::EaseOutCubic,
            "easeinoutcubic" => Easing::EaseInOutCubic,
            "easeinquart" => Easing::EaseInQuart,
            "easeoutquart" => Easing::EaseOutQuart,
            "easeinoutquart" => Easing::EaseInOutQuart,
            "easeinquint" => Easing::EaseInQuint,
            "easeoutquint" => Easing::EaseOutQuint,
            "easeinoutquint" => Easing::EaseInOutQuint,
            "easeinsine" => Easing::EaseInSine,
            "easeoutsine" => Easing::EaseOutSine,
            "easeinoutsine" => Easing::EaseInOutSine,
            "easeinexpo" => Easing::EaseInExpo,
            "easeoutexpo" => Easing::EaseOutExpo,
            "easeinoutexpo" => Easing::EaseInOutExpo,
            "easeincirc" => Easing::EaseInCirc,
            "easeoutcirc" => Easing::EaseOutCirc,
            "easeinoutcirc" => Easing::EaseInOutCirc,
            "easeinelastic" => Easing::EaseInElastic,
            "easeoutelastic" => Easing::EaseOutElastic,
            "easeinoutelastic" => Easing::EaseInOutElastic,
            "easeinback" => Easing::EaseInBack,
            "easeoutback" => Easing::EaseOutBack,
            "easeinoutback" => Easing::EaseInOutBack,
            "easeinbounce" => Easing::EaseInBounce,
            "easeoutbounce" => Easing::EaseOutBounce,
            "easeinoutbounce" => Easing::EaseInOutBounce,
            "linear" => Easing::Linear,
            _ => {
                tracing::debug!(easing = name, "unknown easing, using linear");
                Easing::Linear
            }
        }
    }

    /// Apply the curve to progress `t`
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,

            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }

            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    (t - 1.0) * (2.0 * t - 2.0) * (2.0 * t - 2.0) + 1.0
                }
            }

            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => 1.0 - (t - 1.0).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - 8.0 * (t - 1.0).powi(4)
                }
            }

            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 + (t - 1.0).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 + 16.0 * (t - 1.0).powi(5)
                }
            }

            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,

            Easing::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Easing::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Easing::EaseInOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }

            Easing::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Easing::EaseInOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }

            Easing::EaseInElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::EaseOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::EaseInOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                } else {
                    2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin() / 2.0
                        + 1.0
                }
            }

            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            Easing::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }

            Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Easing::EaseOutBounce => bounce_out(t),
            Easing::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }

            Easing::Custom(f) => f(t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
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

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Easing::Linear => "Linear",
            Easing::EaseInQuad => "EaseInQuad",
            Easing::EaseOutQuad => "EaseOutQuad",
            Easing::EaseInOutQuad => "EaseInOutQuad",
            Easing::EaseInCubic => "EaseInCubic",
            Easing::EaseOutCubic => "EaseOutCubic",
            Easing::EaseInOutCubic => "EaseInOutCubic",
            Easing::EaseInQuart => "EaseInQuart",
            Easing::EaseOutQuart => "EaseOutQuart",
            Easing::EaseInOutQuart => "EaseInOutQuart",
            Easing::EaseInQuint => "EaseInQuint",
            Easing::EaseOutQuint => "EaseOutQuint",
            Easing::EaseInOutQuint => "EaseInOutQuint",
            Easing::EaseInSine => "EaseInSine",
            Easing::EaseOutSine => "EaseOutSine",
            Easing::EaseInOutSine => "EaseInOutSine",
            Easing::EaseInExpo => "EaseInExpo",
            Easing::EaseOutExpo => "EaseOutExpo",
            Easing::EaseInOutExpo => "EaseInOutExpo",
            Easing::EaseInCirc => "EaseInCirc",
            Easing::EaseOutCirc => "EaseOutCirc",
            Easing::EaseInOutCirc => "EaseInOutCirc",
            Easing::EaseInElastic => "EaseInElastic",
            Easing::EaseOutElastic => "EaseOutElastic",
            Easing::EaseInOutElastic => "EaseInOutElastic",
            Easing::EaseInBack => "EaseInBack",
            Easing::EaseOutBack => "EaseOutBack",
            Easing::EaseInOutBack => "EaseInOutBack",
            Easing::EaseInBounce => "EaseInBounce",
            Easing::EaseOutBounce => "EaseOutBounce",
            Easing::EaseInOutBounce => "EaseInOutBounce",
            Easing::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}
