//! Strata Animation System
//!
//! Time-driven tweens and the scheduling that advances them.
//!
//! # Features
//!
//! - **Tweens**: delay, easing, iteration and direction semantics as a pure
//!   function of elapsed time
//! - **Multi-Tweens**: drive a group of animations as one unit
//! - **Runners**: advance many animations from a shared clock with
//!   pause, resume and lazy stop
//! - **Frame Loop**: explicit scheduler that only requests frames while
//!   something animates, with a swappable frame source
//! - **Presets**: serde-loadable tween timing
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use strata_animation::{Direction, Easing, FrameLoop, ManualFrameSource, Runner, Tween};
//!
//! let opacity = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&opacity);
//! let fade = Tween::new(0.0_f64, 1.0, move |v| sink.set(v))
//!     .duration(200.0)
//!     .easing(Easing::EaseOutQuad)
//!     .direction(Direction::Forward);
//!
//! let clock = ManualFrameSource::new();
//! let mut frames = FrameLoop::new(clock.clone());
//! let runner = frames.add_runner(Runner::new());
//! frames.start(runner, fade);
//!
//! frames.tick();
//! clock.advance(100.0);
//! frames.tick();
//! assert_eq!(opacity.get(), 0.75);
//! ```

pub mod config;
pub mod easing;
pub mod frame;
pub mod multi_tween;
pub mod runner;
pub mod scheduler;
pub mod tween;
pub mod values;

pub use config::{Infinite, Iterations, TweenConfig};
pub use easing::Easing;
pub use frame::{
    FrameRequest, FrameSignal, FrameSource, InstantFrameSource, ManualFrameSource, WakeCallback,
};
pub use multi_tween::MultiTween;
pub use runner::{DoneCallback, Runner, RunnerCallback, TweenId};
pub use scheduler::{FrameLoop, RunnerId};
pub use tween::{Animation, Direction, Timing, Tween, DEFAULT_DURATION_MS};
pub use values::{Interpolate, InterpolateFn, Interpolation};
