//! Frame loop
//!
//! Services every active [`Runner`] once per frame. The loop owns its
//! runners and its [`FrameSource`]; it only asks the source for a frame
//! while some runner has work, so an idle loop costs nothing.
//!
//! ```rust
//! use strata_animation::{FrameLoop, ManualFrameSource, Runner, Tween};
//!
//! let clock = ManualFrameSource::new();
//! let mut frames = FrameLoop::new(clock.clone());
//! let runner = frames.add_runner(Runner::new());
//!
//! frames.start(runner, Tween::new(0.0_f64, 1.0, |_| {}).duration(100.0));
//! assert!(clock.pending().is_some());
//!
//! while clock.take_pending().is_some() {
//!     clock.advance(16.0);
//!     frames.tick();
//! }
//! assert!(frames.is_idle());
//! ```

use crate::frame::{FrameRequest, FrameSource};
use crate::runner::{Runner, TweenId};
use crate::tween::Animation;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a runner owned by a [`FrameLoop`]
    pub struct RunnerId;
}

/// Explicit per-frame scheduler for runners
pub struct FrameLoop {
    source: Box<dyn FrameSource>,
    runners: SlotMap<RunnerId, Runner>,
    /// Runners holding at least one animation, in activation order
    active: Vec<RunnerId>,
    pending: Option<FrameRequest>,
}

impl FrameLoop {
    pub fn new<S>(source: S) -> Self
    where
        S: FrameSource + 'static,
    {
        Self {
            source: Box::new(source),
            runners: SlotMap::with_key(),
            active: Vec::new(),
            pending: None,
        }
    }

    /// Current time of the frame source in milliseconds
    pub fn now(&self) -> f64 {
        self.source.now()
    }

    // =========================================================================
    // Runners
    // =========================================================================

    /// Take ownership of a runner
    pub fn add_runner(&mut self, runner: Runner) -> RunnerId {
        let id = self.runners.insert(runner);
        self.sync_activity(id);
        id
    }

    /// Drop a runner and everything it was animating
    pub fn remove_runner(&mut self, id: RunnerId) -> Option<Runner> {
        let runner = self.runners.remove(id)?;
        self.active.retain(|&active| active != id);
        if self.active.is_empty() {
            self.cancel_pending();
        }
        Some(runner)
    }

    pub fn runner(&self, id: RunnerId) -> Option<&Runner> {
        self.runners.get(id)
    }

    /// Mutate a runner with the current time at hand
    ///
    /// The loop re-checks whether the runner has work afterwards, so this
    /// is the way to pause, resume or stop its animations.
    pub fn with_runner<F, R>(&mut self, id: RunnerId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Runner, f64) -> R,
    {
        let now = self.source.now();
        let result = f(self.runners.get_mut(id)?, now);
        self.sync_activity(id);
        Some(result)
    }

    /// Start an animation on a runner
    pub fn start<A>(&mut self, runner: RunnerId, animation: A) -> Option<TweenId>
    where
        A: Animation + 'static,
    {
        self.with_runner(runner, |runner, _| runner.start(animation))
    }

    /// Start an animation on a runner with a completion callback
    pub fn start_with<A, F>(
        &mut self,
        runner: RunnerId,
        animation: A,
        on_done: F,
    ) -> Option<TweenId>
    where
        A: Animation + 'static,
        F: FnOnce() + 'static,
    {
        self.with_runner(runner, |runner, _| runner.start_with(animation, on_done))
    }

    pub fn pause(&mut self, runner: RunnerId, tween: TweenId) {
        self.with_runner(runner, |runner, now| runner.pause(tween, now));
    }

    pub fn resume(&mut self, runner: RunnerId, tween: TweenId) {
        self.with_runner(runner, |runner, now| runner.resume(tween, now));
    }

    pub fn stop(&mut self, runner: RunnerId, tween: TweenId) {
        self.with_runner(runner, |runner, _| runner.stop(tween));
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Swap the frame source
    ///
    /// A request pending on the old source is cancelled and, if runners
    /// still have work, re-issued on the new one.
    pub fn set_frame_source<S>(&mut self, source: S)
    where
        S: FrameSource + 'static,
    {
        self.cancel_pending();
        self.source = Box::new(source);
        tracing::debug!(active = self.active.len(), "frame loop: swapped frame source");
        self.request_if_needed();
    }

    /// Service every active runner once
    ///
    /// Hosts call this when a requested frame arrives.
    pub fn tick(&mut self) {
        self.pending = None;
        let now = self.source.now();

        let mut finished: SmallVec<[RunnerId; 4]> = SmallVec::new();
        for &id in &self.active {
            let Some(runner) = self.runners.get_mut(id) else {
                finished.push(id);
                continue;
            };
            if !runner.tick(now) {
                finished.push(id);
            }
        }
        if !finished.is_empty() {
            self.active.retain(|id| !finished.contains(id));
            tracing::debug!(
                finished = finished.len(),
                active = self.active.len(),
                "frame loop: runners went idle"
            );
        }

        self.request_if_needed();
    }

    /// Whether no runner has work
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active_runners(&self) -> usize {
        self.active.len()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    fn sync_activity(&mut self, id: RunnerId) {
        let has_work = self.runners.get(id).is_some_and(|runner| !runner.is_empty());
        let listed = self.active.contains(&id);
        if has_work && !listed {
            self.active.push(id);
            tracing::debug!(?id, "frame loop: runner activated");
        }
        self.request_if_needed();
    }

    fn request_if_needed(&mut self) {
        if self.pending.is_none() && !self.active.is_empty() {
            self.pending = Some(self.source.request_frame());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(request) = self.pending.take() {
            self.source.cancel_frame(request);
        }
    }
}
