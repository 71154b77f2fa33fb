//! Runner - drives a set of animations from a shared clock
//!
//! Each animation is annotated with its start and pause timestamps. The
//! start timestamp is taken lazily on the first tick, so an animation
//! started and stopped between two ticks never syncs.

use crate::tween::Animation;
use slotmap::{new_key_type, SlotMap};
use std::fmt;

new_key_type! {
    /// Handle to an animation registered with a [`Runner`]
    pub struct TweenId;
}

/// Completion callback of a single animation
pub type DoneCallback = Box<dyn FnOnce()>;

/// Hook fired by the runner itself
pub type RunnerCallback = Box<dyn FnMut()>;

struct Scheduled {
    animation: Box<dyn Animation>,
    started_at: Option<f64>,
    paused_at: Option<f64>,
    stopped: bool,
    on_done: Option<DoneCallback>,
}

/// Advances registered animations each tick
#[derive(Default)]
pub struct Runner {
    tweens: SlotMap<TweenId, Scheduled>,
    /// Start order; ticks visit animations in this order
    order: Vec<TweenId>,
    on_tick: Option<RunnerCallback>,
    on_done: Option<RunnerCallback>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called at the end of every tick
    pub fn set_on_tick<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_tick = Some(Box::new(callback));
    }

    /// Called whenever the runner's last animation finishes or is stopped
    pub fn set_on_done<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_done = Some(Box::new(callback));
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Register an animation; it first syncs on the next tick
    pub fn start<A>(&mut self, animation: A) -> TweenId
    where
        A: Animation + 'static,
    {
        self.insert(Box::new(animation), None)
    }

    /// Register an animation with a completion callback
    pub fn start_with<A, F>(&mut self, animation: A, on_done: F) -> TweenId
    where
        A: Animation + 'static,
        F: FnOnce() + 'static,
    {
        self.insert(Box::new(animation), Some(Box::new(on_done)))
    }

    /// Register an already boxed animation
    pub fn start_boxed(
        &mut self,
        animation: Box<dyn Animation>,
        on_done: Option<DoneCallback>,
    ) -> TweenId {
        self.insert(animation, on_done)
    }

    fn insert(&mut self, animation: Box<dyn Animation>, on_done: Option<DoneCallback>) -> TweenId {
        let id = self.tweens.insert(Scheduled {
            animation,
            started_at: None,
            paused_at: None,
            stopped: false,
            on_done,
        });
        self.order.push(id);
        id
    }

    /// Freeze an animation at time `now`
    pub fn pause(&mut self, id: TweenId, now: f64) {
        if let Some(entry) = self.tweens.get_mut(id) {
            if entry.paused_at.is_none() {
                entry.paused_at = Some(now);
            }
        }
    }

    /// Continue a paused animation, shifting its start past the pause
    ///
    /// Also cancels a stop that has not been applied by a tick yet.
    pub fn resume(&mut self, id: TweenId, now: f64) {
        let Some(entry) = self.tweens.get_mut(id) else {
            return;
        };
        if let (Some(paused_at), Some(started_at)) = (entry.paused_at, entry.started_at) {
            entry.started_at = Some(started_at + (now - paused_at));
        }
        entry.paused_at = None;
        entry.stopped = false;
    }

    /// Mark an animation for removal at the next tick
    pub fn stop(&mut self, id: TweenId) {
        if let Some(entry) = self.tweens.get_mut(id) {
            entry.stopped = true;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `id` is registered and not stopped
    pub fn is_running(&self, id: TweenId) -> bool {
        self.tweens.get(id).is_some_and(|entry| !entry.stopped)
    }

    pub fn is_paused(&self, id: TweenId) -> bool {
        self.tweens
            .get(id)
            .is_some_and(|entry| entry.paused_at.is_some())
    }

    /// Number of registered animations, including ones awaiting removal
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance every live animation to `now`
    ///
    /// Animations whose elapsed time passes their end are synced one last
    /// time, fire their completion callback and are removed along with any
    /// stopped ones. Returns `true` while animations remain.
    pub fn tick(&mut self, now: f64) -> bool {
        let mut finished = 0;
        for &id in &self.order {
            let Some(entry) = self.tweens.get_mut(id) else {
                continue;
            };
            if entry.stopped {
                finished += 1;
                continue;
            }
            if entry.paused_at.is_some() {
                continue;
            }
            let started_at = *entry.started_at.get_or_insert(now);
            let elapsed = now - started_at;
            entry.animation.goto_elapsed_time(elapsed);
            if elapsed > entry.animation.total_elapsed() {
                entry.stopped = true;
                finished += 1;
                if let Some(on_done) = entry.on_done.take() {
                    on_done();
                }
            }
        }

        if let Some(on_tick) = self.on_tick.as_mut() {
            on_tick();
        }

        if finished > 0 {
            self.prune();
            if self.tweens.is_empty() {
                tracing::trace!("runner: all animations finished");
                if let Some(on_done) = self.on_done.as_mut() {
                    on_done();
                }
            }
        }
        !self.tweens.is_empty()
    }

    fn prune(&mut self) {
        let tweens = &mut self.tweens;
        self.order.retain(|&id| {
            let stopped = tweens.get(id).map_or(true, |entry| entry.stopped);
            if stopped {
                tweens.remove(id);
            }
            !stopped
        });
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("tweens", &self.tweens.len())
            .finish_non_exhaustive()
    }
}
