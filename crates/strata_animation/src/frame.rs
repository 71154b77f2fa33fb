//! Frame sources
//!
//! A [`FrameSource`] is the host's clock plus its way of asking for the
//! next frame (a display refresh callback, a render loop, a test harness).
//! Sources can be swapped at runtime to move animations into another
//! timing domain.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Token for a requested frame, used to cancel it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host clock and frame-request provider
pub trait FrameSource {
    /// Current time in milliseconds
    fn now(&self) -> f64;

    /// Ask the host to tick the frame loop once more
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraw a request that has not been serviced yet
    fn cancel_frame(&mut self, request: FrameRequest);
}

// ============================================================================
// Manual source
// ============================================================================

#[derive(Debug, Default)]
struct ManualState {
    now: Cell<f64>,
    next_request: Cell<u64>,
    pending: Cell<Option<FrameRequest>>,
    requested: Cell<usize>,
    cancelled: Cell<usize>,
}

/// Frame source whose clock the caller advances by hand
///
/// Clones share the same clock, so a test can keep a handle while the
/// frame loop owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualFrameSource {
    state: Rc<ManualState>,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `now` milliseconds
    pub fn starting_at(now: f64) -> Self {
        let source = Self::new();
        source.set_now(now);
        source
    }

    pub fn set_now(&self, now: f64) {
        self.state.now.set(now);
    }

    /// Move the clock forward by `ms`
    pub fn advance(&self, ms: f64) {
        self.state.now.set(self.state.now.get() + ms);
    }

    /// Outstanding request, if the loop asked for a frame
    pub fn pending(&self) -> Option<FrameRequest> {
        self.state.pending.get()
    }

    /// Consume the outstanding request, as a host does when it runs a frame
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.state.pending.take()
    }

    /// Total number of frames requested
    pub fn requested(&self) -> usize {
        self.state.requested.get()
    }

    /// Total number of requests cancelled
    pub fn cancelled(&self) -> usize {
        self.state.cancelled.get()
    }
}

impl FrameSource for ManualFrameSource {
    fn now(&self) -> f64 {
        self.state.now.get()
    }

    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.state.next_request.get());
        self.state.next_request.set(request.0 + 1);
        self.state.pending.set(Some(request));
        self.state.requested.set(self.state.requested.get() + 1);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.state.pending.get() == Some(request) {
            self.state.pending.set(None);
            self.state.cancelled.set(self.state.cancelled.get() + 1);
        }
    }
}

// ============================================================================
// Instant source
// ============================================================================

/// Callback type for waking the host event loop, possibly from another thread
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Shared "needs frame" flag the host event loop polls
#[derive(Clone, Debug, Default)]
pub struct FrameSignal {
    flag: Arc<AtomicBool>,
}

impl FrameSignal {
    /// Check and clear the flag
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Frame source backed by a monotonic clock
///
/// Requesting a frame raises a [`FrameSignal`] and calls the optional wake
/// callback. The host checks the signal, typically once per event loop
/// iteration, and ticks the frame loop when it was set.
///
/// ```ignore
/// let source = InstantFrameSource::new().with_wake_callback(move || proxy.wake());
/// let signal = source.signal();
/// let mut frames = FrameLoop::new(source);
///
/// // in the event loop
/// if signal.take() {
///     frames.tick();
/// }
/// ```
pub struct InstantFrameSource {
    epoch: Instant,
    signal: FrameSignal,
    wake_callback: Option<WakeCallback>,
    next_request: u64,
}

impl Default for InstantFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InstantFrameSource {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            signal: FrameSignal::default(),
            wake_callback: None,
            next_request: 0,
        }
    }

    /// Set a callback invoked whenever a frame is requested
    pub fn with_wake_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.wake_callback = Some(Arc::new(callback));
        self
    }

    /// Handle to the frame-request flag
    pub fn signal(&self) -> FrameSignal {
        self.signal.clone()
    }

    /// Check and clear the frame-request flag
    pub fn take_frame_request(&self) -> bool {
        self.signal.take()
    }
}

impl FrameSource for InstantFrameSource {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.signal.flag.store(true, Ordering::Release);
        if let Some(wake) = &self.wake_callback {
            wake();
        }
        let request = FrameRequest(self.next_request);
        self.next_request += 1;
        request
    }

    fn cancel_frame(&mut self, _request: FrameRequest) {
        self.signal.flag.store(false, Ordering::Release);
    }
}
