//! Cancellable, self-rescheduling frame loop.
//!
//! Each delivered frame runs its work and then asks the host for the next
//! one. Cancelling (explicitly or by dropping the loop) releases the pending
//! request: no frame is requested or executed afterwards.
//!
//! ```ignore
//! let mut frames = FrameLoop::new(window.clone());
//! frames.begin();
//! // in the redraw handler:
//! frames.on_frame(|| field.step(&params));
//! // on close:
//! frames.cancel();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Something that can schedule one more frame.
pub trait FrameHost {
    fn request_frame(&self);
}

impl FrameHost for winit::window::Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

impl<T: FrameHost + ?Sized> FrameHost for Arc<T> {
    fn request_frame(&self) {
        (**self).request_frame();
    }
}

/// One-frame-at-a-time loop over a [`FrameHost`].
#[derive(Debug)]
pub struct FrameLoop<H: FrameHost> {
    host: H,
    token: CancellationToken,
    pending: bool,
    frames: u64,
}

impl<H: FrameHost> FrameLoop<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            token: CancellationToken::new(),
            pending: false,
            frames: 0,
        }
    }

    /// Request the first frame. No-op if a frame is already pending or the
    /// loop has been cancelled.
    pub fn begin(&mut self) {
        if self.token.is_cancelled() || self.pending {
            return;
        }
        self.pending = true;
        self.host.request_frame();
    }

    /// Handle a delivered frame: run `work` and request the next frame.
    ///
    /// Returns `false` without running `work` once the loop is cancelled.
    pub fn on_frame<F: FnOnce()>(&mut self, work: F) -> bool {
        self.pending = false;
        if self.token.is_cancelled() {
            return false;
        }
        work();
        self.frames += 1;
        if !self.token.is_cancelled() {
            self.pending = true;
            self.host.request_frame();
        }
        true
    }

    /// Stop the loop and drop the pending request.
    pub fn cancel(&mut self) {
        if !self.token.is_cancelled() {
            tracing::debug!(frames = self.frames, "frame loop cancelled");
        }
        self.token.cancel();
        self.pending = false;
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Whether a frame has been requested and not yet delivered.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frames executed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// A token cancelled together with this loop.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: FrameHost> Drop for FrameLoop<H> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `work` every `period` until `token` is cancelled.
///
/// Headless counterpart of [`FrameLoop`]; returns the number of frames run.
/// Missed ticks are skipped rather than bursted.
pub async fn run_interval<F: FnMut()>(
    period: Duration,
    token: CancellationToken,
    mut work: F,
) -> u64 {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = 0;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                if token.is_cancelled() {
                    break;
                }
                work();
                frames += 1;
            }
        }
    }
    frames
}
