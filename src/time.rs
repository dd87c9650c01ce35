//! Frame timing.
//!
//! [`Time`] is ticked once per delivered frame and provides elapsed time
//! (which drives the pulse-ring animation), delta time and a smoothed FPS
//! figure for the window title.

use std::time::{Duration, Instant};

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Record a frame at the current instant.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Record a frame at `now`. Instants earlier than the last frame count
    /// as zero delta.
    pub fn tick_at(&mut self, now: Instant) {
        self.delta_secs = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now.max(self.last_frame);
        self.elapsed_secs = self.last_frame.duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let since_fps = self.last_frame.duration_since(self.fps_update_time);
        if since_fps >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = self.last_frame;
        }
    }

    /// Seconds since the tracker was created, as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Ticks recorded so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed every half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
    }

    #[test]
    fn test_tick_accumulates() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        time.tick_at(t0 + Duration::from_millis(100));
        time.tick_at(t0 + Duration::from_millis(250));

        assert_eq!(time.frame(), 2);
        assert!((time.delta() - 0.15).abs() < 1e-4);
        assert!((time.elapsed() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_fps_updates_after_interval() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        for i in 1..=30 {
            time.tick_at(t0 + Duration::from_millis(i * 20));
        }
        // 30 frames over 0.6s
        assert!((time.fps() - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_backwards_instant_is_zero_delta() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0 + Duration::from_millis(50));
        time.tick_at(t0);
        assert_eq!(time.delta(), 0.0);
    }
}
