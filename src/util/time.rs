//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in seconds (fractional, for client display only)
pub fn unix_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // outer ticks (and snapshots) per second
pub const PHYSICS_TPS: u32 = 120; // physics sub-steps per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Upper bound on a single tick's elapsed time, so a stalled driver does not
/// try to catch up in one burst.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Fixed physics sub-step (in seconds)
pub fn physics_step() -> f32 {
    1.0 / PHYSICS_TPS as f32
}

/// Monotonic clock measuring seconds since the match driver started.
///
/// All simulation timestamps (spawn locks, dash windows, countdowns, liveness)
/// are expressed on this clock.
#[derive(Debug, Clone)]
pub struct GameClock {
    start: Instant,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was created
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the wall-clock delta between driver ticks.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call, clamped to [`MAX_FRAME_DELTA`]
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_FRAME_DELTA)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
