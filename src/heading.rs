//! Heading smoother: a damped pointer towards the current target.
//!
//! The pointer angle is relative to where the device faces: `0` means
//! straight ahead. Each step moves the pointer a fraction of the way
//! towards the new relative bearing, always along the shorter arc.
//!
//! Two damping modes:
//!
//! - [`Smoothing::PerSample`]: a fixed fraction per compass sample. Simple,
//!   but responsiveness depends on how often the sensor reports.
//! - [`Smoothing::TimeConstant`]: exponential decay over elapsed time, so
//!   the pointer settles at the same speed on any sensor.

mod feed;

pub use feed::{HeadingFeed, LineHeadingFeed, Permission};

use std::time::Duration;

use jiff::Timestamp;

use crate::model::HeadingSample;

/// Fraction of the remaining turn taken per sample.
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// Move this fraction of the way on every sample.
    PerSample(f64),

    /// Close `1 - 1/e` of the gap per time constant.
    TimeConstant(Duration),
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::PerSample(DEFAULT_SMOOTHING_FACTOR)
    }
}

/// In-memory heading state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadingState {
    /// Last compass reading, [0, 360).
    pub raw_heading_degrees: f64,

    /// Damped pointer rotation. Not wrapped; only its value mod 360 matters.
    pub smoothed_pointer_degrees: f64,
}

#[derive(Debug, Clone)]
pub struct HeadingSmoother {
    smoothing: Smoothing,
    state: HeadingState,
    has_heading: bool,
    last_step_at: Option<Timestamp>,
}

impl HeadingSmoother {
    pub fn new(smoothing: Smoothing) -> Self {
        Self {
            smoothing,
            state: HeadingState::default(),
            has_heading: false,
            last_step_at: None,
        }
    }

    /// Takes a new compass sample. Moves the pointer when there is a
    /// target to point at; otherwise only remembers the heading.
    pub fn update(
        &mut self,
        sample: HeadingSample,
        target_bearing: Option<f64>,
    ) -> Option<HeadingState> {
        self.state.raw_heading_degrees = sample.degrees;
        self.has_heading = true;
        let target = target_bearing?;
        Some(self.step(target, sample.received_at))
    }

    /// Re-aims at a new target bearing using the last compass heading.
    ///
    /// Returns `None` until a compass sample has arrived.
    pub fn reaim(&mut self, target_bearing: f64, at: Timestamp) -> Option<HeadingState> {
        if !self.has_heading {
            return None;
        }
        Some(self.step(target_bearing, at))
    }

    fn step(&mut self, target_bearing: f64, at: Timestamp) -> HeadingState {
        let relative = (target_bearing - self.state.raw_heading_degrees + 360.0) % 360.0;
        let delta = shortest_turn(relative - self.state.smoothed_pointer_degrees);
        let alpha = self.alpha(at);

        self.state.smoothed_pointer_degrees += delta * alpha;
        self.last_step_at = Some(self.last_step_at.map_or(at, |prev| prev.max(at)));
        self.state
    }

    fn alpha(&self, at: Timestamp) -> f64 {
        match self.smoothing {
            Smoothing::PerSample(factor) => factor,
            Smoothing::TimeConstant(tau) => match self.last_step_at {
                Some(prev) if at > prev => {
                    let dt = at.duration_since(prev).as_secs_f64();
                    let tau = tau.as_secs_f64();
                    if tau <= 0.0 {
                        1.0
                    } else {
                        1.0 - (-dt / tau).exp()
                    }
                }
                _ => DEFAULT_SMOOTHING_FACTOR,
            },
        }
    }
}

/// Folds an angle difference into [-180, 180].
fn shortest_turn(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}
