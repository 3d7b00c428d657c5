//! Per-frame heading interpolation
//!
//! The smoother eases the displayed heading toward the latest target once
//! per render tick. Interpolation speeds up with distance, is capped, and
//! always takes the short way around the wrap. Large target jumps are not
//! smoothed at all.

use serde::{Deserialize, Serialize};

use crate::math::{angular_distance, normalize_angle, shortest_angle_diff};

/// Smoothing tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Fraction of the remaining distance covered per tick, before boost
    pub interpolation_speed: f64,
    /// Distances at or below this are left alone
    pub threshold: f64,
    /// Cap on the boosted speed
    pub max_speed: f64,
    /// Target jumps larger than this snap instead of easing
    pub snap_threshold: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            interpolation_speed: 0.1,
            threshold: 0.1,
            max_speed: 0.3,
            snap_threshold: 45.0,
        }
    }
}

impl SmoothingConfig {
    /// Profile used by the navigation screen
    pub fn navigation() -> Self {
        Self {
            interpolation_speed: 0.15,
            threshold: 0.05,
            ..Self::default()
        }
    }

    /// Boosted speed for a given remaining distance
    pub fn speed_for(&self, distance: f64) -> f64 {
        (self.interpolation_speed * (1.0 + distance.abs() / 90.0)).min(self.max_speed)
    }
}

/// Stateful heading smoother
///
/// Owned by a single render loop; call [`HeadingSmoother::update`] once per
/// tick.
#[derive(Debug, Clone)]
pub struct HeadingSmoother {
    config: SmoothingConfig,
    current: f64,
    last_target: f64,
}

impl HeadingSmoother {
    /// Create a smoother resting at 0 degrees
    pub fn new(config: SmoothingConfig) -> Self {
        Self::starting_at(config, 0.0)
    }

    /// Create a smoother resting at `angle`
    pub fn starting_at(config: SmoothingConfig, angle: f64) -> Self {
        let angle = normalize_angle(angle);
        Self {
            config,
            current: angle,
            last_target: angle,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Current displayed angle, in `[0, 360)`
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Jump to `angle` and treat it as the last seen target
    pub fn reset(&mut self, angle: f64) {
        let angle = normalize_angle(angle);
        self.current = angle;
        self.last_target = angle;
    }

    /// Advance one tick toward `target` and return the new angle
    ///
    /// Non-finite targets are ignored.
    pub fn update(&mut self, target: f64) -> f64 {
        if !target.is_finite() {
            return self.current;
        }
        let target = normalize_angle(target);

        let jump = angular_distance(target, self.last_target);
        self.last_target = target;

        if jump > self.config.snap_threshold {
            tracing::debug!(from = self.current, to = target, jump, "heading snapped");
            self.current = target;
            return self.current;
        }

        let diff = shortest_angle_diff(target, self.current);
        if diff.abs() > self.config.threshold {
            let speed = self.config.speed_for(diff);
            self.current = normalize_angle(self.current + diff * speed);
        }

        self.current
    }
}

impl Default for HeadingSmoother {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
