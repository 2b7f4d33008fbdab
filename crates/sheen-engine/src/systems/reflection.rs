//! Reflection parameter calculator.
//!
//! Turns a light sample (pointer position or device orientation) plus the
//! per-category obstruction distances into a highlight angle and brightness.

use glam::Vec2;

use crate::api::config::{Attenuation, EngineConfig, OrientationTuning};
use crate::api::types::{Rect, Viewport};
use crate::input::samples::{OrientationSample, Posture};
use crate::systems::obstruction::ObstructionDistances;

/// Highlight written to one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionParams {
    /// Degrees in [0, 360).
    pub angle: f32,
    pub brightness: f32,
}

impl ReflectionParams {
    pub fn new(angle: f32, brightness: f32) -> Self {
        Self { angle, brightness }
    }

    /// CSS value for the angle property.
    pub fn angle_css(&self) -> String {
        format!("{}deg", self.angle)
    }

    /// CSS value for the brightness property (two decimals).
    pub fn brightness_css(&self) -> String {
        format!("{:.2}", self.brightness)
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Direction of `v` in degrees, rotated 180° so the highlight faces the light.
fn facing_angle(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees() + 180.0
}

pub struct ReflectionCalculator {
    light_blend: f32,
    attenuation: Attenuation,
    orientation: OrientationTuning,
    overlay_brightness: f32,
    wood_brightness: f32,
}

impl ReflectionCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            light_blend: config.light_blend,
            attenuation: config.attenuation,
            orientation: config.orientation,
            overlay_brightness: config.overlay_brightness,
            wood_brightness: config.wood_brightness,
        }
    }

    /// Highlight for a tile lit from a pointer position.
    pub fn pointer(
        &self,
        tile: &Rect,
        light: Vec2,
        viewport: Viewport,
        distances: &ObstructionDistances,
        jitter: f32,
    ) -> ReflectionParams {
        ReflectionParams::new(
            self.pointer_angle(tile.center(), light, viewport, jitter),
            self.pointer_brightness(distances),
        )
    }

    /// The light is pulled toward the viewport centre before taking the
    /// angle, which damps extreme angles near the screen edges.
    pub fn pointer_angle(&self, center: Vec2, light: Vec2, viewport: Viewport, jitter: f32) -> f32 {
        let target = light.lerp(viewport.center(), self.light_blend);
        normalize_degrees(facing_angle(target - center) + jitter)
    }

    /// Brightness from the nearest obstructing category, 1.0 when unobstructed.
    pub fn pointer_brightness(&self, distances: &ObstructionDistances) -> f32 {
        match distances.nearest() {
            Some((category, dist)) => self.attenuation.curve(category).apply(dist),
            None => 1.0,
        }
    }

    /// Orientation angle before jitter and normalisation.
    pub fn orientation_angle(&self, sample: &OrientationSample) -> f32 {
        let base = self.orientation.base_angle;
        match sample.posture() {
            Posture::Portrait => base + sample.gamma + sample.alpha + sample.beta / 2.0,
            Posture::Landscape => base + sample.beta + sample.alpha + sample.gamma / 2.0,
        }
    }

    /// Highlight for a tile driven by device orientation. No obstruction
    /// testing: every tile gets the same value.
    pub fn orientation(&self, sample: &OrientationSample, jitter: f32) -> ReflectionParams {
        let t = &self.orientation;
        let raw = match sample.posture() {
            Posture::Portrait => 1.0 - sample.beta.abs() / t.portrait_divisor,
            Posture::Landscape => 1.0 - sample.gamma.abs() / t.landscape_divisor,
        };
        ReflectionParams::new(
            normalize_degrees(self.orientation_angle(sample) + jitter),
            raw.clamp(t.min_brightness, t.max_brightness),
        )
    }

    /// Angle for full-bleed layers in pointer mode: from the viewport centre
    /// toward the pointer, rounded to a whole degree. Without a pointer the
    /// highlight points straight up.
    pub fn backdrop_angle(&self, pointer: Option<Vec2>, viewport: Viewport, jitter: f32) -> f32 {
        let dir = match pointer {
            Some(p) => p - viewport.center(),
            None => Vec2::new(0.0, -1.0),
        };
        normalize_degrees((facing_angle(dir) + jitter).round())
    }

    pub fn overlay(&self, angle: f32) -> ReflectionParams {
        ReflectionParams::new(angle, self.overlay_brightness)
    }

    pub fn wood(&self, angle: f32) -> ReflectionParams {
        ReflectionParams::new(angle, self.wood_brightness)
    }
}
