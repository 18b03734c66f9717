use serde::Deserialize;

use crate::constants::{LOOK_SENSITIVITY, VERTICAL_ANGLE_CLAMP};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LookSettings {
    pub sensitivity_x: f32,
    pub sensitivity_y: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Degrees above or below the horizon the camera may pitch.
    pub vertical_clamp: f32,
}

impl Default for LookSettings {
    fn default() -> Self {
        Self {
            sensitivity_x: LOOK_SENSITIVITY,
            sensitivity_y: LOOK_SENSITIVITY,
            invert_x: false,
            invert_y: false,
            vertical_clamp: VERTICAL_ANGLE_CLAMP,
        }
    }
}

/// Yaw/pitch camera orientation driven by pointer drags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookController {
    settings: LookSettings,
    yaw: f32,
    pitch: f32,
}

impl LookController {
    pub fn new(settings: LookSettings) -> Self {
        Self { settings, yaw: 0.0, pitch: 0.0 }
    }

    /// Applies a drag of `(dx, dy)` pixels. Dragging up looks up unless `invert_y` is set.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let sx = if self.settings.invert_x { -1.0 } else { 1.0 };
        let sy = if self.settings.invert_y { 1.0 } else { -1.0 };

        self.yaw = (self.yaw + dx * self.settings.sensitivity_x * sx).rem_euclid(360.0);
        // Keeps the camera from flipping over the poles.
        let clamp = self.settings.vertical_clamp.abs();
        self.pitch = (self.pitch + dy * self.settings.sensitivity_y * sy).clamp(-clamp, clamp);
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Unit vector the camera looks along (+Z at zero yaw and pitch, +Y up).
    pub fn forward(&self) -> [f32; 3] {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        [
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        ]
    }
}
