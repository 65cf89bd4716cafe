//! Sampled device state

use glam::DVec3;
use haptic_device::BUTTON_COUNT;

/// What the device reported on the most recent tick.
///
/// Written only by the sync loop, once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    pub position: DVec3,
    pub rendered_force: DVec3,
    pub buttons: [bool; BUTTON_COUNT],
    pub feedback_enabled: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rendered_force: DVec3::ZERO,
            buttons: [false; BUTTON_COUNT],
            feedback_enabled: true,
        }
    }
}

impl DeviceState {
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// Back to the neutral reading an absent device produces. The feedback
    /// flag is a setting, not a reading, and is kept.
    pub fn clear_inputs(&mut self) {
        self.position = DVec3::ZERO;
        self.rendered_force = DVec3::ZERO;
        self.buttons = [false; BUTTON_COUNT];
    }
}
