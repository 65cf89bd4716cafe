//! Mapping between the native device workspace and graphics space

use crate::constants::{DEFAULT_WORKSPACE_CENTER, DEFAULT_WORKSPACE_SIZE};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Graphics-space volume the device workspace is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub center: DVec3,
    pub size: DVec3,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            center: DVec3::from_array(DEFAULT_WORKSPACE_CENTER),
            size: DVec3::from_array(DEFAULT_WORKSPACE_SIZE),
        }
    }
}

impl Workspace {
    pub fn new(center: DVec3, size: DVec3) -> Self {
        Self { center, size }
    }

    /// Corner that native min maps to. Z is flipped: graphics z grows
    /// towards the user while native z grows away.
    fn graphics_from(&self) -> DVec3 {
        let half = self.size * 0.5;
        DVec3::new(
            self.center.x - half.x,
            self.center.y - half.y,
            self.center.z + half.z,
        )
    }

    /// Corner that native max maps to
    fn graphics_to(&self) -> DVec3 {
        let half = self.size * 0.5;
        DVec3::new(
            self.center.x + half.x,
            self.center.y + half.y,
            self.center.z - half.z,
        )
    }
}

/// Per-axis linear transform from native device coordinates to graphics space.
///
/// The scale is non-uniform so the whole native workspace fills the whole
/// graphics workspace on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceMapping {
    scale: DVec3,
    offset: DVec3,
}

impl WorkspaceMapping {
    pub fn new(native_min: DVec3, native_max: DVec3, graphics: &Workspace) -> Self {
        let from = graphics.graphics_from();
        let to = graphics.graphics_to();
        let scale = (to - from) / (native_max - native_min);
        let offset = from - native_min * scale;

        log::debug!("workspace mapping: scale={scale:?} offset={offset:?}");

        Self { scale, offset }
    }

    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Native device position to graphics space
    pub fn to_graphics(&self, native: DVec3) -> DVec3 {
        native * self.scale + self.offset
    }

    /// Graphics-space force to native orientation. Only the axis directions
    /// are carried over; magnitudes are left in newtons.
    pub fn force_to_native(&self, force: DVec3) -> DVec3 {
        force * self.axis_signs()
    }

    /// Native force back to graphics orientation
    pub fn force_to_graphics(&self, force: DVec3) -> DVec3 {
        force * self.axis_signs()
    }

    fn axis_signs(&self) -> DVec3 {
        let sign = |v: f64| if v == 0.0 { 0.0 } else { v.signum() };
        DVec3::new(sign(self.scale.x), sign(self.scale.y), sign(self.scale.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> WorkspaceMapping {
        WorkspaceMapping::new(
            DVec3::splat(-0.05),
            DVec3::splat(0.05),
            &Workspace::new(DVec3::new(0.0, 1.0, 0.0), DVec3::splat(2.0)),
        )
    }

    #[test]
    fn test_corners_map_to_workspace_bounds() {
        let m = mapping();
        let lo = m.to_graphics(DVec3::splat(-0.05));
        let hi = m.to_graphics(DVec3::splat(0.05));

        assert!((lo - DVec3::new(-1.0, 0.0, 1.0)).length() < 1e-12);
        assert!((hi - DVec3::new(1.0, 2.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_center_maps_to_center() {
        let p = mapping().to_graphics(DVec3::ZERO);
        assert!((p - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_force_direction_flips_z_only() {
        let m = mapping();
        let f = m.force_to_native(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(f, DVec3::new(1.0, 2.0, -3.0));
        assert_eq!(m.force_to_graphics(f), DVec3::new(1.0, 2.0, 3.0));
    }
}
