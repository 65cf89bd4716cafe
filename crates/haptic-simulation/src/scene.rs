//! Host scene seam
//!
//! The sync loop only needs to place the probe, read two bounding boxes and
//! write the liquid's displayed transform. Anything that can do that can host
//! the simulation.

use crate::buoyancy::{Aabb, LiquidTransform};
use glam::DVec3;

pub trait SceneHost {
    /// Move the probe to the device position
    fn place_probe(&mut self, position: DVec3);

    fn probe_bounds(&self) -> Aabb;

    fn liquid_bounds(&self) -> Aabb;

    /// Show the liquid at this scale and position
    fn set_liquid_transform(&mut self, transform: LiquidTransform);
}

/// Probe and liquid as plain boxes. The liquid mesh is a unit cube, so its
/// bounds are its displayed transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxScene {
    probe: Aabb,
    liquid: LiquidTransform,
}

impl BoxScene {
    pub fn new(probe_half_extents: DVec3, liquid: LiquidTransform) -> Self {
        Self {
            probe: Aabb::new(DVec3::ZERO, probe_half_extents),
            liquid,
        }
    }

    pub fn liquid_transform(&self) -> LiquidTransform {
        self.liquid
    }

    pub fn probe_position(&self) -> DVec3 {
        self.probe.center
    }
}

impl SceneHost for BoxScene {
    fn place_probe(&mut self, position: DVec3) {
        self.probe.center = position;
    }

    fn probe_bounds(&self) -> Aabb {
        self.probe
    }

    fn liquid_bounds(&self) -> Aabb {
        Aabb::new(self.liquid.position, self.liquid.scale.abs() * 0.5)
    }

    fn set_liquid_transform(&mut self, transform: LiquidTransform) {
        self.liquid = transform;
    }
}
