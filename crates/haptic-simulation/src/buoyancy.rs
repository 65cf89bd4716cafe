//! Buoyancy of a box-shaped probe in a box-shaped liquid
//!
//! Densities are in g/cm³ and lengths in meters, so weights come out in
//! newtons after the ×1000 density conversion. Both bodies are treated as
//! rectangular prisms, which makes their bounding boxes exact stand-ins for
//! their shapes. The displaced volume is only exact while the probe's
//! footprint lies inside the liquid's footprint.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Standard gravity, m/s²
pub const GRAVITY: f64 = 9.80665;

/// g/cm³ to kg/m³
pub const DENSITY_TO_SI: f64 = 1000.0;

/// Axis-aligned bounding box, center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: DVec3,
    pub half_extents: DVec3,
}

impl Aabb {
    pub fn new(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn from_min_max(min: DVec3, max: DVec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> DVec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> DVec3 {
        self.center + self.half_extents
    }

    pub fn size(&self) -> DVec3 {
        self.half_extents * 2.0
    }

    /// Touching faces count as intersecting
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());

        a_min.x <= b_max.x
            && a_max.x >= b_min.x
            && a_min.y <= b_max.y
            && a_max.y >= b_min.y
            && a_min.z <= b_max.z
            && a_max.z >= b_min.z
    }
}

/// Displayed scale and position of the liquid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidTransform {
    pub scale: DVec3,
    pub position: DVec3,
}

impl Default for LiquidTransform {
    fn default() -> Self {
        Self {
            scale: DVec3::ONE,
            position: DVec3::ZERO,
        }
    }
}

/// Weight in newtons of a box of the given density (g/cm³) and size (m)
pub fn weight(density: f64, volume: DVec3) -> f64 {
    let mass = density * DENSITY_TO_SI * volume.x * volume.y * volume.z;
    mass * GRAVITY
}

/// Box of liquid the probe pushes aside: full probe footprint, submerged
/// height clamped to the probe's own height
pub fn displaced_volume(probe: &Aabb, liquid: &Aabb) -> DVec3 {
    let size = probe.size();
    let under = (liquid.max().y - probe.min().y).clamp(0.0, size.y);
    DVec3::new(size.x, under, size.z)
}

/// Rise of the liquid surface when `volume` is spread over its footprint.
///
/// The footprint must have non-zero area.
pub fn surface_offset(volume: DVec3, liquid: &Aabb) -> f64 {
    let liquid_size = liquid.size();
    let area = liquid_size.x * liquid_size.z;
    volume.x * volume.y * volume.z / area
}

pub struct BuoyancySimulator {
    probe_density: f64,
    liquid_density: f64,
    // Captured once; every displacement starts from here
    rest: LiquidTransform,
    displayed: LiquidTransform,
}

impl BuoyancySimulator {
    pub fn new(probe_density: f64, liquid_density: f64, rest: LiquidTransform) -> Self {
        Self {
            probe_density,
            liquid_density,
            rest,
            displayed: rest,
        }
    }

    pub fn probe_density(&self) -> f64 {
        self.probe_density
    }

    pub fn liquid_density(&self) -> f64 {
        self.liquid_density
    }

    pub fn rest(&self) -> LiquidTransform {
        self.rest
    }

    pub fn displayed(&self) -> LiquidTransform {
        self.displayed
    }

    /// Net vertical force on the probe and the new displayed liquid
    /// transform for this tick's bounds.
    ///
    /// Out of the liquid the force is zero and the liquid is shown at rest.
    pub fn step(&mut self, probe: &Aabb, liquid: &Aabb) -> DVec3 {
        if !probe.intersects(liquid) {
            self.displayed = self.rest;
            return DVec3::ZERO;
        }

        let volume = displaced_volume(probe, liquid);
        let probe_weight = weight(self.probe_density, probe.size());
        let buoyant = weight(self.liquid_density, volume);

        self.displace(volume, liquid);

        DVec3::new(0.0, buoyant - probe_weight, 0.0)
    }

    /// Raise the liquid top by the displaced volume, keeping its base in place
    fn displace(&mut self, volume: DVec3, liquid: &Aabb) {
        let offset = surface_offset(volume, liquid);
        let height = liquid.size().y;

        let mut displayed = self.rest;
        displayed.scale.y *= (height + offset) / height;
        // Origin is at the center, so half the rise keeps the base fixed
        displayed.position.y += offset / 2.0;

        self.displayed = displayed;
    }
}
