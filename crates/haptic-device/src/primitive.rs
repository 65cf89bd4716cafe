//! Force primitive kinds, parameters and handles
//!
//! A force primitive is one parametrized source of haptic force that the
//! device renders on its own servo loop. The core only decides which
//! primitives exist and with what parameters; it never evaluates them.

use crate::constants::*;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The force primitive kinds a device can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceKind {
    SimpleForce = 0,
    Viscosity = 1,
    Surface = 2,
    Spring = 3,
    IntermolecularForce = 4,
    RandomForce = 5,
}

impl ForceKind {
    pub const ALL: [ForceKind; 6] = [
        ForceKind::SimpleForce,
        ForceKind::Viscosity,
        ForceKind::Surface,
        ForceKind::Spring,
        ForceKind::IntermolecularForce,
        ForceKind::RandomForce,
    ];

    /// Dense index, stable across releases
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            ForceKind::SimpleForce => "simple force",
            ForceKind::Viscosity => "viscosity",
            ForceKind::Surface => "surface",
            ForceKind::Spring => "spring",
            ForceKind::IntermolecularForce => "intermolecular force",
            ForceKind::RandomForce => "random force",
        }
    }
}

impl fmt::Display for ForceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a device-side primitive instance.
///
/// Issued by the boundary on `add` and valid until the matching `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Constant force added to the output
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleForce {
    pub force: DVec3,
}

/// Velocity-proportional drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viscosity {
    /// Damping coefficient
    pub damping: f64,
    /// Interpolation weight between the previous and the current viscous
    /// force, in 0..1. Lower values reduce vibration.
    pub weight: f64,
}

impl Default for Viscosity {
    fn default() -> Self {
        Self {
            damping: VISCOSITY_DAMPING,
            weight: VISCOSITY_WEIGHT,
        }
    }
}

/// One-sided contact plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    /// Contact point on the plane. `None` puts the plane through the probe
    /// when the surface is switched on.
    pub point: Option<DVec3>,
    pub normal: DVec3,
    pub stiffness: f64,
    pub damping: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            point: None,
            normal: DVec3::from_array(SURFACE_NORMAL),
            stiffness: SURFACE_STIFFNESS,
            damping: SURFACE_DAMPING,
        }
    }
}

/// Spring anchored at a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spring {
    /// `None` anchors at the probe when the spring is switched on
    pub anchor: Option<DVec3>,
    pub stiffness: f64,
    pub damping: f64,
    pub rest_length: f64,
    /// Length beyond which the spring breaks. `None` never breaks.
    pub max_length: Option<f64>,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            anchor: None,
            stiffness: SPRING_STIFFNESS,
            damping: SPRING_DAMPING,
            rest_length: SPRING_REST_LENGTH,
            max_length: None,
        }
    }
}

/// Linear bond that falls off past its maximum length instead of breaking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntermolecularForce {
    /// `None` anchors at the probe when the bond is switched on
    pub anchor: Option<DVec3>,
    pub stiffness: f64,
    pub damping: f64,
    /// Equilibrium bond length
    pub bond_length: f64,
    /// Length at which the force curve is mirrored
    pub max_length: f64,
}

impl Default for IntermolecularForce {
    fn default() -> Self {
        Self {
            anchor: None,
            stiffness: INTERMOLECULAR_STIFFNESS,
            damping: INTERMOLECULAR_DAMPING,
            bond_length: INTERMOLECULAR_BOND_LENGTH,
            max_length: INTERMOLECULAR_MAX_LENGTH,
        }
    }
}

/// Randomly oriented force re-rolled at random intervals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForce {
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    /// Seconds
    pub min_interval: f64,
    /// Seconds
    pub max_interval: f64,
}

impl Default for RandomForce {
    fn default() -> Self {
        Self {
            min_magnitude: RANDOM_MIN_MAGNITUDE,
            max_magnitude: RANDOM_MAX_MAGNITUDE,
            min_interval: RANDOM_MIN_INTERVAL,
            max_interval: RANDOM_MAX_INTERVAL,
        }
    }
}

/// Parameters of one force primitive, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForcePrimitive {
    SimpleForce(SimpleForce),
    Viscosity(Viscosity),
    Surface(Surface),
    Spring(Spring),
    IntermolecularForce(IntermolecularForce),
    RandomForce(RandomForce),
}

impl ForcePrimitive {
    pub fn kind(&self) -> ForceKind {
        match self {
            ForcePrimitive::SimpleForce(_) => ForceKind::SimpleForce,
            ForcePrimitive::Viscosity(_) => ForceKind::Viscosity,
            ForcePrimitive::Surface(_) => ForceKind::Surface,
            ForcePrimitive::Spring(_) => ForceKind::Spring,
            ForcePrimitive::IntermolecularForce(_) => ForceKind::IntermolecularForce,
            ForcePrimitive::RandomForce(_) => ForceKind::RandomForce,
        }
    }

    /// Fill an unset anchor with `at`. Explicit anchors and kinds without
    /// one are returned unchanged.
    pub fn anchored_at(self, at: DVec3) -> Self {
        match self {
            ForcePrimitive::Surface(mut p) => {
                p.point.get_or_insert(at);
                p.into()
            }
            ForcePrimitive::Spring(mut p) => {
                p.anchor.get_or_insert(at);
                p.into()
            }
            ForcePrimitive::IntermolecularForce(mut p) => {
                p.anchor.get_or_insert(at);
                p.into()
            }
            other => other,
        }
    }

    /// Default parameters for a kind
    pub fn default_for(kind: ForceKind) -> Self {
        match kind {
            ForceKind::SimpleForce => SimpleForce::default().into(),
            ForceKind::Viscosity => Viscosity::default().into(),
            ForceKind::Surface => Surface::default().into(),
            ForceKind::Spring => Spring::default().into(),
            ForceKind::IntermolecularForce => IntermolecularForce::default().into(),
            ForceKind::RandomForce => RandomForce::default().into(),
        }
    }
}

impl From<SimpleForce> for ForcePrimitive {
    fn from(p: SimpleForce) -> Self {
        ForcePrimitive::SimpleForce(p)
    }
}

impl From<Viscosity> for ForcePrimitive {
    fn from(p: Viscosity) -> Self {
        ForcePrimitive::Viscosity(p)
    }
}

impl From<Surface> for ForcePrimitive {
    fn from(p: Surface) -> Self {
        ForcePrimitive::Surface(p)
    }
}

impl From<Spring> for ForcePrimitive {
    fn from(p: Spring) -> Self {
        ForcePrimitive::Spring(p)
    }
}

impl From<IntermolecularForce> for ForcePrimitive {
    fn from(p: IntermolecularForce) -> Self {
        ForcePrimitive::IntermolecularForce(p)
    }
}

impl From<RandomForce> for ForcePrimitive {
    fn from(p: RandomForce) -> Self {
        ForcePrimitive::RandomForce(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_index_is_dense() {
        for (i, kind) in ForceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_default_for_matches_kind() {
        for kind in ForceKind::ALL {
            assert_eq!(ForcePrimitive::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_anchored_at_keeps_explicit_anchor() {
        let probe = DVec3::new(0.5, 0.5, 0.0);

        let follows = ForcePrimitive::from(Spring::default()).anchored_at(probe);
        assert!(matches!(follows, ForcePrimitive::Spring(s) if s.anchor == Some(probe)));

        let fixed = Surface {
            point: Some(DVec3::Y),
            ..Surface::default()
        };
        let kept = ForcePrimitive::from(fixed).anchored_at(probe);
        assert_eq!(kept, ForcePrimitive::from(fixed));

        let viscosity = ForcePrimitive::from(Viscosity::default());
        assert_eq!(viscosity.anchored_at(probe), viscosity);
    }

    #[test]
    fn test_spring_defaults_never_break() {
        assert_eq!(Spring::default().max_length, None);
        assert_eq!(Spring::default().stiffness, 2.0);
    }
}
