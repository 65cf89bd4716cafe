//! Device constants and default force-primitive parameters
//!
//! The defaults are the values the probe uses when a primitive is first
//! switched on without explicit configuration.

/// Number of buttons reported by the device
pub const BUTTON_COUNT: usize = 4;

/// Default graphics workspace center
pub const DEFAULT_WORKSPACE_CENTER: [f64; 3] = [0.0, 0.0, 0.0];

/// Default graphics workspace size
pub const DEFAULT_WORKSPACE_SIZE: [f64; 3] = [2.0, 2.0, 2.0];

/// Native workspace extents of the simulated device in meters (min corner)
pub const SIMULATED_NATIVE_MIN: [f64; 3] = [-0.06, -0.06, -0.06];

/// Native workspace extents of the simulated device in meters (max corner)
pub const SIMULATED_NATIVE_MAX: [f64; 3] = [0.06, 0.06, 0.06];

// Viscosity
pub const VISCOSITY_DAMPING: f64 = 0.5;
/// Weight of the current viscous force against the previous one (0..1)
pub const VISCOSITY_WEIGHT: f64 = 0.25;

// Contact surface
pub const SURFACE_STIFFNESS: f64 = 20.0;
pub const SURFACE_DAMPING: f64 = 0.01;
pub const SURFACE_NORMAL: [f64; 3] = [0.0, 1.0, 0.0];

// Spring
pub const SPRING_STIFFNESS: f64 = 2.0;
pub const SPRING_DAMPING: f64 = 0.01;
pub const SPRING_REST_LENGTH: f64 = 0.0;

// Intermolecular force (mirrored linear spring)
pub const INTERMOLECULAR_STIFFNESS: f64 = 10.0;
pub const INTERMOLECULAR_DAMPING: f64 = 0.01;
pub const INTERMOLECULAR_BOND_LENGTH: f64 = 2.0;
pub const INTERMOLECULAR_MAX_LENGTH: f64 = 4.0;

// Random force
pub const RANDOM_MIN_MAGNITUDE: f64 = 1.0;
pub const RANDOM_MAX_MAGNITUDE: f64 = 5.0;
/// Seconds
pub const RANDOM_MIN_INTERVAL: f64 = 0.01;
/// Seconds
pub const RANDOM_MAX_INTERVAL: f64 = 0.1;
