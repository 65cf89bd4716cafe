//! # Haptic Simulation
//!
//! Per-tick composition of the force commanded to a haptic device: a registry
//! of device-side force primitives, a buoyancy model for a probe in a liquid,
//! and the synchronization loop that reads the device, runs both, and writes
//! the result back.

pub mod buoyancy;
pub mod config;
pub mod error;
pub mod registry;
pub mod scene;
pub mod session;
pub mod state;
pub mod sync;

pub use buoyancy::*;
pub use config::*;
pub use error::*;
pub use registry::*;
pub use scene::*;
pub use session::*;
pub use state::*;
pub use sync::*;
