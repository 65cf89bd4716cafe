//! # Haptic Device
//!
//! Everything the simulation core may ask of a force-feedback device: the
//! force primitive data model, the boundary trait, the mapping between the
//! device workspace and graphics space, and two boundary implementations
//! (an in-memory simulated device and the native vendor plugin).

pub mod boundary;
pub mod constants;
pub mod error;
pub mod native;
pub mod primitive;
pub mod simulated;
pub mod vector;
pub mod workspace;

pub use boundary::*;
pub use constants::*;
pub use error::*;
pub use native::NativeDevice;
pub use primitive::*;
pub use simulated::*;
pub use vector::*;
pub use workspace::*;
