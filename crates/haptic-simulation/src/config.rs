//! Session configuration
//!
//! Read once when a session starts and never changed while it runs. Every
//! section has defaults, so a partial TOML file is a valid config.

use crate::buoyancy::LiquidTransform;
use crate::error::{ConfigError, ConfigResult};
use crate::sync::FeedbackGate;
use glam::DVec3;
use haptic_device::{
    ForceKind, ForcePrimitive, IntermolecularForce, RandomForce, SimpleForce, Spring, Surface,
    Viscosity, Workspace, BUTTON_COUNT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed tick rate of the sync loop
    pub tick_rate_hz: f64,
    /// Standing force-feedback switch, passed on to the device
    pub feedback_enabled: bool,
    /// Condition under which the composed force is sent
    pub feedback_gate: FeedbackGate,

    pub buoyancy: BuoyancyConfig,
    /// Liquid transform at rest
    pub liquid: LiquidTransform,
    pub probe: ProbeConfig,
    pub workspace: Workspace,
    pub forces: ForceDefaults,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50.0,
            feedback_enabled: true,
            feedback_gate: FeedbackGate::default(),
            buoyancy: BuoyancyConfig::default(),
            liquid: LiquidTransform {
                scale: DVec3::new(2.0, 1.0, 2.0),
                position: DVec3::new(0.0, -0.5, 0.0),
            },
            probe: ProbeConfig::default(),
            workspace: Workspace::default(),
            forces: ForceDefaults::default(),
        }
    }
}

/// Densities in g/cm³
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyConfig {
    pub probe_density: f64,
    pub liquid_density: f64,
}

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self {
            probe_density: 0.5,
            liquid_density: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub half_extents: DVec3,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            half_extents: DVec3::splat(0.1),
        }
    }
}

/// Starting parameters per force kind, and which kinds start switched on
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceDefaults {
    pub enabled: Vec<ForceKind>,
    pub simple_force: SimpleForce,
    pub viscosity: Viscosity,
    pub surface: Surface,
    pub spring: Spring,
    pub intermolecular_force: IntermolecularForce,
    pub random_force: RandomForce,
}

impl ForceDefaults {
    pub fn primitives(&self) -> [ForcePrimitive; 6] {
        [
            self.simple_force.into(),
            self.viscosity.into(),
            self.surface.into(),
            self.spring.into(),
            self.intermolecular_force.into(),
            self.random_force.into(),
        ]
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&raw)?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(invalid("tick_rate_hz", "must be positive"));
        }

        let densities = [
            ("buoyancy.probe_density", self.buoyancy.probe_density),
            ("buoyancy.liquid_density", self.buoyancy.liquid_density),
        ];
        for (field, density) in densities {
            if !(density.is_finite() && density > 0.0) {
                return Err(invalid(field, format!("{density} is not a positive density")));
            }
        }

        if self.workspace.size.cmpeq(DVec3::ZERO).any() {
            return Err(invalid("workspace.size", "every axis must be non-zero"));
        }

        // Footprint divides the displaced volume
        if self.liquid.scale.x == 0.0 || self.liquid.scale.z == 0.0 {
            return Err(invalid("liquid.scale", "liquid footprint must have area"));
        }
        if self.liquid.scale.y == 0.0 {
            return Err(invalid("liquid.scale", "liquid must have height"));
        }

        if let FeedbackGate::Button(index) = self.feedback_gate {
            if index >= BUTTON_COUNT {
                return Err(invalid(
                    "feedback_gate",
                    format!("button {index} out of range 0..{BUTTON_COUNT}"),
                ));
            }
        }

        Ok(())
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            feedback_gate = "flag"

            [buoyancy]
            liquid_density = 2.0

            [forces]
            enabled = ["spring", "viscosity"]

            [forces.spring]
            stiffness = 4.0
            max_length = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.feedback_gate, FeedbackGate::Flag);
        assert_eq!(config.buoyancy.liquid_density, 2.0);
        assert_eq!(config.buoyancy.probe_density, 0.5);
        assert_eq!(config.forces.enabled, vec![ForceKind::Spring, ForceKind::Viscosity]);
        assert_eq!(config.forces.spring.stiffness, 4.0);
        assert_eq!(config.forces.spring.max_length, Some(0.5));
        assert_eq!(config.forces.spring.damping, 0.01);
        assert_eq!(config.workspace, Workspace::default());
    }

    #[test]
    fn test_button_gate_and_vectors_parse() {
        let config = SessionConfig::from_toml_str(
            r#"
            feedback_gate = { button = 2 }

            [liquid]
            scale = [10.0, 2.0, 10.0]
            position = [0.0, -1.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.feedback_gate, FeedbackGate::Button(2));
        assert_eq!(config.liquid.scale, DVec3::new(10.0, 2.0, 10.0));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = SessionConfig::from_toml_str("[buoyancy]\nprobe_density = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "buoyancy.probe_density", .. }));

        let err = SessionConfig::from_toml_str("feedback_gate = { button = 4 }").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "feedback_gate", .. }));

        let err = SessionConfig::from_toml_str("[liquid]\nscale = [0.0, 1.0, 1.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "liquid.scale", .. }));

        let err = SessionConfig::from_toml_str("[workspace]\nsize = [1.0, 0.0, 1.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "workspace.size", .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = SessionConfig::from_toml_str("tick_rate_hz = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_rate_hz = 100.0").unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_rate_hz, 100.0);
        assert_eq!(config.tick_period(), std::time::Duration::from_millis(10));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SessionConfig::load("/nonexistent/haptics.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
