//! Per-tick device synchronization
//!
//! Each tick runs strictly in this order:
//!
//! 1. read position and buttons from the device
//! 2. place the probe, step buoyancy, reconcile force primitives anchored
//!    at the probe
//! 3. sum the force contributions
//! 4. zero the sum unless feedback is active
//! 5. write the force to the device
//!
//! The force written on a tick is always computed from the position read on
//! that same tick. Reading after computing, or writing before it, shifts the
//! commanded force a tick away from the device state it belongs to.

use crate::buoyancy::BuoyancySimulator;
use crate::config::SessionConfig;
use crate::registry::{ForcePrimitiveRegistry, ReconcileReport};
use crate::scene::SceneHost;
use crate::session::DeviceSession;
use crate::state::DeviceState;
use glam::DVec3;
use haptic_device::{DeviceBoundary, BUTTON_COUNT};
use serde::{Deserialize, Serialize};

/// When the composed force reaches the device. One policy per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackGate {
    /// Only while this button is held
    Button(usize),
    /// Whenever the standing feedback flag is on
    Flag,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        FeedbackGate::Button(0)
    }
}

impl FeedbackGate {
    pub fn is_open(&self, state: &DeviceState) -> bool {
        match *self {
            FeedbackGate::Button(index) => state.button(index),
            FeedbackGate::Flag => state.feedback_enabled,
        }
    }
}

/// What one tick read and wrote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub position: DVec3,
    pub buttons: [bool; BUTTON_COUNT],
    /// Sum of all contributions before gating
    pub composed: DVec3,
    /// Force actually written
    pub force: DVec3,
    pub gate_open: bool,
    pub primitives: ReconcileReport,
}

pub struct DeviceStateSync<D: DeviceBoundary> {
    session: DeviceSession<D>,
    registry: ForcePrimitiveRegistry,
    buoyancy: BuoyancySimulator,
    state: DeviceState,
    gate: FeedbackGate,
    tick: u64,
}

impl<D: DeviceBoundary> DeviceStateSync<D> {
    /// Open a session on `device` and configure it
    pub fn new(device: D, config: &SessionConfig) -> Self {
        let mut session = DeviceSession::open(device);
        if let Some(device) = session.boundary() {
            device.set_workspace(config.workspace);
            device.set_force_feedback_enabled(config.feedback_enabled);
        }

        let registry =
            ForcePrimitiveRegistry::with_defaults(config.forces.primitives(), &config.forces.enabled);
        let buoyancy = BuoyancySimulator::new(
            config.buoyancy.probe_density,
            config.buoyancy.liquid_density,
            config.liquid,
        );

        let state = DeviceState {
            feedback_enabled: config.feedback_enabled,
            ..DeviceState::default()
        };

        log::info!(
            "Sync ready: gate={:?}, {} force kind(s) enabled",
            config.feedback_gate,
            config.forces.enabled.len()
        );

        Self {
            session,
            registry,
            buoyancy,
            state,
            gate: config.feedback_gate,
            tick: 0,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn gate(&self) -> FeedbackGate {
        self.gate
    }

    pub fn session(&self) -> &DeviceSession<D> {
        &self.session
    }

    pub fn registry(&self) -> &ForcePrimitiveRegistry {
        &self.registry
    }

    /// Toggles and parameters take effect on the next tick
    pub fn registry_mut(&mut self) -> &mut ForcePrimitiveRegistry {
        &mut self.registry
    }

    pub fn buoyancy(&self) -> &BuoyancySimulator {
        &self.buoyancy
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn set_feedback_enabled(&mut self, enabled: bool) {
        self.state.feedback_enabled = enabled;
        if let Some(device) = self.session.boundary() {
            device.set_force_feedback_enabled(enabled);
        }
    }

    /// Remove every force primitive from the device and switch all kinds off
    pub fn reset_forces(&mut self) {
        self.registry.reset(&mut self.session);
    }

    /// Step 1: sample the device. Without a device the reading is neutral.
    fn read_inputs(&mut self) {
        let Some(device) = self.session.boundary() else {
            self.state.clear_inputs();
            return;
        };

        self.state.position = device.position();
        for index in 0..BUTTON_COUNT {
            self.state.buttons[index] = device.button(index);
        }
    }

    /// Step 5: send the force, then read back what the device renders
    fn write_force(&mut self, force: DVec3) {
        let Some(device) = self.session.boundary() else {
            return;
        };

        if !self.state.feedback_enabled {
            device.set_proxy_position(self.state.position);
        }
        device.set_force(force);
        self.state.rendered_force = device.rendered_force();
    }

    pub fn tick<S: SceneHost>(&mut self, scene: &mut S) -> TickReport {
        self.read_inputs();

        scene.place_probe(self.state.position);
        let buoyant = self
            .buoyancy
            .step(&scene.probe_bounds(), &scene.liquid_bounds());
        scene.set_liquid_transform(self.buoyancy.displayed());
        let primitives = self.registry.reconcile(&mut self.session, self.state.position);

        let composed = buoyant + self.registry.contribution();

        let gate_open = self.gate.is_open(&self.state);
        let force = if gate_open { composed } else { DVec3::ZERO };

        self.write_force(force);

        let report = TickReport {
            tick: self.tick,
            position: self.state.position,
            buttons: self.state.buttons,
            composed,
            force,
            gate_open,
            primitives,
        };
        self.tick += 1;

        log::trace!("{report:?}");
        report
    }

    /// Release the device. Later ticks run without it.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}
