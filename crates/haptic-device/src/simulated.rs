//! In-memory device
//!
//! Behaves like an attached device from the core's point of view: it serves
//! a scripted stream of native samples, maps them into graphics space, hands
//! out handles and keeps the live primitives. It does not render primitive
//! forces. Every boundary call is recorded in a journal so callers can check
//! exactly what crossed the boundary and in which order.

use crate::boundary::DeviceBoundary;
use crate::constants::{BUTTON_COUNT, SIMULATED_NATIVE_MAX, SIMULATED_NATIVE_MIN};
use crate::primitive::{ForceKind, ForcePrimitive, Handle};
use crate::workspace::{Workspace, WorkspaceMapping};
use glam::DVec3;
use std::collections::{HashMap, VecDeque};

/// One servo sample in native device coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSample {
    pub position: DVec3,
    pub buttons: [bool; BUTTON_COUNT],
}

impl DeviceSample {
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            buttons: [false; BUTTON_COUNT],
        }
    }

    pub fn with_button(mut self, index: usize, pressed: bool) -> Self {
        self.buttons[index] = pressed;
        self
    }
}

/// A boundary call as recorded by [`SimulatedDevice`]. Reads are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOp {
    Initialize,
    CleanUp,
    SetWorkspace(Workspace),
    SetForceFeedback(bool),
    SetProxyPosition(DVec3),
    SetForce(DVec3),
    Add { kind: ForceKind, handle: Handle },
    Update { kind: ForceKind, handle: Handle },
    Remove { kind: ForceKind, handle: Handle },
    RemoveAll(ForceKind),
}

impl DeviceOp {
    /// Whether the call changes device-side state
    pub fn is_write(&self) -> bool {
        !matches!(self, DeviceOp::Initialize)
    }
}

pub struct SimulatedDevice {
    available: bool,
    initialized: bool,

    native_min: DVec3,
    native_max: DVec3,
    mapping: WorkspaceMapping,

    // Upcoming samples; the last one sticks once the script runs dry
    script: VecDeque<DeviceSample>,
    current: DeviceSample,

    feedback_enabled: bool,
    proxy_position: DVec3,
    // Native orientation
    commanded_force: DVec3,

    primitives: HashMap<Handle, ForcePrimitive>,
    next_handle: u32,

    journal: Vec<DeviceOp>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        let native_min = DVec3::from_array(SIMULATED_NATIVE_MIN);
        let native_max = DVec3::from_array(SIMULATED_NATIVE_MAX);

        Self {
            available: true,
            initialized: false,
            native_min,
            native_max,
            mapping: WorkspaceMapping::new(native_min, native_max, &Workspace::default()),
            script: VecDeque::new(),
            current: DeviceSample::default(),
            feedback_enabled: true,
            proxy_position: DVec3::ZERO,
            commanded_force: DVec3::ZERO,
            primitives: HashMap::new(),
            next_handle: 0,
            journal: Vec::new(),
        }
    }

    /// A device whose `initialize` fails, as if nothing were plugged in
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_script(samples: impl IntoIterator<Item = DeviceSample>) -> Self {
        let mut device = Self::new();
        device.script.extend(samples);
        device
    }

    pub fn mapping(&self) -> &WorkspaceMapping {
        &self.mapping
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn feedback_enabled(&self) -> bool {
        self.feedback_enabled
    }

    pub fn proxy_position(&self) -> DVec3 {
        self.proxy_position
    }

    pub fn journal(&self) -> &[DeviceOp] {
        &self.journal
    }

    /// Forces passed to `set_force`, in call order
    pub fn written_forces(&self) -> Vec<DVec3> {
        self.journal
            .iter()
            .filter_map(|op| match op {
                DeviceOp::SetForce(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    pub fn primitive(&self, handle: Handle) -> Option<&ForcePrimitive> {
        self.primitives.get(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn active_of(&self, kind: ForceKind) -> usize {
        self.primitives.values().filter(|p| p.kind() == kind).count()
    }
}

impl DeviceBoundary for SimulatedDevice {
    fn initialize(&mut self) -> bool {
        self.journal.push(DeviceOp::Initialize);

        if !self.available {
            log::warn!("simulated device: not available");
            return false;
        }

        self.initialized = true;
        self.mapping = WorkspaceMapping::new(self.native_min, self.native_max, &Workspace::default());
        true
    }

    fn clean_up(&mut self) {
        self.journal.push(DeviceOp::CleanUp);
        self.primitives.clear();
        self.initialized = false;
    }

    fn set_workspace(&mut self, workspace: Workspace) {
        self.journal.push(DeviceOp::SetWorkspace(workspace));
        self.mapping = WorkspaceMapping::new(self.native_min, self.native_max, &workspace);
    }

    fn position(&mut self) -> DVec3 {
        if let Some(sample) = self.script.pop_front() {
            self.current = sample;
        }
        self.mapping.to_graphics(self.current.position)
    }

    fn rendered_force(&mut self) -> DVec3 {
        if self.feedback_enabled {
            self.mapping.force_to_graphics(self.commanded_force)
        } else {
            DVec3::ZERO
        }
    }

    fn button(&mut self, index: usize) -> bool {
        self.current.buttons.get(index).copied().unwrap_or(false)
    }

    fn set_force_feedback_enabled(&mut self, enabled: bool) {
        self.journal.push(DeviceOp::SetForceFeedback(enabled));
        self.feedback_enabled = enabled;
    }

    fn set_proxy_position(&mut self, position: DVec3) {
        self.journal.push(DeviceOp::SetProxyPosition(position));
        self.proxy_position = position;
    }

    fn set_force(&mut self, force: DVec3) {
        self.journal.push(DeviceOp::SetForce(force));
        self.commanded_force = self.mapping.force_to_native(force);
    }

    fn add(&mut self, primitive: &ForcePrimitive) -> Handle {
        debug_assert!(self.initialized, "add on an uninitialized device");

        let handle = Handle::new(self.next_handle);
        self.next_handle += 1;
        self.primitives.insert(handle, *primitive);
        self.journal.push(DeviceOp::Add {
            kind: primitive.kind(),
            handle,
        });
        handle
    }

    fn update(&mut self, handle: Handle, primitive: &ForcePrimitive) {
        let slot = self.primitives.get_mut(&handle);
        debug_assert!(
            matches!(&slot, Some(p) if p.kind() == primitive.kind()),
            "update with stale handle {handle}"
        );
        if let Some(slot) = slot {
            *slot = *primitive;
        }
        self.journal.push(DeviceOp::Update {
            kind: primitive.kind(),
            handle,
        });
    }

    fn remove(&mut self, kind: ForceKind, handle: Handle) {
        let removed = self.primitives.remove(&handle);
        debug_assert!(
            matches!(&removed, Some(p) if p.kind() == kind),
            "remove with stale handle {handle}"
        );
        self.journal.push(DeviceOp::Remove { kind, handle });
    }

    fn remove_all(&mut self, kind: ForceKind) {
        self.primitives.retain(|_, p| p.kind() != kind);
        self.journal.push(DeviceOp::RemoveAll(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Spring, Viscosity};

    #[test]
    fn test_handles_are_never_reused() {
        let mut device = SimulatedDevice::new();
        assert!(device.initialize());

        let a = device.add(&Spring::default().into());
        device.remove(ForceKind::Spring, a);
        let b = device.add(&Spring::default().into());

        assert_ne!(a, b);
        assert_eq!(device.active_count(), 1);
    }

    #[test]
    fn test_handles_are_unique_across_kinds() {
        let mut device = SimulatedDevice::new();
        device.initialize();

        let a = device.add(&Spring::default().into());
        let b = device.add(&Viscosity::default().into());
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_all_only_touches_one_kind() {
        let mut device = SimulatedDevice::new();
        device.initialize();

        device.add(&Spring::default().into());
        device.add(&Spring::default().into());
        device.add(&Viscosity::default().into());
        device.remove_all(ForceKind::Spring);

        assert_eq!(device.active_of(ForceKind::Spring), 0);
        assert_eq!(device.active_of(ForceKind::Viscosity), 1);
    }

    #[test]
    fn test_last_sample_sticks() {
        let mut device = SimulatedDevice::with_script([
            DeviceSample::at(DVec3::ZERO),
            DeviceSample::at(DVec3::new(0.0, 0.06, 0.0)).with_button(0, true),
        ]);
        device.initialize();

        assert!(device.position().length() < 1e-12);
        assert!(!device.button(0));

        let top = device.position();
        assert!((top.y - 1.0).abs() < 1e-12);
        assert!(device.button(0));

        // Script exhausted
        assert_eq!(device.position(), top);
        assert!(device.button(0));
        assert!(!device.button(7));
    }

    #[test]
    fn test_rendered_force_respects_feedback_flag() {
        let mut device = SimulatedDevice::new();
        device.initialize();

        device.set_force(DVec3::new(0.0, 3.0, 1.0));
        assert_eq!(device.rendered_force(), DVec3::new(0.0, 3.0, 1.0));

        device.set_force_feedback_enabled(false);
        assert_eq!(device.rendered_force(), DVec3::ZERO);
    }

    #[test]
    fn test_unavailable_device_fails_to_initialize() {
        let mut device = SimulatedDevice::unavailable();
        assert!(!device.initialize());
        assert!(!device.is_initialized());
    }
}
