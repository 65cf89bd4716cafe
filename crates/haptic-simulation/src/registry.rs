//! Force primitive registry
//!
//! Tracks, per force kind, whether the host wants that primitive and which
//! device-side instance currently backs it. The two are brought in line once
//! per tick by `reconcile`:
//!
//! | desired | handle | action                          |
//! |---------|--------|---------------------------------|
//! | true    | none   | create, store the new handle    |
//! | true    | some   | update parameters in place      |
//! | false   | some   | remove, forget the handle       |
//! | false   | none   | nothing                         |
//!
//! Primitives without an explicit anchor (surface, spring, intermolecular
//! force) are anchored at the probe position of the tick that creates them,
//! and stay there until switched off.

use crate::session::DeviceSession;
use glam::DVec3;
use haptic_device::{DeviceBoundary, ForceKind, ForcePrimitive, Handle};

/// Desired state of one kind and the handle backing it, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub desired: bool,
    pub handle: Option<Handle>,
}

impl ToggleState {
    /// Desired state and device state agree
    pub fn is_settled(&self) -> bool {
        self.desired == self.handle.is_some()
    }
}

/// Boundary calls issued by one `reconcile`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub created: u32,
    pub updated: u32,
    pub removed: u32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    toggle: ToggleState,
    params: ForcePrimitive,
    // Probe position captured on creation
    anchor: Option<DVec3>,
}

impl Entry {
    /// Parameters as sent to the device
    fn resolved(&self) -> ForcePrimitive {
        match self.anchor {
            Some(at) => self.params.anchored_at(at),
            None => self.params,
        }
    }
}

/// At most one device-side primitive per kind, keyed by `ForceKind::index()`
pub struct ForcePrimitiveRegistry {
    entries: [Entry; 6],
    warned_inactive: bool,
}

impl Default for ForcePrimitiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ForcePrimitiveRegistry {
    /// All kinds off, default parameters
    pub fn new() -> Self {
        Self {
            entries: ForceKind::ALL.map(|kind| Entry {
                toggle: ToggleState::default(),
                params: ForcePrimitive::default_for(kind),
                anchor: None,
            }),
            warned_inactive: false,
        }
    }

    /// Seed parameters and initial toggles
    pub fn with_defaults(
        params: impl IntoIterator<Item = ForcePrimitive>,
        enabled: &[ForceKind],
    ) -> Self {
        let mut registry = Self::new();
        for primitive in params {
            registry.set_params(primitive);
        }
        for &kind in enabled {
            registry.set_enabled(kind, true);
        }
        registry
    }

    fn entry_mut(&mut self, kind: ForceKind) -> &mut Entry {
        &mut self.entries[kind.index()]
    }

    /// Set parameters and desired state for the primitive's kind
    pub fn set_desired(&mut self, primitive: ForcePrimitive, desired: bool) {
        let entry = self.entry_mut(primitive.kind());
        entry.params = primitive;
        entry.toggle.desired = desired;
    }

    /// Toggle a kind, keeping its parameters
    pub fn set_enabled(&mut self, kind: ForceKind, desired: bool) {
        self.entry_mut(kind).toggle.desired = desired;
    }

    /// Replace a kind's parameters. While the kind is off they are kept for
    /// the next enable.
    pub fn set_params(&mut self, primitive: ForcePrimitive) {
        self.entry_mut(primitive.kind()).params = primitive;
    }

    pub fn toggle(&self, kind: ForceKind) -> ToggleState {
        self.entries[kind.index()].toggle
    }

    pub fn params(&self, kind: ForceKind) -> &ForcePrimitive {
        &self.entries[kind.index()].params
    }

    /// Handles currently backing a primitive
    pub fn active_handles(&self) -> impl Iterator<Item = (ForceKind, Handle)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.toggle.handle.map(|h| (e.params.kind(), h)))
    }

    /// Bring device-side primitives in line with the desired toggles.
    ///
    /// Call once per tick with the probe position read on that tick. Without
    /// a live device nothing happens and toggles stay pending.
    pub fn reconcile<D: DeviceBoundary>(
        &mut self,
        session: &mut DeviceSession<D>,
        probe: DVec3,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let Some(device) = session.boundary() else {
            if !self.warned_inactive {
                log::warn!("Force primitives not applied: no device session");
                self.warned_inactive = true;
            }
            return report;
        };

        for entry in &mut self.entries {
            let kind = entry.params.kind();

            match (entry.toggle.desired, entry.toggle.handle) {
                (true, None) => {
                    entry.anchor = Some(probe);
                    let handle = device.add(&entry.resolved());
                    entry.toggle.handle = Some(handle);
                    report.created += 1;
                    log::debug!("{kind} on as {handle}");
                }
                (true, Some(handle)) => {
                    device.update(handle, &entry.resolved());
                    report.updated += 1;
                }
                (false, Some(handle)) => {
                    device.remove(kind, handle);
                    entry.toggle.handle = None;
                    entry.anchor = None;
                    report.removed += 1;
                    log::debug!("{kind} off, released {handle}");
                }
                (false, None) => {}
            }
        }

        report
    }

    /// Remove every device-side primitive and switch every kind off
    pub fn reset<D: DeviceBoundary>(&mut self, session: &mut DeviceSession<D>) {
        if let Some(device) = session.boundary() {
            device.reset_forces();
        }
        for entry in &mut self.entries {
            entry.toggle = ToggleState::default();
            entry.anchor = None;
        }
    }

    /// Host-side share of the output force. Primitives are rendered by the
    /// device itself, so nothing is added here.
    pub fn contribution(&self) -> DVec3 {
        DVec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptic_device::{DeviceOp, SimpleForce, SimulatedDevice, Spring, Surface};

    fn session() -> DeviceSession<SimulatedDevice> {
        DeviceSession::open(SimulatedDevice::new())
    }

    fn ops(session: &DeviceSession<SimulatedDevice>) -> Vec<DeviceOp> {
        session
            .device()
            .journal()
            .iter()
            .filter(|op| !matches!(op, DeviceOp::Initialize))
            .cloned()
            .collect()
    }

    #[test]
    fn test_enable_is_idempotent_for_every_kind() {
        for kind in ForceKind::ALL {
            let mut session = session();
            let mut registry = ForcePrimitiveRegistry::new();

            registry.set_desired(ForcePrimitive::default_for(kind), true);
            let first = registry.reconcile(&mut session, DVec3::ZERO);
            let second = registry.reconcile(&mut session, DVec3::ZERO);

            assert_eq!(first, ReconcileReport { created: 1, updated: 0, removed: 0 });
            assert_eq!(second, ReconcileReport { created: 0, updated: 1, removed: 0 });

            let handle = registry.toggle(kind).handle.unwrap();
            assert_eq!(
                ops(&session),
                vec![
                    DeviceOp::Add { kind, handle },
                    DeviceOp::Update { kind, handle },
                ]
            );
            assert_eq!(session.device().active_of(kind), 1);
        }
    }

    #[test]
    fn test_disable_removes_once_and_reenable_gets_fresh_handle() {
        for kind in ForceKind::ALL {
            let mut session = session();
            let mut registry = ForcePrimitiveRegistry::new();

            registry.set_enabled(kind, true);
            registry.reconcile(&mut session, DVec3::ZERO);
            let old = registry.toggle(kind).handle.unwrap();

            registry.set_enabled(kind, false);
            let report = registry.reconcile(&mut session, DVec3::ZERO);
            assert_eq!(report.removed, 1);
            assert_eq!(registry.toggle(kind).handle, None);
            assert!(session.device().primitive(old).is_none());

            // Nothing more to do while off
            assert_eq!(registry.reconcile(&mut session, DVec3::ZERO), ReconcileReport::default());

            registry.set_enabled(kind, true);
            registry.reconcile(&mut session, DVec3::ZERO);
            let new = registry.toggle(kind).handle.unwrap();
            assert_ne!(old, new);

            let removes = ops(&session)
                .into_iter()
                .filter(|op| matches!(op, DeviceOp::Remove { .. }))
                .count();
            assert_eq!(removes, 1);
        }
    }

    #[test]
    fn test_params_set_while_disabled_apply_on_enable() {
        let mut session = session();
        let mut registry = ForcePrimitiveRegistry::new();

        let spring = Spring {
            stiffness: 7.5,
            ..Spring::default()
        };
        registry.set_desired(spring.into(), false);
        registry.reconcile(&mut session, DVec3::ZERO);
        assert_eq!(session.device().active_count(), 0);

        registry.set_enabled(ForceKind::Spring, true);
        registry.reconcile(&mut session, DVec3::ZERO);

        let handle = registry.toggle(ForceKind::Spring).handle.unwrap();
        let expected = ForcePrimitive::from(spring).anchored_at(DVec3::ZERO);
        assert_eq!(session.device().primitive(handle), Some(&expected));
    }

    #[test]
    fn test_update_carries_new_params() {
        let mut session = session();
        let mut registry = ForcePrimitiveRegistry::new();

        registry.set_desired(SimpleForce::default().into(), true);
        registry.reconcile(&mut session, DVec3::ZERO);

        let pushed = SimpleForce {
            force: DVec3::new(0.0, -5.0, 0.0),
        };
        registry.set_params(pushed.into());
        registry.reconcile(&mut session, DVec3::ZERO);

        let handle = registry.toggle(ForceKind::SimpleForce).handle.unwrap();
        assert_eq!(session.device().primitive(handle), Some(&ForcePrimitive::from(pushed)));
    }

    #[test]
    fn test_anchor_captured_on_enable_and_held_until_disabled() {
        let mut session = session();
        let mut registry = ForcePrimitiveRegistry::with_defaults([], &[ForceKind::Spring]);
        let first = DVec3::new(0.5, 0.5, 0.0);
        let later = DVec3::new(-0.2, 0.1, 0.3);

        registry.reconcile(&mut session, first);
        registry.reconcile(&mut session, later);
        let handle = registry.toggle(ForceKind::Spring).handle.unwrap();
        assert!(matches!(
            session.device().primitive(handle),
            Some(ForcePrimitive::Spring(s)) if s.anchor == Some(first)
        ));

        registry.set_enabled(ForceKind::Spring, false);
        registry.reconcile(&mut session, later);
        registry.set_enabled(ForceKind::Spring, true);
        registry.reconcile(&mut session, later);

        let handle = registry.toggle(ForceKind::Spring).handle.unwrap();
        assert!(matches!(
            session.device().primitive(handle),
            Some(ForcePrimitive::Spring(s)) if s.anchor == Some(later)
        ));
    }

    #[test]
    fn test_explicit_anchor_ignores_probe() {
        let mut session = session();
        let mut registry = ForcePrimitiveRegistry::new();
        let fixed = Surface {
            point: Some(DVec3::new(0.0, -0.5, 0.0)),
            ..Surface::default()
        };

        registry.set_desired(fixed.into(), true);
        registry.reconcile(&mut session, DVec3::new(0.3, 0.3, 0.3));

        let handle = registry.toggle(ForceKind::Surface).handle.unwrap();
        assert_eq!(session.device().primitive(handle), Some(&ForcePrimitive::from(fixed)));
    }

    #[test]
    fn test_handles_unique_across_kinds() {
        let mut session = session();
        let mut registry = ForcePrimitiveRegistry::with_defaults([], &ForceKind::ALL);
        registry.reconcile(&mut session, DVec3::ZERO);

        let mut handles: Vec<_> = registry.active_handles().map(|(_, h)| h).collect();
        handles.sort();
        handles.dedup();
        assert_eq!(handles.len(), ForceKind::ALL.len());
    }

    #[test]
    fn test_inactive_session_is_a_no_op() {
        let mut session = DeviceSession::open(SimulatedDevice::unavailable());
        let mut registry = ForcePrimitiveRegistry::new();

        registry.set_enabled(ForceKind::Viscosity, true);
        assert_eq!(registry.reconcile(&mut session, DVec3::ZERO), ReconcileReport::default());
        assert_eq!(registry.reconcile(&mut session, DVec3::ZERO), ReconcileReport::default());

        let toggle = registry.toggle(ForceKind::Viscosity);
        assert!(toggle.desired);
        assert_eq!(toggle.handle, None);
        assert!(!toggle.is_settled());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session();
        let mut registry =
            ForcePrimitiveRegistry::with_defaults([], &[ForceKind::Spring, ForceKind::Surface]);
        registry.reconcile(&mut session, DVec3::ZERO);
        assert_eq!(session.device().active_count(), 2);

        registry.reset(&mut session);

        assert_eq!(session.device().active_count(), 0);
        assert_eq!(registry.active_handles().count(), 0);
        assert_eq!(registry.reconcile(&mut session, DVec3::ZERO), ReconcileReport::default());
    }
}
