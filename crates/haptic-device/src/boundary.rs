//! The device boundary
//!
//! All calls are synchronous and must finish within one tick. Callers issue
//! them from a single thread of control; implementations are not reentrant.

use crate::primitive::{ForceKind, ForcePrimitive, Handle};
use crate::workspace::Workspace;
use glam::DVec3;

/// Operations the core may issue against a haptic device.
///
/// `update` and `remove` must only ever be called with a handle returned by
/// `add` on the same device that has not been removed since. What happens
/// otherwise is up to the implementation.
pub trait DeviceBoundary {
    /// Open the device. Returns `false` when the device is unavailable.
    fn initialize(&mut self) -> bool;

    /// Release the device. No further calls follow.
    fn clean_up(&mut self);

    /// Graphics-space volume the device workspace maps onto
    fn set_workspace(&mut self, workspace: Workspace);

    /// Device position in graphics space
    fn position(&mut self) -> DVec3;

    /// Force the device is currently rendering
    fn rendered_force(&mut self) -> DVec3;

    /// Button state, `index` in `0..BUTTON_COUNT`
    fn button(&mut self, index: usize) -> bool;

    fn set_force_feedback_enabled(&mut self, enabled: bool);

    /// Position the device renders primitives against while force feedback
    /// is disabled
    fn set_proxy_position(&mut self, position: DVec3);

    /// Host-composed force, in graphics-space orientation
    fn set_force(&mut self, force: DVec3);

    /// Create a primitive. Always succeeds on an initialized device.
    fn add(&mut self, primitive: &ForcePrimitive) -> Handle;

    /// Replace the parameters of a live primitive
    fn update(&mut self, handle: Handle, primitive: &ForcePrimitive);

    /// Destroy a live primitive, invalidating its handle
    fn remove(&mut self, kind: ForceKind, handle: Handle);

    /// Destroy every primitive of one kind
    fn remove_all(&mut self, kind: ForceKind);

    /// Destroy every primitive of every kind
    fn reset_forces(&mut self) {
        for kind in ForceKind::ALL {
            self.remove_all(kind);
        }
    }
}

impl<D: DeviceBoundary + ?Sized> DeviceBoundary for Box<D> {
    fn initialize(&mut self) -> bool {
        (**self).initialize()
    }

    fn clean_up(&mut self) {
        (**self).clean_up()
    }

    fn set_workspace(&mut self, workspace: Workspace) {
        (**self).set_workspace(workspace)
    }

    fn position(&mut self) -> DVec3 {
        (**self).position()
    }

    fn rendered_force(&mut self) -> DVec3 {
        (**self).rendered_force()
    }

    fn button(&mut self, index: usize) -> bool {
        (**self).button(index)
    }

    fn set_force_feedback_enabled(&mut self, enabled: bool) {
        (**self).set_force_feedback_enabled(enabled)
    }

    fn set_proxy_position(&mut self, position: DVec3) {
        (**self).set_proxy_position(position)
    }

    fn set_force(&mut self, force: DVec3) {
        (**self).set_force(force)
    }

    fn add(&mut self, primitive: &ForcePrimitive) -> Handle {
        (**self).add(primitive)
    }

    fn update(&mut self, handle: Handle, primitive: &ForcePrimitive) {
        (**self).update(handle, primitive)
    }

    fn remove(&mut self, kind: ForceKind, handle: Handle) {
        (**self).remove(kind, handle)
    }

    fn remove_all(&mut self, kind: ForceKind) {
        (**self).remove_all(kind)
    }

    fn reset_forces(&mut self) {
        (**self).reset_forces()
    }
}
