//! Native vendor plugin, bound at runtime
//!
//! The plugin exports a flat C API around a single global device. Its
//! primitive ids are per kind and get recycled after removal, so this module
//! hands out its own handles and keeps the mapping to native ids.
//!
//! Plugin builds differ in how the host force gets in. Older builds export
//! `SetForce`; current ones do not, and the host force is carried by a simple
//! force primitive this device creates once and updates every tick.

use crate::boundary::DeviceBoundary;
use crate::error::{DeviceError, DeviceResult};
use crate::primitive::{ForceKind, ForcePrimitive, Handle};
use crate::vector::Vector3;
use crate::workspace::Workspace;
use glam::DVec3;
use libloading::{Library, Symbol};
use std::collections::HashMap;
use std::ffi::{c_int, OsStr};
use std::path::{Path, PathBuf};

/// Plugin base name; the platform prefix/suffix is added on load
pub const PLUGIN_NAME: &str = "FalconUnityPlugin";

type InitializeFn = unsafe extern "C" fn() -> bool;
type VoidFn = unsafe extern "C" fn();
type SetWorkspaceFn = unsafe extern "C" fn(Vector3, Vector3);
type GetVectorFn = unsafe extern "C" fn() -> Vector3;
type GetButtonFn = unsafe extern "C" fn(c_int) -> bool;
type SetBoolFn = unsafe extern "C" fn(bool);
type SetVectorFn = unsafe extern "C" fn(Vector3);
type RemoveFn = unsafe extern "C" fn(c_int);

type AddSimpleForceFn = unsafe extern "C" fn(Vector3) -> c_int;
type UpdateSimpleForceFn = unsafe extern "C" fn(c_int, Vector3);
type AddViscosityFn = unsafe extern "C" fn(f32, f32) -> c_int;
type UpdateViscosityFn = unsafe extern "C" fn(c_int, f32, f32);
type AddSurfaceFn = unsafe extern "C" fn(Vector3, Vector3, f32, f32) -> c_int;
type UpdateSurfaceFn = unsafe extern "C" fn(c_int, Vector3, Vector3, f32, f32);
// Springs and intermolecular forces share a signature
type AddAnchoredFn = unsafe extern "C" fn(Vector3, f32, f32, f32, f32) -> c_int;
type UpdateAnchoredFn = unsafe extern "C" fn(c_int, Vector3, f32, f32, f32, f32);
type AddRandomForceFn = unsafe extern "C" fn(f32, f32, f32, f32) -> c_int;
type UpdateRandomForceFn = unsafe extern "C" fn(c_int, f32, f32, f32, f32);

/// Removal entry points for one kind
#[derive(Clone, Copy)]
struct KindRemoval {
    remove: RemoveFn,
    remove_all: VoidFn,
}

/// Resolved plugin entry points
struct PluginApi {
    initialize: InitializeFn,
    clean_up: VoidFn,
    set_graphics_workspace: SetWorkspaceFn,
    get_position: GetVectorFn,
    get_force: GetVectorFn,
    get_button: GetButtonFn,
    use_force_feedback: SetBoolFn,
    set_proxy_position: SetVectorFn,
    // Not exported by every plugin build
    set_force: Option<SetVectorFn>,
    reset_forces: Option<VoidFn>,

    add_simple_force: AddSimpleForceFn,
    update_simple_force: UpdateSimpleForceFn,
    add_viscosity: AddViscosityFn,
    update_viscosity: UpdateViscosityFn,
    add_surface: AddSurfaceFn,
    update_surface: UpdateSurfaceFn,
    add_spring: AddAnchoredFn,
    update_spring: UpdateAnchoredFn,
    add_intermolecular_force: AddAnchoredFn,
    update_intermolecular_force: UpdateAnchoredFn,
    add_random_force: AddRandomForceFn,
    update_random_force: UpdateRandomForceFn,

    // Indexed by ForceKind::index()
    removal: [KindRemoval; 6],
}

/// Copy a function pointer out of the library
///
/// # Safety
/// `T` must match the exported symbol's real signature.
unsafe fn resolve<T: Copy>(library: &Library, name: &'static str) -> DeviceResult<T> {
    let symbol: Symbol<T> = library
        .get(name.as_bytes())
        .map_err(|source| DeviceError::MissingSymbol { name, source })?;
    Ok(*symbol)
}

/// Like [`resolve`], for entry points some plugin builds leave out
///
/// # Safety
/// `T` must match the exported symbol's real signature.
unsafe fn resolve_optional<T: Copy>(library: &Library, name: &'static str) -> Option<T> {
    match library.get::<T>(name.as_bytes()) {
        Ok(symbol) => Some(*symbol),
        Err(err) => {
            log::debug!("device plugin has no `{name}`: {err}");
            None
        }
    }
}

impl PluginApi {
    /// # Safety
    /// The library must export the plugin ABI with the signatures above.
    unsafe fn resolve(library: &Library) -> DeviceResult<Self> {
        let removal = |remove: &'static str, remove_all: &'static str| -> DeviceResult<KindRemoval> {
            unsafe {
                Ok(KindRemoval {
                    remove: resolve(library, remove)?,
                    remove_all: resolve(library, remove_all)?,
                })
            }
        };

        Ok(Self {
            initialize: resolve(library, "Initialize")?,
            clean_up: resolve(library, "CleanUp")?,
            set_graphics_workspace: resolve(library, "SetGraphicsWorkspace")?,
            get_position: resolve(library, "GetPosition")?,
            get_force: resolve(library, "GetForce")?,
            get_button: resolve(library, "GetButton")?,
            use_force_feedback: resolve(library, "UseForceFeedback")?,
            set_proxy_position: resolve(library, "SetProxyPosition")?,
            set_force: resolve_optional(library, "SetForce"),
            reset_forces: resolve_optional(library, "ResetForces"),

            add_simple_force: resolve(library, "AddSimpleForce")?,
            update_simple_force: resolve(library, "UpdateSimpleForce")?,
            add_viscosity: resolve(library, "AddViscosity")?,
            update_viscosity: resolve(library, "UpdateViscosity")?,
            add_surface: resolve(library, "AddSurface")?,
            update_surface: resolve(library, "UpdateSurface")?,
            add_spring: resolve(library, "AddSpring")?,
            update_spring: resolve(library, "UpdateSpring")?,
            add_intermolecular_force: resolve(library, "AddIntermolecularForce")?,
            update_intermolecular_force: resolve(library, "UpdateIntermolecularForce")?,
            add_random_force: resolve(library, "AddRandomForce")?,
            update_random_force: resolve(library, "UpdateRandomForce")?,

            removal: [
                removal("RemoveSimpleForce", "RemoveSimpleForces")?,
                removal("RemoveViscosity", "RemoveViscosities")?,
                removal("RemoveSurface", "RemoveSurfaces")?,
                removal("RemoveSpring", "RemoveSprings")?,
                removal("RemoveIntermolecularForce", "RemoveIntermolecularForces")?,
                removal("RemoveRandomForce", "RemoveRandomForces")?,
            ],
        })
    }
}

/// Never-reused handles over the plugin's recycled per-kind ids
#[derive(Debug, Default)]
struct HandleTable {
    entries: HashMap<Handle, (ForceKind, c_int)>,
    next: u32,
}

impl HandleTable {
    /// Track a new native id. Refused creations (negative ids) still get a
    /// handle so the caller's bookkeeping stays uniform.
    fn insert(&mut self, kind: ForceKind, native_id: c_int) -> Handle {
        let handle = Handle::new(self.next);
        self.next += 1;
        self.entries.insert(handle, (kind, native_id));
        handle
    }

    /// Native id to address for a live handle of `kind`, if any
    fn native_id(&self, kind: ForceKind, handle: Handle) -> Option<c_int> {
        match self.entries.get(&handle) {
            Some(&(tracked, id)) if tracked == kind && id >= 0 => Some(id),
            _ => None,
        }
    }

    /// Forget `handle`, returning the native id that still needs removing
    fn remove(&mut self, kind: ForceKind, handle: Handle) -> Option<c_int> {
        let id = self.native_id(kind, handle);
        if self.entries.get(&handle).is_some_and(|&(tracked, _)| tracked == kind) {
            self.entries.remove(&handle);
        }
        id
    }

    fn remove_kind(&mut self, kind: ForceKind) {
        self.entries.retain(|_, (tracked, _)| *tracked != kind);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Device backed by the vendor plugin library
pub struct NativeDevice {
    api: PluginApi,
    handles: HandleTable,
    // Simple force carrying the host force, when the plugin has no SetForce
    host_force: Option<c_int>,
    // Keeps the entry points above alive; dropped last
    _library: Option<Library>,
}

impl NativeDevice {
    /// Platform file name of the plugin, e.g. `libFalconUnityPlugin.so`
    pub fn default_path() -> PathBuf {
        PathBuf::from(libloading::library_filename(OsStr::new(PLUGIN_NAME)))
    }

    pub fn load(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let path = path.as_ref();
        log::info!("Loading device plugin from {}", path.display());

        // Safety: loading runs the plugin's static initializers, which only
        // set its global device pointer to null.
        let library = unsafe { Library::new(path) }.map_err(|source| DeviceError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // Safety: the symbol table is the plugin ABI this module targets.
        let api = unsafe { PluginApi::resolve(&library)? };
        if api.set_force.is_none() {
            log::info!("Plugin has no SetForce; host force goes through a simple force");
        }

        Ok(Self::with_api(api, Some(library)))
    }

    fn with_api(api: PluginApi, library: Option<Library>) -> Self {
        Self {
            api,
            handles: HandleTable::default(),
            host_force: None,
            _library: library,
        }
    }

    /// Forget the host-force primitive after the plugin dropped it
    fn forget_host_force(&mut self) {
        self.host_force = None;
    }
}

fn narrow(v: f64) -> f32 {
    v as f32
}

impl DeviceBoundary for NativeDevice {
    fn initialize(&mut self) -> bool {
        unsafe { (self.api.initialize)() }
    }

    fn clean_up(&mut self) {
        self.handles.clear();
        self.forget_host_force();
        unsafe { (self.api.clean_up)() }
    }

    fn set_workspace(&mut self, workspace: Workspace) {
        unsafe {
            (self.api.set_graphics_workspace)(workspace.center.into(), workspace.size.into())
        }
    }

    fn position(&mut self) -> DVec3 {
        unsafe { (self.api.get_position)() }.into()
    }

    fn rendered_force(&mut self) -> DVec3 {
        unsafe { (self.api.get_force)() }.into()
    }

    fn button(&mut self, index: usize) -> bool {
        match c_int::try_from(index) {
            Ok(index) => unsafe { (self.api.get_button)(index) },
            Err(_) => false,
        }
    }

    fn set_force_feedback_enabled(&mut self, enabled: bool) {
        unsafe { (self.api.use_force_feedback)(enabled) }
    }

    fn set_proxy_position(&mut self, position: DVec3) {
        unsafe { (self.api.set_proxy_position)(position.into()) }
    }

    fn set_force(&mut self, force: DVec3) {
        let force = Vector3::from(force);

        if let Some(set_force) = self.api.set_force {
            unsafe { set_force(force) };
            return;
        }

        match self.host_force {
            Some(id) => unsafe { (self.api.update_simple_force)(id, force) },
            None => {
                let id = unsafe { (self.api.add_simple_force)(force) };
                if id >= 0 {
                    self.host_force = Some(id);
                } else {
                    log::debug!("device plugin refused the host force");
                }
            }
        }
    }

    fn add(&mut self, primitive: &ForcePrimitive) -> Handle {
        let api = &self.api;
        let native_id = unsafe {
            match *primitive {
                ForcePrimitive::SimpleForce(p) => (api.add_simple_force)(p.force.into()),
                ForcePrimitive::Viscosity(p) => {
                    (api.add_viscosity)(narrow(p.damping), narrow(p.weight))
                }
                ForcePrimitive::Surface(p) => (api.add_surface)(
                    p.point.unwrap_or_default().into(),
                    p.normal.into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                ),
                ForcePrimitive::Spring(p) => (api.add_spring)(
                    p.anchor.unwrap_or_default().into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                    narrow(p.rest_length),
                    narrow(p.max_length.unwrap_or(-1.0)),
                ),
                ForcePrimitive::IntermolecularForce(p) => (api.add_intermolecular_force)(
                    p.anchor.unwrap_or_default().into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                    narrow(p.bond_length),
                    narrow(p.max_length),
                ),
                ForcePrimitive::RandomForce(p) => (api.add_random_force)(
                    narrow(p.min_magnitude),
                    narrow(p.max_magnitude),
                    narrow(p.min_interval),
                    narrow(p.max_interval),
                ),
            }
        };

        let kind = primitive.kind();
        if native_id < 0 {
            log::warn!("device plugin refused to create a {kind}");
        }
        self.handles.insert(kind, native_id)
    }

    fn update(&mut self, handle: Handle, primitive: &ForcePrimitive) {
        let Some(id) = self.handles.native_id(primitive.kind(), handle) else {
            log::debug!("no live {} for {handle}", primitive.kind());
            return;
        };

        let api = &self.api;
        unsafe {
            match *primitive {
                ForcePrimitive::SimpleForce(p) => (api.update_simple_force)(id, p.force.into()),
                ForcePrimitive::Viscosity(p) => {
                    (api.update_viscosity)(id, narrow(p.damping), narrow(p.weight))
                }
                ForcePrimitive::Surface(p) => (api.update_surface)(
                    id,
                    p.point.unwrap_or_default().into(),
                    p.normal.into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                ),
                ForcePrimitive::Spring(p) => (api.update_spring)(
                    id,
                    p.anchor.unwrap_or_default().into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                    narrow(p.rest_length),
                    narrow(p.max_length.unwrap_or(-1.0)),
                ),
                ForcePrimitive::IntermolecularForce(p) => (api.update_intermolecular_force)(
                    id,
                    p.anchor.unwrap_or_default().into(),
                    narrow(p.stiffness),
                    narrow(p.damping),
                    narrow(p.bond_length),
                    narrow(p.max_length),
                ),
                ForcePrimitive::RandomForce(p) => (api.update_random_force)(
                    id,
                    narrow(p.min_magnitude),
                    narrow(p.max_magnitude),
                    narrow(p.min_interval),
                    narrow(p.max_interval),
                ),
            }
        }
    }

    fn remove(&mut self, kind: ForceKind, handle: Handle) {
        if let Some(id) = self.handles.remove(kind, handle) {
            unsafe { (self.api.removal[kind.index()].remove)(id) }
        }
    }

    fn remove_all(&mut self, kind: ForceKind) {
        self.handles.remove_kind(kind);
        if kind == ForceKind::SimpleForce {
            self.forget_host_force();
        }
        unsafe { (self.api.removal[kind.index()].remove_all)() }
    }

    fn reset_forces(&mut self) {
        let Some(reset_forces) = self.api.reset_forces else {
            for kind in ForceKind::ALL {
                self.remove_all(kind);
            }
            return;
        };

        self.handles.clear();
        self.forget_host_force();
        unsafe { reset_forces() }
    }
}
