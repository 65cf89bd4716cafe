//! Device session lifetime
//!
//! A session owns the one boundary instance. It is opened once, hands the
//! boundary out only while the device is live, and releases it exactly once,
//! on explicit teardown or on drop, whichever comes first.

use haptic_device::DeviceBoundary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Device initialized; boundary calls go through
    Active,
    /// Device failed to initialize; reads are neutral and writes are dropped
    Unavailable,
    /// Torn down; no further boundary calls
    Closed,
}

pub struct DeviceSession<D: DeviceBoundary> {
    device: D,
    status: SessionStatus,
}

impl<D: DeviceBoundary> DeviceSession<D> {
    /// Acquire the device. Failure to initialize is logged and leaves the
    /// session inert rather than erroring.
    pub fn open(mut device: D) -> Self {
        let status = if device.initialize() {
            log::info!("✓ Haptic device initialized");
            SessionStatus::Active
        } else {
            log::warn!("Haptic device failed to initialize; running without device input or force output");
            SessionStatus::Unavailable
        };

        Self { device, status }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// The boundary, if calls to it are currently allowed
    pub fn boundary(&mut self) -> Option<&mut D> {
        match self.status {
            SessionStatus::Active => Some(&mut self.device),
            SessionStatus::Unavailable | SessionStatus::Closed => None,
        }
    }

    /// Read-only view of the device, for inspection
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Release the device. Only a session that actually initialized the
    /// device calls `clean_up`; repeated teardown does nothing.
    pub fn teardown(&mut self) {
        match self.status {
            SessionStatus::Active => {
                self.device.clean_up();
                log::info!("Haptic device released");
            }
            SessionStatus::Unavailable => {
                log::debug!("Closing session that never reached the device");
            }
            SessionStatus::Closed => return,
        }
        self.status = SessionStatus::Closed;
    }
}

impl<D: DeviceBoundary> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
