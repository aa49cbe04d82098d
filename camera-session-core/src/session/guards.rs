use std::ops::{Deref, DerefMut};

use crate::models::error::CameraError;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::capture_session::CaptureSession;

/// An open begin/commit configuration bracket.
///
/// Graph mutation goes through the guard; the bracket is committed when the
/// guard drops, on every exit path.
pub struct ConfigurationBracket<'a, S: CaptureSession + ?Sized> {
    session: &'a mut S,
}

impl<'a, S: CaptureSession + ?Sized> ConfigurationBracket<'a, S> {
    pub fn open(session: &'a mut S) -> Self {
        session.begin_configuration();
        Self { session }
    }
}

impl<S: CaptureSession + ?Sized> Deref for ConfigurationBracket<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: CaptureSession + ?Sized> DerefMut for ConfigurationBracket<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
    }
}

impl<S: CaptureSession + ?Sized> Drop for ConfigurationBracket<'_, S> {
    fn drop(&mut self) {
        self.session.commit_configuration();
    }
}

/// Exclusive configuration lock on a device, released on drop.
pub struct DeviceLock<'a> {
    device: &'a dyn CaptureDevice,
}

impl<'a> DeviceLock<'a> {
    pub fn acquire(device: &'a dyn CaptureDevice) -> Result<Self, CameraError> {
        device.lock_for_configuration()?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &dyn CaptureDevice {
        self.device
    }
}

impl Drop for DeviceLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
    }
}
