//! Simulated camera device.
//!
//! Every hardware condition the health monitor checks can be flipped from a
//! test or the demo: disconnection, loss of video, and lock contention by
//! another process.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use camera_session_core::models::camera_models::{
    DeviceDescriptor, DevicePosition, DeviceType, FrameRateRange,
};
use camera_session_core::models::error::CameraError;
use camera_session_core::traits::capture_device::CaptureDevice;

pub struct SimCamera {
    descriptor: DeviceDescriptor,
    ranges: Vec<FrameRateRange>,
    connected: AtomicBool,
    has_video: AtomicBool,
    contended: AtomicBool,
    locked: AtomicBool,
    lock_attempts: AtomicU32,
    active_range: Mutex<Option<FrameRateRange>>,
}

impl SimCamera {
    pub fn new(
        unique_id: &str,
        name: &str,
        device_type: DeviceType,
        position: DevicePosition,
        ranges: Vec<FrameRateRange>,
    ) -> Arc<Self> {
        Arc::new(Self {
            descriptor: DeviceDescriptor {
                unique_id: unique_id.into(),
                name: name.into(),
                device_type,
                position,
            },
            ranges,
            connected: AtomicBool::new(true),
            has_video: AtomicBool::new(true),
            contended: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            lock_attempts: AtomicU32::new(0),
            active_range: Mutex::new(None),
        })
    }

    pub fn set_connected(&self, connected: bool) {
        log::info!("{}: connected = {}", self.descriptor.name, connected);
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_has_video(&self, has_video: bool) {
        self.has_video.store(has_video, Ordering::SeqCst);
    }

    /// Simulate another process holding the device's configuration lock.
    pub fn set_contended(&self, contended: bool) {
        log::info!("{}: contended = {}", self.descriptor.name, contended);
        self.contended.store(contended, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn lock_attempts(&self) -> u32 {
        self.lock_attempts.load(Ordering::SeqCst)
    }

    pub fn active_frame_rate(&self) -> Option<FrameRateRange> {
        *self.active_range.lock()
    }
}

impl CaptureDevice for SimCamera {
    fn descriptor(&self) -> DeviceDescriptor {
        self.descriptor.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn has_video(&self) -> bool {
        self.has_video.load(Ordering::SeqCst)
    }

    fn frame_rate_ranges(&self) -> Vec<FrameRateRange> {
        self.ranges.clone()
    }

    fn lock_for_configuration(&self) -> Result<(), CameraError> {
        self.lock_attempts.fetch_add(1, Ordering::SeqCst);
        if self.contended.load(Ordering::SeqCst) || !self.is_connected() {
            return Err(CameraError::DeviceLocked);
        }
        if self.locked.swap(true, Ordering::SeqCst) {
            return Err(CameraError::DeviceLocked);
        }
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    fn set_active_frame_rate(&self, range: FrameRateRange) -> Result<(), CameraError> {
        if !self.is_locked() {
            return Err(CameraError::Internal(format!(
                "{} must be locked before changing its frame rate",
                self.descriptor.name
            )));
        }
        let supported = self
            .ranges
            .iter()
            .any(|r| r.min_fps <= range.min_fps && range.max_fps <= r.max_fps);
        if !supported {
            return Err(CameraError::Internal(format!(
                "{:.0}-{:.0} fps is not supported by {}",
                range.min_fps, range.max_fps, self.descriptor.name
            )));
        }
        *self.active_range.lock() = Some(range);
        Ok(())
    }
}
