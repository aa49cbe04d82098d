use std::fmt;
use std::sync::Arc;

use crate::models::camera_models::{
    DevicePosition, DeviceType, PreviewId, SessionPreset, VideoOutputSettings,
};
use crate::models::error::CameraError;
use crate::models::orientation::CaptureOrientation;

use super::capture_device::{CaptureDevice, FrameCallback};

/// A device bound to the capture graph. Replaced wholesale on reset.
#[derive(Clone)]
pub struct DeviceInput {
    id: u64,
    device: Arc<dyn CaptureDevice>,
}

impl DeviceInput {
    pub fn new(id: u64, device: Arc<dyn CaptureDevice>) -> Self {
        Self { id, device }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn device(&self) -> &Arc<dyn CaptureDevice> {
        &self.device
    }
}

impl fmt::Debug for DeviceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceInput")
            .field("id", &self.id)
            .field("device", &self.device.descriptor().unique_id)
            .finish()
    }
}

/// The video data output: fixed settings plus the frame-arrival callback.
#[derive(Clone)]
pub struct VideoOutput {
    pub settings: VideoOutputSettings,
    pub on_frame: FrameCallback,
}

/// The platform capture graph.
///
/// Inputs and outputs may only be added or removed between
/// [`begin_configuration`](Self::begin_configuration) and
/// [`commit_configuration`](Self::commit_configuration). All methods are
/// called from the session queue.
pub trait CaptureSession: Send {
    /// Every camera the platform currently exposes.
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>>;

    /// The platform's default device for a type and position.
    fn default_device(
        &self,
        device_type: DeviceType,
        position: DevicePosition,
    ) -> Option<Arc<dyn CaptureDevice>> {
        self.devices().into_iter().find(|d| {
            let desc = d.descriptor();
            desc.device_type == device_type && desc.position == position
        })
    }

    fn begin_configuration(&mut self);

    fn commit_configuration(&mut self);

    /// True while a configuration bracket is open.
    fn is_configuring(&self) -> bool;

    fn set_preset(&mut self, preset: SessionPreset);

    /// Construct an input for `device`. Fails with
    /// [`CameraError::CreateCaptureInput`] when the platform refuses.
    fn make_input(&self, device: Arc<dyn CaptureDevice>) -> Result<DeviceInput, CameraError>;

    fn can_add_input(&self, input: &DeviceInput) -> bool;

    fn add_input(&mut self, input: DeviceInput);

    fn remove_input(&mut self, input_id: u64);

    fn inputs(&self) -> Vec<DeviceInput>;

    fn can_add_output(&self, settings: &VideoOutputSettings) -> bool;

    /// Attach the output and return its id.
    fn add_output(&mut self, output: VideoOutput) -> u64;

    fn remove_output(&mut self, output_id: u64);

    fn output_ids(&self) -> Vec<u64>;

    fn start_running(&mut self);

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Connect a preview surface. Does not touch the capture graph.
    fn attach_preview(&mut self, id: PreviewId, orientation: CaptureOrientation);

    fn detach_preview(&mut self, id: PreviewId);

    /// `None` when `id` is not attached.
    fn preview_connection_enabled(&self, id: PreviewId) -> Option<bool>;
}
