use crate::models::camera_models::{PreviewId, Rect};
use crate::models::orientation::{CaptureOrientation, DeviceOrientation};

/// The UI view that hosts the camera preview.
pub trait HostSurface: Send + Sync {
    /// Stable identity of the host view.
    fn surface_id(&self) -> u64;

    fn bounds(&self) -> Rect;

    fn device_orientation(&self) -> DeviceOrientation;
}

/// Session-side end of a preview surface.
///
/// Preview surfaces keep only a weak reference to their link, so a surface
/// never keeps the session alive.
pub trait PreviewLink: Send + Sync {
    fn attach(&self, id: PreviewId, orientation: CaptureOrientation);

    fn detach(&self, id: PreviewId);

    /// `None` when `id` is not attached to the session.
    fn connection_enabled(&self, id: PreviewId) -> Option<bool>;
}
