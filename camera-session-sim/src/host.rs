//! Simulated preview host view.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use camera_session_core::models::camera_models::Rect;
use camera_session_core::models::orientation::DeviceOrientation;
use camera_session_core::traits::host_surface::HostSurface;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

pub struct SimHostSurface {
    id: u64,
    bounds: Mutex<Rect>,
    orientation: Mutex<DeviceOrientation>,
}

impl SimHostSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            bounds: Mutex::new(Rect::new(0.0, 0.0, width, height)),
            orientation: Mutex::new(DeviceOrientation::Portrait),
        }
    }

    /// Rotate the device; the view swaps its width and height when the
    /// rotation crosses between portrait and landscape.
    pub fn rotate(&self, orientation: DeviceOrientation) {
        let mut current = self.orientation.lock();
        if is_landscape(*current) != is_landscape(orientation) {
            let mut bounds = self.bounds.lock();
            *bounds = Rect::new(bounds.x, bounds.y, bounds.height, bounds.width);
        }
        *current = orientation;
    }
}

fn is_landscape(orientation: DeviceOrientation) -> bool {
    matches!(
        orientation,
        DeviceOrientation::LandscapeLeft | DeviceOrientation::LandscapeRight
    )
}

impl HostSurface for SimHostSurface {
    fn surface_id(&self) -> u64 {
        self.id
    }

    fn bounds(&self) -> Rect {
        *self.bounds.lock()
    }

    fn device_orientation(&self) -> DeviceOrientation {
        *self.orientation.lock()
    }
}
