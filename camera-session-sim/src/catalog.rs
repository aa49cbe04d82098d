//! Canned device sets.

use std::sync::Arc;

use camera_session_core::models::camera_models::{DevicePosition, DeviceType, FrameRateRange};

use crate::sim_device::SimCamera;

/// Back ultra-wide, back wide-angle and front cameras, in that order.
pub fn phone() -> Vec<Arc<SimCamera>> {
    vec![
        SimCamera::new(
            "back-ultra-wide",
            "Back Ultra Wide Camera",
            DeviceType::UltraWide,
            DevicePosition::Back,
            vec![FrameRateRange::new(1.0, 30.0), FrameRateRange::new(1.0, 60.0)],
        ),
        SimCamera::new(
            "back-wide",
            "Back Camera",
            DeviceType::WideAngle,
            DevicePosition::Back,
            vec![FrameRateRange::new(1.0, 30.0), FrameRateRange::new(1.0, 60.0)],
        ),
        SimCamera::new(
            "front-wide",
            "Front Camera",
            DeviceType::WideAngle,
            DevicePosition::Front,
            vec![FrameRateRange::new(1.0, 30.0)],
        ),
    ]
}

/// A single external webcam with no position.
pub fn webcam() -> Vec<Arc<SimCamera>> {
    vec![SimCamera::new(
        "usb-webcam",
        "USB Webcam",
        DeviceType::External,
        DevicePosition::Unspecified,
        vec![FrameRateRange::new(5.0, 30.0)],
    )]
}
