use std::sync::Arc;

use log::{debug, info, warn};

use crate::models::camera_models::{
    DevicePosition, DeviceType, FrameRateRange, SessionPreset, VideoOutputSettings,
};
use crate::models::config::SessionConfiguration;
use crate::models::error::CameraError;
use crate::session::generation::Generation;
use crate::session::guards::{ConfigurationBracket, DeviceLock};
use crate::traits::capture_device::{CaptureDevice, FrameCallback};
use crate::traits::capture_session::{CaptureSession, VideoOutput};

/// Builds the capture graph once per generation.
///
/// ```text
/// [select device] → [tune frame rate (best effort)] → [add input] → [add output + frame callback]
/// ```
#[derive(Debug, Clone)]
pub struct Configurator {
    preset: SessionPreset,
    output: VideoOutputSettings,
    preference: Vec<(DeviceType, DevicePosition)>,
}

impl Configurator {
    pub fn new(config: &SessionConfiguration) -> Self {
        Self {
            preset: config.preset,
            output: config.output_settings(),
            preference: config.device_preference.clone(),
        }
    }

    /// Configure the graph for `generation`. Returns immediately when the
    /// generation is already configured.
    pub fn configure<S: CaptureSession + ?Sized>(
        &self,
        session: &mut S,
        generation: &mut Generation,
        on_frame: FrameCallback,
    ) -> Result<(), CameraError> {
        if generation.configured {
            debug!("generation {} already configured", generation.number);
            return Ok(());
        }

        let mut graph = ConfigurationBracket::open(session);
        // Leftovers from an abandoned attempt are replaced wholesale.
        Self::remove_all(&mut *graph);

        let result = self.build(&mut *graph, on_frame);
        if result.is_err() {
            Self::remove_all(&mut *graph);
        }
        drop(graph);

        result?;
        generation.configured = true;
        info!("capture graph configured for generation {}", generation.number);
        Ok(())
    }

    /// Remove every input and output inside a single bracket.
    pub fn teardown<S: CaptureSession + ?Sized>(session: &mut S) {
        let mut graph = ConfigurationBracket::open(session);
        Self::remove_all(&mut *graph);
    }

    /// Preferred device: each `(type, position)` in order, then any device.
    pub fn select_device<S: CaptureSession + ?Sized>(
        &self,
        session: &S,
    ) -> Result<Arc<dyn CaptureDevice>, CameraError> {
        self.preference
            .iter()
            .find_map(|(device_type, position)| session.default_device(*device_type, *position))
            .or_else(|| session.devices().into_iter().next())
            .ok_or(CameraError::CameraUnavailable)
    }

    fn build<S: CaptureSession + ?Sized>(
        &self,
        session: &mut S,
        on_frame: FrameCallback,
    ) -> Result<(), CameraError> {
        session.set_preset(self.preset);

        let device = self.select_device(session)?;
        let descriptor = device.descriptor();
        debug!("selected camera {} ({:?})", descriptor.name, descriptor.device_type);

        if let Err(e) = Self::tune_frame_rate(device.as_ref()) {
            warn!("keeping default frame rate for {}: {}", descriptor.name, e);
        }

        let input = session.make_input(device)?;
        if !session.can_add_input(&input) {
            return Err(CameraError::CannotAddInput);
        }
        session.add_input(input);

        if !session.can_add_output(&self.output) {
            return Err(CameraError::CannotAddOutput);
        }
        session.add_output(VideoOutput {
            settings: self.output,
            on_frame,
        });
        Ok(())
    }

    /// Switch the device to its fastest frame-rate range. The device lock is
    /// held only for this step.
    fn tune_frame_rate(device: &dyn CaptureDevice) -> Result<FrameRateRange, CameraError> {
        let best = FrameRateRange::highest(&device.frame_rate_ranges())
            .ok_or_else(|| CameraError::Internal("device reports no frame-rate ranges".into()))?;
        let lock = DeviceLock::acquire(device)?;
        lock.device().set_active_frame_rate(best)?;
        debug!("frame rate set to {:.0} fps", best.max_fps);
        Ok(best)
    }

    fn remove_all<S: CaptureSession + ?Sized>(session: &mut S) {
        for input in session.inputs() {
            session.remove_input(input.id());
        }
        for output in session.output_ids() {
            session.remove_output(output);
        }
    }
}
