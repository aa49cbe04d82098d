//! Simulated capture graph.
//!
//! `SimSession` is a cheap cloneable handle: one clone goes into the
//! `CameraService`, others stay with the test or demo to inject faults and
//! read counters while the service runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::Mutex;

use camera_session_core::models::camera_models::{PreviewId, SessionPreset, VideoOutputSettings};
use camera_session_core::models::error::CameraError;
use camera_session_core::models::orientation::CaptureOrientation;
use camera_session_core::traits::capture_device::CaptureDevice;
use camera_session_core::traits::capture_session::{CaptureSession, DeviceInput, VideoOutput};

use crate::catalog;
use crate::frame_pump::{FramePump, SharedOutputs};
use crate::sim_device::SimCamera;

/// Injected failures. All default to off.
#[derive(Debug, Clone, Default)]
pub struct SimFaults {
    /// `start_running` returns without the session running.
    pub start_fails: bool,
    pub reject_input: bool,
    pub reject_output: bool,
    /// Input construction fails with this cause.
    pub input_error: Option<String>,
}

/// Calls observed by the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimCounters {
    pub begin_calls: u32,
    pub commit_calls: u32,
    pub start_calls: u32,
    pub stop_calls: u32,
    /// Start requests issued while a configuration bracket was open.
    pub starts_during_bracket: u32,
    /// Input or output changes made outside a configuration bracket.
    pub mutations_outside_bracket: u32,
    pub inputs_added: u32,
    pub outputs_added: u32,
    /// Highest number of simultaneously attached inputs.
    pub max_input_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct PreviewConnection {
    orientation: CaptureOrientation,
    enabled: bool,
}

struct SimGraph {
    devices: Vec<Arc<SimCamera>>,
    inputs: Vec<DeviceInput>,
    outputs: SharedOutputs,
    preset: Option<SessionPreset>,
    previews: HashMap<PreviewId, PreviewConnection>,
    bracket_depth: u32,
    running: bool,
    pump: Option<FramePump>,
    next_id: u64,
    faults: SimFaults,
    counters: SimCounters,
}

impl SimGraph {
    fn check_bracket(&mut self, operation: &str) {
        if self.bracket_depth == 0 {
            error!("{} outside a configuration bracket", operation);
            self.counters.mutations_outside_bracket += 1;
        }
    }

    fn take_pump(&mut self) -> Option<FramePump> {
        self.running = false;
        self.pump.take()
    }
}

#[derive(Clone)]
pub struct SimSession {
    graph: Arc<Mutex<SimGraph>>,
    frozen: Arc<AtomicBool>,
    fps: f64,
    resolution: (u32, u32),
}

impl SimSession {
    pub fn new(devices: Vec<Arc<SimCamera>>) -> Self {
        Self {
            graph: Arc::new(Mutex::new(SimGraph {
                devices,
                inputs: Vec::new(),
                outputs: Arc::new(Mutex::new(Vec::new())),
                preset: None,
                previews: HashMap::new(),
                bracket_depth: 0,
                running: false,
                pump: None,
                next_id: 1,
                faults: SimFaults::default(),
                counters: SimCounters::default(),
            })),
            frozen: Arc::new(AtomicBool::new(false)),
            fps: 30.0,
            resolution: (1920, 1080),
        }
    }

    pub fn phone() -> Self {
        Self::new(catalog::phone())
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn camera(&self, unique_id: &str) -> Option<Arc<SimCamera>> {
        self.graph
            .lock()
            .devices
            .iter()
            .find(|d| d.descriptor().unique_id == unique_id)
            .cloned()
    }

    /// The device behind the active input.
    pub fn active_camera(&self) -> Option<Arc<SimCamera>> {
        let unique_id = {
            let graph = self.graph.lock();
            graph.inputs.first()?.device().descriptor().unique_id
        };
        self.camera(&unique_id)
    }

    pub fn update_faults(&self, update: impl FnOnce(&mut SimFaults)) {
        update(&mut self.graph.lock().faults);
    }

    /// Keep the session running but stop delivering frames.
    pub fn freeze_frames(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::SeqCst);
    }

    /// Open a configuration bracket from outside the service, as another
    /// component reconfiguring the shared session would.
    pub fn hold_configuration(&self) {
        let mut graph = self.graph.lock();
        graph.bracket_depth += 1;
        graph.counters.begin_calls += 1;
    }

    pub fn release_configuration(&self) {
        let mut graph = self.graph.lock();
        graph.bracket_depth = graph.bracket_depth.saturating_sub(1);
        graph.counters.commit_calls += 1;
    }

    /// The OS took the camera away; the platform stops the session itself.
    pub fn simulate_interruption(&self) {
        let pump = self.graph.lock().take_pump();
        drop(pump);
        warn!("simulated capture interruption");
    }

    pub fn set_preview_enabled(&self, id: PreviewId, enabled: bool) {
        if let Some(connection) = self.graph.lock().previews.get_mut(&id) {
            connection.enabled = enabled;
        }
    }

    pub fn preview_orientation(&self, id: PreviewId) -> Option<CaptureOrientation> {
        self.graph.lock().previews.get(&id).map(|c| c.orientation)
    }

    pub fn counters(&self) -> SimCounters {
        self.graph.lock().counters
    }

    pub fn input_count(&self) -> usize {
        self.graph.lock().inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.graph.lock().outputs.lock().len()
    }

    pub fn preset(&self) -> Option<SessionPreset> {
        self.graph.lock().preset
    }
}

impl CaptureSession for SimSession {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>> {
        self.graph
            .lock()
            .devices
            .iter()
            .filter(|d| d.is_connected())
            .map(|d| Arc::clone(d) as Arc<dyn CaptureDevice>)
            .collect()
    }

    fn begin_configuration(&mut self) {
        let mut graph = self.graph.lock();
        graph.bracket_depth += 1;
        graph.counters.begin_calls += 1;
    }

    fn commit_configuration(&mut self) {
        let mut graph = self.graph.lock();
        if graph.bracket_depth == 0 {
            warn!("commit without a matching begin");
            return;
        }
        graph.bracket_depth -= 1;
        graph.counters.commit_calls += 1;
    }

    fn is_configuring(&self) -> bool {
        self.graph.lock().bracket_depth > 0
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.graph.lock().preset = Some(preset);
    }

    fn make_input(&self, device: Arc<dyn CaptureDevice>) -> Result<DeviceInput, CameraError> {
        let mut graph = self.graph.lock();
        if let Some(ref cause) = graph.faults.input_error {
            return Err(CameraError::CreateCaptureInput(cause.clone()));
        }
        if !device.is_connected() {
            return Err(CameraError::CreateCaptureInput(format!(
                "{} is disconnected",
                device.descriptor().name
            )));
        }
        let id = graph.next_id;
        graph.next_id += 1;
        Ok(DeviceInput::new(id, device))
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        let graph = self.graph.lock();
        !graph.faults.reject_input && graph.inputs.is_empty()
    }

    fn add_input(&mut self, input: DeviceInput) {
        let mut graph = self.graph.lock();
        graph.check_bracket("add_input");
        debug!("input {} added ({})", input.id(), input.device().descriptor().name);
        graph.inputs.push(input);
        graph.counters.inputs_added += 1;
        graph.counters.max_input_count = graph.counters.max_input_count.max(graph.inputs.len());
    }

    fn remove_input(&mut self, input_id: u64) {
        let mut graph = self.graph.lock();
        graph.check_bracket("remove_input");
        graph.inputs.retain(|i| i.id() != input_id);
    }

    fn inputs(&self) -> Vec<DeviceInput> {
        self.graph.lock().inputs.clone()
    }

    fn can_add_output(&self, _settings: &VideoOutputSettings) -> bool {
        let graph = self.graph.lock();
        !graph.faults.reject_output && graph.outputs.lock().is_empty()
    }

    fn add_output(&mut self, output: VideoOutput) -> u64 {
        let mut graph = self.graph.lock();
        graph.check_bracket("add_output");
        let id = graph.next_id;
        graph.next_id += 1;
        graph.outputs.lock().push((id, output));
        graph.counters.outputs_added += 1;
        id
    }

    fn remove_output(&mut self, output_id: u64) {
        let mut graph = self.graph.lock();
        graph.check_bracket("remove_output");
        graph.outputs.lock().retain(|(id, _)| *id != output_id);
    }

    fn output_ids(&self) -> Vec<u64> {
        self.graph.lock().outputs.lock().iter().map(|(id, _)| *id).collect()
    }

    fn start_running(&mut self) {
        let mut graph = self.graph.lock();
        graph.counters.start_calls += 1;
        if graph.bracket_depth > 0 {
            error!("start requested inside a configuration bracket; ignored");
            graph.counters.starts_during_bracket += 1;
            return;
        }
        if graph.faults.start_fails || graph.running {
            return;
        }
        match FramePump::start(
            self.fps,
            self.resolution,
            Arc::clone(&graph.outputs),
            Arc::clone(&self.frozen),
        ) {
            Ok(pump) => {
                graph.pump = Some(pump);
                graph.running = true;
            }
            Err(e) => error!("session failed to start: {}", e),
        }
    }

    fn stop_running(&mut self) {
        let pump = {
            let mut graph = self.graph.lock();
            graph.counters.stop_calls += 1;
            graph.take_pump()
        };
        drop(pump);
    }

    fn is_running(&self) -> bool {
        self.graph.lock().running
    }

    fn attach_preview(&mut self, id: PreviewId, orientation: CaptureOrientation) {
        self.graph.lock().previews.insert(
            id,
            PreviewConnection {
                orientation,
                enabled: true,
            },
        );
    }

    fn detach_preview(&mut self, id: PreviewId) {
        self.graph.lock().previews.remove(&id);
    }

    fn preview_connection_enabled(&self, id: PreviewId) -> Option<bool> {
        self.graph.lock().previews.get(&id).map(|c| c.enabled)
    }
}
