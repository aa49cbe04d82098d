//! In-crate fakes for the capture backend and a virtual-time command sink.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::authorization::AuthorizationState;
use crate::models::camera_models::{
    DeviceDescriptor, DevicePosition, DeviceType, FrameInfo, FrameRateRange, PreviewId,
    SessionPreset, VideoOutputSettings,
};
use crate::models::config::SessionConfiguration;
use crate::models::error::CameraError;
use crate::models::orientation::CaptureOrientation;
use crate::models::state::LifecycleState;
use crate::models::status::StatusReport;
use crate::session::command::{Command, CommandSink};
use crate::session::controller::LifecycleController;
use crate::session::permission_gate::PermissionGate;
use crate::traits::authorizer::{AuthorizationCallback, CameraAuthorizer};
use crate::traits::capture_device::CaptureDevice;
use crate::traits::capture_session::{CaptureSession, DeviceInput, VideoOutput};
use crate::traits::dispatch::{InlineDispatcher, ResponsivenessProbe};

// --- Devices ---

pub struct FakeDevice {
    descriptor: DeviceDescriptor,
    locked: AtomicBool,
    contended: AtomicBool,
    lock_calls: AtomicU32,
    unlock_calls: AtomicU32,
    active_frame_rate: Mutex<Option<FrameRateRange>>,
}

impl FakeDevice {
    fn new(id: &str, device_type: DeviceType, position: DevicePosition) -> Arc<Self> {
        Arc::new(Self {
            descriptor: DeviceDescriptor {
                unique_id: id.into(),
                name: id.into(),
                device_type,
                position,
            },
            locked: AtomicBool::new(false),
            contended: AtomicBool::new(false),
            lock_calls: AtomicU32::new(0),
            unlock_calls: AtomicU32::new(0),
            active_frame_rate: Mutex::new(None),
        })
    }

    pub fn ultra_wide_back() -> Arc<Self> {
        Self::new("ultra-wide-back", DeviceType::UltraWide, DevicePosition::Back)
    }

    pub fn wide_back() -> Arc<Self> {
        Self::new("wide-back", DeviceType::WideAngle, DevicePosition::Back)
    }

    pub fn front() -> Arc<Self> {
        Self::new("wide-front", DeviceType::WideAngle, DevicePosition::Front)
    }

    /// Simulate another process holding the device.
    pub fn set_contended(&self, contended: bool) {
        self.contended.store(contended, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn lock_calls(&self) -> u32 {
        self.lock_calls.load(Ordering::SeqCst)
    }

    pub fn unlock_calls(&self) -> u32 {
        self.unlock_calls.load(Ordering::SeqCst)
    }

    pub fn active_frame_rate(&self) -> Option<FrameRateRange> {
        *self.active_frame_rate.lock()
    }
}

impl CaptureDevice for FakeDevice {
    fn descriptor(&self) -> DeviceDescriptor {
        self.descriptor.clone()
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn has_video(&self) -> bool {
        true
    }

    fn frame_rate_ranges(&self) -> Vec<FrameRateRange> {
        vec![FrameRateRange::new(1.0, 30.0), FrameRateRange::new(1.0, 60.0)]
    }

    fn lock_for_configuration(&self) -> Result<(), CameraError> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        if self.contended.load(Ordering::SeqCst) {
            return Err(CameraError::DeviceLocked);
        }
        self.locked.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        self.locked.store(false, Ordering::SeqCst);
    }

    fn set_active_frame_rate(&self, range: FrameRateRange) -> Result<(), CameraError> {
        if !self.is_locked() {
            return Err(CameraError::Internal("device not locked".into()));
        }
        *self.active_frame_rate.lock() = Some(range);
        Ok(())
    }
}

// --- Session ---

/// Capture graph with public counters and fault switches.
pub struct FakeSession {
    pub devices: Vec<Arc<FakeDevice>>,
    pub inputs: Vec<DeviceInput>,
    pub outputs: Vec<(u64, VideoOutput)>,
    pub preset: Option<SessionPreset>,
    pub previews: HashMap<PreviewId, CaptureOrientation>,
    pub disabled_previews: Vec<PreviewId>,
    pub running: bool,

    pub reject_input: bool,
    pub reject_output: bool,
    pub input_error: Option<CameraError>,
    pub start_fails: bool,
    /// Artificial latency of every input construction.
    pub configure_delay: Duration,

    pub bracket_depth: u32,
    pub begin_calls: u32,
    pub commit_calls: u32,
    pub inputs_added: u32,
    pub outputs_added: u32,
    pub max_inputs: usize,
    pub start_calls: u32,
    pub stop_calls: u32,
    pub starts_during_bracket: u32,
    next_id: u64,
}

impl FakeSession {
    pub fn with_devices(devices: Vec<Arc<FakeDevice>>) -> Self {
        Self {
            devices,
            inputs: Vec::new(),
            outputs: Vec::new(),
            preset: None,
            previews: HashMap::new(),
            disabled_previews: Vec::new(),
            running: false,
            reject_input: false,
            reject_output: false,
            input_error: None,
            start_fails: false,
            configure_delay: Duration::ZERO,
            bracket_depth: 0,
            begin_calls: 0,
            commit_calls: 0,
            inputs_added: 0,
            outputs_added: 0,
            max_inputs: 0,
            start_calls: 0,
            stop_calls: 0,
            starts_during_bracket: 0,
            next_id: 1,
        }
    }

    /// Ultra-wide back, wide back, front.
    pub fn iphone() -> Self {
        Self::with_devices(vec![
            FakeDevice::ultra_wide_back(),
            FakeDevice::wide_back(),
            FakeDevice::front(),
        ])
    }

    /// Push one frame through every attached output.
    pub fn disable_preview(&mut self, id: PreviewId) {
        self.disabled_previews.push(id);
    }

    pub fn deliver_frame(&self) {
        if !self.running {
            return;
        }
        let frame = FrameInfo {
            width: 1920,
            height: 1080,
            timestamp_secs: 0.0,
        };
        for (_, output) in &self.outputs {
            (output.on_frame)(frame);
        }
    }

    fn assert_in_bracket(&self, what: &str) {
        assert!(self.bracket_depth > 0, "{} outside configuration bracket", what);
    }
}

impl CaptureSession for FakeSession {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>> {
        self.devices
            .iter()
            .map(|d| d.clone() as Arc<dyn CaptureDevice>)
            .collect()
    }

    fn begin_configuration(&mut self) {
        self.begin_calls += 1;
        self.bracket_depth += 1;
    }

    fn commit_configuration(&mut self) {
        self.commit_calls += 1;
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
    }

    fn is_configuring(&self) -> bool {
        self.bracket_depth > 0
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.preset = Some(preset);
    }

    fn make_input(&self, device: Arc<dyn CaptureDevice>) -> Result<DeviceInput, CameraError> {
        if !self.configure_delay.is_zero() {
            thread::sleep(self.configure_delay);
        }
        if let Some(ref err) = self.input_error {
            return Err(err.clone());
        }
        Ok(DeviceInput::new(self.next_id, device))
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        !self.reject_input && self.inputs.is_empty()
    }

    fn add_input(&mut self, input: DeviceInput) {
        self.assert_in_bracket("add_input");
        self.next_id += 1;
        self.inputs_added += 1;
        self.inputs.push(input);
        self.max_inputs = self.max_inputs.max(self.inputs.len());
    }

    fn remove_input(&mut self, input_id: u64) {
        self.assert_in_bracket("remove_input");
        self.inputs.retain(|i| i.id() != input_id);
    }

    fn inputs(&self) -> Vec<DeviceInput> {
        self.inputs.clone()
    }

    fn can_add_output(&self, _settings: &VideoOutputSettings) -> bool {
        !self.reject_output && self.outputs.is_empty()
    }

    fn add_output(&mut self, output: VideoOutput) -> u64 {
        self.assert_in_bracket("add_output");
        let id = self.next_id;
        self.next_id += 1;
        self.outputs_added += 1;
        self.outputs.push((id, output));
        id
    }

    fn remove_output(&mut self, output_id: u64) {
        self.assert_in_bracket("remove_output");
        self.outputs.retain(|(id, _)| *id != output_id);
    }

    fn output_ids(&self) -> Vec<u64> {
        self.outputs.iter().map(|(id, _)| *id).collect()
    }

    fn start_running(&mut self) {
        self.start_calls += 1;
        if self.is_configuring() {
            self.starts_during_bracket += 1;
        }
        if !self.start_fails {
            self.running = true;
        }
    }

    fn stop_running(&mut self) {
        self.stop_calls += 1;
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn attach_preview(&mut self, id: PreviewId, orientation: CaptureOrientation) {
        self.previews.insert(id, orientation);
    }

    fn detach_preview(&mut self, id: PreviewId) {
        self.previews.remove(&id);
    }

    fn preview_connection_enabled(&self, id: PreviewId) -> Option<bool> {
        self.previews
            .get(&id)
            .map(|_| !self.disabled_previews.contains(&id))
    }
}

// --- Authorization ---

/// Authorizer whose prompt stays open until [`respond`](Self::respond).
pub struct FakeAuthorizer {
    status: Mutex<AuthorizationState>,
    pending: Mutex<Option<AuthorizationCallback>>,
    requests: AtomicU32,
}

impl FakeAuthorizer {
    pub fn new(status: AuthorizationState) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
            pending: Mutex::new(None),
            requests: AtomicU32::new(0),
        })
    }

    pub fn deferred() -> Arc<Self> {
        Self::new(AuthorizationState::NotDetermined)
    }

    /// Answer the open prompt; the status follows the answer.
    pub fn respond(&self, granted: bool) {
        *self.status.lock() = if granted {
            AuthorizationState::Authorized
        } else {
            AuthorizationState::Denied
        };
        let completion = self.pending.lock().take();
        if let Some(completion) = completion {
            completion(granted);
        }
    }

    /// Change the status as if from system settings.
    pub fn set_status(&self, status: AuthorizationState) {
        *self.status.lock() = status;
    }

    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl CameraAuthorizer for FakeAuthorizer {
    fn authorization_status(&self) -> AuthorizationState {
        *self.status.lock()
    }

    fn request_access(&self, completion: AuthorizationCallback) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.pending.lock() = Some(completion);
    }
}

pub struct StalledProbe;

impl ResponsivenessProbe for StalledProbe {
    fn is_responsive(&self, _timeout: Duration) -> bool {
        false
    }
}

// --- Virtual time ---

struct Scheduled {
    due: Duration,
    seq: u64,
    command: Command,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

#[derive(Default)]
struct Timeline {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Scheduled>,
}

/// Command sink driven by a manual clock.
#[derive(Default)]
pub struct VirtualSink {
    timeline: Mutex<Timeline>,
}

impl VirtualSink {
    /// Pop the next command due at or before `until`, advancing the clock to it.
    pub fn pop_due(&self, until: Duration) -> Option<Command> {
        let mut timeline = self.timeline.lock();
        if timeline.queue.peek().is_some_and(|next| next.due <= until) {
            let next = timeline.queue.pop()?;
            timeline.now = timeline.now.max(next.due);
            return Some(next.command);
        }
        None
    }

    pub fn now(&self) -> Duration {
        self.timeline.lock().now
    }

    fn advance_to(&self, until: Duration) {
        let mut timeline = self.timeline.lock();
        timeline.now = timeline.now.max(until);
    }

    pub fn pending(&self) -> Vec<Command> {
        self.timeline
            .lock()
            .queue
            .iter()
            .map(|s| s.command.clone())
            .collect()
    }
}

impl CommandSink for VirtualSink {
    fn post(&self, delay: Duration, command: Command) {
        let mut timeline = self.timeline.lock();
        let due = timeline.now + delay;
        let seq = timeline.seq;
        timeline.seq += 1;
        timeline.queue.push(Scheduled { due, seq, command });
    }
}

/// A controller over a [`FakeSession`] with virtual time.
pub struct Harness {
    pub controller: LifecycleController<FakeSession>,
    pub authorizer: Arc<FakeAuthorizer>,
    pub sink: Arc<VirtualSink>,
}

impl Harness {
    pub fn config() -> SessionConfiguration {
        SessionConfiguration::default()
    }

    pub fn new(session: FakeSession, status: AuthorizationState) -> Self {
        Self::with_config(session, status, Self::config())
    }

    pub fn authorized() -> Self {
        Self::new(FakeSession::iphone(), AuthorizationState::Authorized)
    }

    pub fn with_config(
        session: FakeSession,
        status: AuthorizationState,
        config: SessionConfiguration,
    ) -> Self {
        let authorizer = FakeAuthorizer::new(status);
        let sink = Arc::new(VirtualSink::default());
        let gate = Arc::new(PermissionGate::new(
            authorizer.clone(),
            Arc::new(InlineDispatcher),
        ));
        let controller = LifecycleController::new(
            session,
            config,
            gate,
            sink.clone(),
            Arc::new(Mutex::new(StatusReport::default())),
        );
        Self {
            controller,
            authorizer,
            sink,
        }
    }

    /// Advance virtual time, handling every command that falls due.
    pub fn run_for(&mut self, duration: Duration) {
        let until = self.sink.now() + duration;
        while let Some(command) = self.sink.pop_due(until) {
            self.controller.handle(command);
        }
        self.sink.advance_to(until);
    }

    pub fn state(&self) -> LifecycleState {
        self.controller.state().clone()
    }

    pub fn deliver_frame(&self) {
        self.controller.session().deliver_frame();
    }
}
