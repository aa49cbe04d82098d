use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::models::authorization::AuthorizationState;
use crate::models::camera_models::{FrameInfo, PreviewId};
use crate::models::config::SessionConfiguration;
use crate::models::error::CameraError;
use crate::models::events::LifecycleEvent;
use crate::models::orientation::CaptureOrientation;
use crate::models::state::{DegradedReason, LifecycleState};
use crate::models::status::StatusReport;
use crate::session::command::{Command, CommandSink};
use crate::session::configurator::Configurator;
use crate::session::generation::Generation;
use crate::session::health_monitor::{HealthMonitor, PollOutcome};
use crate::session::permission_gate::PermissionGate;
use crate::session::preview_binder::PreviewRegistry;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_device::FrameCallback;
use crate::traits::capture_session::CaptureSession;
use crate::traits::dispatch::ResponsivenessProbe;

/// Camera session lifecycle state machine.
///
/// Owns the capture graph and runs every operation on it. Lives on the
/// session queue: all methods are expected to be called from there, with
/// deferred work coming back through [`handle`](Self::handle).
///
/// ```text
/// idle → authorizing → configuring → starting → verifying → running
///                          ↑                                   ↓
///                      resetting ← ─ ─ ─ ─ ─ ─ ─ ─ interrupted / degraded
/// ```
pub struct LifecycleController<S: CaptureSession> {
    session: S,
    config: SessionConfiguration,
    configurator: Configurator,
    monitor: HealthMonitor,
    gate: Arc<PermissionGate>,
    sink: Arc<dyn CommandSink>,
    probe: Option<Arc<dyn ResponsivenessProbe>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    status: Arc<Mutex<StatusReport>>,

    state: LifecycleState,
    /// Bumped on every transition; deferred commands from older epochs are stale.
    epoch: u64,
    generation: Generation,
    resets: u64,
    /// Resets since the pipeline last reached `Running`.
    resets_since_running: u32,
    preview: Option<PreviewId>,
    previews: PreviewRegistry,
}

impl<S: CaptureSession> LifecycleController<S> {
    pub fn new(
        session: S,
        config: SessionConfiguration,
        gate: Arc<PermissionGate>,
        sink: Arc<dyn CommandSink>,
        status: Arc<Mutex<StatusReport>>,
    ) -> Self {
        let controller = Self {
            configurator: Configurator::new(&config),
            monitor: HealthMonitor::new(&config),
            session,
            config,
            gate,
            sink,
            probe: None,
            delegate: None,
            status,
            state: LifecycleState::Idle,
            epoch: 0,
            generation: Generation::first(),
            resets: 0,
            resets_since_running: 0,
            preview: None,
            previews: PreviewRegistry::new(),
        };
        controller.refresh_status();
        controller
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_probe(&mut self, probe: Arc<dyn ResponsivenessProbe>) {
        self.probe = Some(probe);
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn status(&self) -> StatusReport {
        self.status.lock().clone()
    }

    /// Preview connection states, kept current from the session queue.
    pub fn preview_registry(&self) -> PreviewRegistry {
        self.previews.clone()
    }

    // --- External triggers ---

    /// Run the whole pipeline towards `Running`. Idempotent while the
    /// pipeline is already in flight or running.
    pub fn initialize(&mut self) {
        if self.state.is_in_flight() || self.state.is_running() {
            debug!("initialize ignored in state {}", self.state);
            return;
        }

        let status = self.gate.check();
        self.record_authorization(status);
        match status {
            AuthorizationState::Authorized => self.begin_configuring(),
            AuthorizationState::NotDetermined => {
                self.transition(LifecycleState::Authorizing);
                let sink = Arc::clone(&self.sink);
                self.gate.request(Box::new(move |granted| {
                    sink.post(Duration::ZERO, Command::AuthorizationResolved { granted });
                }));
            }
            blocked => self.deny(blocked),
        }
    }

    /// Start capturing. No-op when already running or on the way there.
    pub fn start_session(&mut self) {
        match self.state {
            LifecycleState::Running
            | LifecycleState::Starting
            | LifecycleState::Verifying
            | LifecycleState::Authorizing
            | LifecycleState::Configuring
            | LifecycleState::Resetting => {
                debug!("start ignored in state {}", self.state);
            }
            LifecycleState::Idle | LifecycleState::PermissionDenied => self.initialize(),
            _ if !self.gate.check().is_authorized() => self.initialize(),
            _ => self.resume(),
        }
    }

    /// Stop capturing. Safe to call in any state; cancels every pending
    /// deferred step.
    pub fn stop_session(&mut self) {
        let resting = self.state.is_resting() || self.state.is_terminal();
        if resting && !self.session.is_running() {
            debug!("stop ignored: already stopped");
            return;
        }
        if self.session.is_running() {
            self.session.stop_running();
        }
        if !self.state.is_terminal() {
            self.transition(LifecycleState::Stopped);
        } else {
            self.refresh_status();
        }
        info!("capture session stopped");
    }

    /// Force a full reset regardless of health.
    pub fn refresh(&mut self) {
        match self.state {
            LifecycleState::Resetting => debug!("refresh coalesced into reset in flight"),
            LifecycleState::Configuring => {
                debug!("refresh deferred: configuration in flight");
                self.sink.post(self.config.deferral_delay, Command::Refresh);
            }
            LifecycleState::Authorizing => debug!("refresh ignored: waiting for authorization"),
            LifecycleState::Suspended => debug!("refresh ignored while in background"),
            LifecycleState::Idle | LifecycleState::PermissionDenied => self.initialize(),
            _ if !self.gate.check().is_authorized() => self.initialize(),
            _ => {
                info!("refresh requested");
                self.begin_reset(DegradedReason::Refresh, self.config.reset_cooldown);
            }
        }
    }

    /// Connect a preview surface. Never touches the capture graph.
    pub fn attach_preview(&mut self, id: PreviewId, orientation: CaptureOrientation) {
        self.session.attach_preview(id, orientation);
        if let Some(enabled) = self.session.preview_connection_enabled(id) {
            self.previews.update(id, enabled);
        }
        self.preview = Some(id);
        self.refresh_status();
    }

    pub fn detach_preview(&mut self, id: PreviewId) {
        self.session.detach_preview(id);
        self.previews.remove(id);
        if self.preview == Some(id) {
            self.preview = None;
        }
        self.refresh_status();
    }

    /// Entry point for everything posted through the [`CommandSink`].
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::AuthorizationResolved { granted } => self.on_authorization(granted),
            Command::ConfigureRetry { epoch } => {
                if self.is_current(epoch, &LifecycleState::Configuring) {
                    self.configure_attempt();
                }
            }
            Command::RetryStart { epoch } => {
                if self.is_current(epoch, &LifecycleState::Starting) {
                    self.issue_start();
                }
            }
            Command::VerifyStart { epoch } => {
                if self.is_current(epoch, &LifecycleState::Verifying) {
                    self.verify_start();
                }
            }
            Command::VerifyFrames { epoch } => {
                if self.is_current(epoch, &LifecycleState::Verifying) {
                    self.verify_frames();
                }
            }
            Command::FrameArrived { generation } => {
                if generation == self.generation.number
                    && self.state == LifecycleState::Verifying
                    && self.session.is_running()
                    && self.frames_since_start()
                {
                    self.enter_running();
                }
            }
            Command::HealthPoll { epoch } => {
                if self.is_current(epoch, &LifecycleState::Running) {
                    self.poll_health();
                }
            }
            Command::ResetCooldownElapsed { epoch } => {
                if self.is_current(epoch, &LifecycleState::Resetting) {
                    self.begin_configuring();
                }
            }
            Command::Initialize => self.initialize(),
            Command::StartSession => self.start_session(),
            Command::StopSession => self.stop_session(),
            Command::Refresh => self.refresh(),
            Command::AttachPreview { id, orientation } => self.attach_preview(id, orientation),
            Command::DetachPreview { id } => self.detach_preview(id),
            Command::Event(event) => self.on_event(event),
        }
    }

    // --- Authorization ---

    fn on_authorization(&mut self, granted: bool) {
        let status = self.gate.check();
        self.record_authorization(if granted {
            AuthorizationState::Authorized
        } else {
            status
        });

        if !granted {
            let blocked = match status {
                AuthorizationState::NotDetermined | AuthorizationState::Authorized => {
                    AuthorizationState::Denied
                }
                other => other,
            };
            self.deny(blocked);
            return;
        }

        match self.state {
            LifecycleState::Idle | LifecycleState::Authorizing | LifecycleState::PermissionDenied => {
                info!("camera access granted");
                self.begin_configuring();
            }
            _ => debug!("authorization granted in state {}", self.state),
        }
    }

    fn deny(&mut self, status: AuthorizationState) {
        let err = status.blocking_error().unwrap_or(CameraError::DeniedAuthorization);
        if self.session.is_running() {
            self.session.stop_running();
        }
        self.publish_error(err);
        self.transition(LifecycleState::PermissionDenied);
    }

    fn record_authorization(&mut self, status: AuthorizationState) {
        let changed = {
            let mut report = self.status.lock();
            let was = report.is_authorized;
            report.authorization = status;
            report.is_authorized = status.is_authorized();
            was != report.is_authorized
        };
        if changed {
            if let Some(ref delegate) = self.delegate {
                delegate.on_authorization_changed(status.is_authorized());
            }
        }
    }

    // --- Configuration ---

    fn begin_configuring(&mut self) {
        self.transition(LifecycleState::Configuring);
        self.generation.configure_attempt = 0;
        self.configure_attempt();
    }

    fn configure_attempt(&mut self) {
        self.generation.configure_attempt += 1;
        let attempt = self.generation.configure_attempt;
        let max_attempts = self.config.configure_max_attempts;
        debug!(
            "configuring generation {} (attempt {}/{})",
            self.generation.number, attempt, max_attempts
        );

        let on_frame = self.frame_callback();
        let started = Instant::now();
        let mut result = self
            .configurator
            .configure(&mut self.session, &mut self.generation, on_frame);

        if result.is_ok() && started.elapsed() > self.config.configure_timeout {
            warn!(
                "configuration took {:?}, over the {:?} budget; discarding",
                started.elapsed(),
                self.config.configure_timeout
            );
            Configurator::teardown(&mut self.session);
            self.generation.configured = false;
            result = Err(CameraError::ConfigurationFailed);
        }

        match result {
            Ok(()) => {
                self.status.lock().last_configuration_error = None;
                self.issue_start();
            }
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                warn!("configuration attempt {}/{} failed: {}", attempt, max_attempts, e);
                self.status.lock().last_configuration_error = Some(e);
                self.refresh_status();
                self.sink.post(
                    self.config.backoff_for(attempt),
                    Command::ConfigureRetry { epoch: self.epoch },
                );
            }
            Err(e) => {
                error!("configuration failed after {} attempt(s): {}", attempt, e);
                self.status.lock().last_configuration_error = Some(e);
                self.publish_error(CameraError::ConfigurationFailed);
                self.transition(LifecycleState::ConfigurationFailed);
            }
        }
    }

    /// Frame-arrival callback for the current generation. Never blocks: a few
    /// atomic ops per frame plus a single post on the first frame after each
    /// start.
    fn frame_callback(&self) -> FrameCallback {
        let frames = Arc::clone(&self.generation.frames);
        let sink = Arc::clone(&self.sink);
        let generation = self.generation.number;
        Arc::new(move |_: FrameInfo| {
            if frames.record() {
                sink.post(Duration::ZERO, Command::FrameArrived { generation });
            }
        })
    }

    // --- Start and verification ---

    /// Restart from a resting or interrupted state.
    fn resume(&mut self) {
        if self.generation.configured && !self.session.inputs().is_empty() {
            self.issue_start();
        } else {
            self.begin_configuring();
        }
    }

    fn issue_start(&mut self) {
        if self.state != LifecycleState::Starting {
            self.transition(LifecycleState::Starting);
        }

        if self.session.is_configuring() {
            self.generation.start_refusals += 1;
            error!(
                "start refused: configuration bracket is open (refusal {})",
                self.generation.start_refusals
            );
            self.publish_error(CameraError::SessionStartFailed);
            if self.generation.start_refusals >= 2 {
                self.begin_reset(DegradedReason::StartFailed, self.config.reset_cooldown);
            } else {
                self.sink.post(
                    self.config.start_grace,
                    Command::RetryStart { epoch: self.epoch },
                );
            }
            return;
        }

        // Frames from before this start do not count towards verification.
        self.generation.frames_at_start = self.generation.frames.arm();
        if !self.session.is_running() {
            self.session.start_running();
        }
        self.transition(LifecycleState::Verifying);
        self.sink.post(
            self.config.start_grace,
            Command::VerifyStart { epoch: self.epoch },
        );
    }

    fn verify_start(&mut self) {
        if self.session.is_running() {
            if self.frames_since_start() {
                self.enter_running();
            } else {
                self.sink.post(
                    self.config.frame_grace,
                    Command::VerifyFrames { epoch: self.epoch },
                );
            }
            return;
        }

        if self.generation.start_retried {
            error!("session still not running after retry");
            self.begin_reset(DegradedReason::StartFailed, self.config.reset_cooldown);
            return;
        }
        self.generation.start_retried = true;

        if let Some(ref probe) = self.probe {
            if !probe.is_responsive(self.config.probe_timeout) {
                error!("host context stalled; skipping immediate start retry");
                self.publish_error(CameraError::DeviceUnresponsive);
                self.begin_reset(DegradedReason::StartFailed, self.config.unresponsive_cooldown);
                return;
            }
        }

        warn!("session not running after start; retrying once");
        self.session.start_running();
        self.refresh_status();
        self.sink.post(
            self.config.start_grace,
            Command::VerifyStart { epoch: self.epoch },
        );
    }

    fn verify_frames(&mut self) {
        if self.frames_since_start() {
            self.enter_running();
        } else {
            warn!("no frame within {:?} of start", self.config.frame_grace);
            self.begin_reset(DegradedReason::NoFrames, self.config.reset_cooldown);
        }
    }

    fn frames_since_start(&self) -> bool {
        self.generation.frames.frames_since(self.generation.frames_at_start)
    }

    fn enter_running(&mut self) {
        self.resets_since_running = 0;
        self.generation.consecutive_failures = 0;
        self.clear_error();
        self.transition(LifecycleState::Running);
        info!("camera running (generation {})", self.generation.number);
        self.schedule_health_poll();
    }

    // --- Health ---

    fn schedule_health_poll(&self) {
        self.sink.post(
            self.config.health_interval,
            Command::HealthPoll { epoch: self.epoch },
        );
    }

    fn poll_health(&mut self) {
        let snapshot = HealthMonitor::snapshot(&self.session, &self.generation.frames, self.preview);
        if let (Some(id), Some(enabled)) = (self.preview, snapshot.preview_connection_enabled) {
            self.previews.update(id, enabled);
        }
        let outcome = self.monitor.evaluate(&snapshot, &mut self.generation);
        self.refresh_status();
        match outcome {
            PollOutcome::ResetRequired(err) => {
                error!("health check failed {} times in a row", self.config.health_failure_threshold);
                self.publish_error(err);
                self.begin_reset(DegradedReason::HealthCheckFailed, self.config.reset_cooldown);
            }
            PollOutcome::Healthy | PollOutcome::Unhealthy { .. } => self.schedule_health_poll(),
        }
    }

    // --- Reset ---

    fn begin_reset(&mut self, reason: DegradedReason, cooldown: Duration) {
        if self.state == LifecycleState::Resetting {
            debug!("reset already in flight; coalescing");
            return;
        }

        // Self-healing failures are surfaced only when they recur.
        if self.resets_since_running > 0 {
            let recurring = match reason {
                DegradedReason::NoFrames => Some(CameraError::NoVideoSignal),
                DegradedReason::StartFailed | DegradedReason::RuntimeError(_) => {
                    Some(CameraError::SessionStartFailed)
                }
                DegradedReason::HealthCheckFailed | DegradedReason::Refresh => None,
            };
            if let Some(err) = recurring {
                self.publish_error(err);
            }
        }

        warn!("resetting capture session: {:?}", reason);
        self.transition(LifecycleState::Degraded(reason));
        self.transition(LifecycleState::Resetting);

        if self.session.is_running() {
            self.session.stop_running();
        }
        Configurator::teardown(&mut self.session);
        self.generation = self.generation.next();
        self.resets += 1;
        self.resets_since_running += 1;
        self.refresh_status();

        self.sink.post(
            cooldown,
            Command::ResetCooldownElapsed { epoch: self.epoch },
        );
    }

    // --- App lifecycle ---

    fn on_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::DidEnterBackground => self.enter_background(),
            LifecycleEvent::WillEnterForeground => self.enter_foreground(),
            LifecycleEvent::SessionInterrupted(reason) => {
                if matches!(
                    self.state,
                    LifecycleState::Running | LifecycleState::Verifying | LifecycleState::Starting
                ) {
                    warn!("capture session interrupted: {:?}", reason);
                    self.transition(LifecycleState::Interrupted(reason));
                }
            }
            LifecycleEvent::InterruptionEnded => {
                if matches!(self.state, LifecycleState::Interrupted(_)) {
                    info!("interruption ended; restarting without reset");
                    self.resume();
                }
            }
            LifecycleEvent::RuntimeError(message) => {
                if matches!(
                    self.state,
                    LifecycleState::Running
                        | LifecycleState::Verifying
                        | LifecycleState::Starting
                        | LifecycleState::Interrupted(_)
                ) {
                    warn!("capture runtime error: {}", message);
                    self.begin_reset(
                        DegradedReason::RuntimeError(message),
                        self.config.reset_cooldown,
                    );
                } else {
                    debug!("runtime error ignored in state {}: {}", self.state, message);
                }
            }
            LifecycleEvent::PreviewReleased(id) => self.detach_preview(id),
        }
    }

    fn enter_background(&mut self) {
        if self.session.is_running() {
            self.session.stop_running();
        }
        match self.state {
            LifecycleState::Idle
            | LifecycleState::Stopped
            | LifecycleState::PermissionDenied
            | LifecycleState::Suspended => self.refresh_status(),
            _ => {
                info!("entering background; capture suspended");
                self.transition(LifecycleState::Suspended);
            }
        }
    }

    fn enter_foreground(&mut self) {
        match self.state {
            LifecycleState::Suspended | LifecycleState::ConfigurationFailed => {
                let status = self.gate.check();
                self.record_authorization(status);
                if status.is_authorized() {
                    info!("entering foreground; restarting capture");
                    self.resume();
                } else {
                    self.initialize();
                }
            }
            // The user may have granted access in system settings meanwhile.
            LifecycleState::PermissionDenied => self.initialize(),
            _ => debug!("foreground ignored in state {}", self.state),
        }
    }

    // --- Observable state ---

    fn is_current(&self, epoch: u64, expected: &LifecycleState) -> bool {
        let current = epoch == self.epoch && self.state == *expected;
        if !current {
            debug!("dropping stale command (epoch {} vs {}, state {})", epoch, self.epoch, self.state);
        }
        current
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!("{} → {}", self.state, next);
        self.state = next;
        self.epoch += 1;
        self.refresh_status();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }

    fn publish_error(&mut self, err: CameraError) {
        if err.is_permission_error() {
            warn!("{} ({})", err, err.recovery_hint());
        } else {
            error!("camera error: {}", err);
        }
        {
            let mut report = self.status.lock();
            report.last_error = Some(err.clone());
            report.last_error_at = Some(Utc::now());
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&err);
        }
    }

    fn clear_error(&mut self) {
        let had_error = self.status.lock().last_error.take().is_some();
        if had_error {
            self.status.lock().last_error_at = None;
            if let Some(ref delegate) = self.delegate {
                delegate.on_error_cleared();
            }
        }
    }

    fn refresh_status(&self) {
        let is_running = self.session.is_running();
        let was_running = {
            let mut report = self.status.lock();
            let was_running = report.is_running;
            report.state = self.state.clone();
            report.is_running = is_running;
            report.generation = self.generation.number;
            report.configured = self.generation.configured;
            report.input_count = self.session.inputs().len();
            report.output_count = self.session.output_ids().len();
            report.frames_received = self.generation.frames.frames_received();
            report.last_frame_age_ms = self
                .generation
                .frames
                .since_last_frame()
                .map(|age| age.as_millis() as u64);
            report.consecutive_health_failures = self.generation.consecutive_failures;
            report.resets = self.resets;
            report.preview_attached = self.preview.is_some();
            was_running
        };
        if was_running != is_running {
            if let Some(ref delegate) = self.delegate {
                delegate.on_running_changed(is_running);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::InterruptionReason;
    use crate::session::test_support::{FakeSession, Harness};

    fn running_harness() -> Harness {
        let mut h = Harness::authorized();
        h.controller.initialize();
        h.run_for(Duration::from_millis(600));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        h
    }

    #[test]
    fn not_determined_then_granted_reaches_running() {
        let mut h = Harness::new(FakeSession::iphone(), AuthorizationState::NotDetermined);
        h.controller.initialize();
        assert_eq!(h.state(), LifecycleState::Authorizing);
        assert_eq!(h.authorizer.request_count(), 1);

        h.authorizer.respond(true);
        h.run_for(Duration::ZERO);
        assert_eq!(h.controller.session().inputs.len(), 1);

        h.run_for(Duration::from_millis(600));
        assert_eq!(h.state(), LifecycleState::Verifying);
        h.deliver_frame();
        h.run_for(Duration::ZERO);

        assert_eq!(h.state(), LifecycleState::Running);
        let status = h.controller.status();
        assert!(status.is_authorized);
        assert!(status.is_running);
        assert_eq!(status.last_error, None);
    }

    #[test]
    fn denied_goes_terminal_without_configuring() {
        let mut h = Harness::new(FakeSession::iphone(), AuthorizationState::Denied);
        h.controller.initialize();
        assert_eq!(h.state(), LifecycleState::PermissionDenied);
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::DeniedAuthorization)
        );
        assert_eq!(h.controller.session().begin_calls, 0);
        assert_eq!(h.authorizer.request_count(), 0);

        h.controller.initialize();
        assert_eq!(h.controller.session().begin_calls, 0);
        assert_eq!(h.authorizer.request_count(), 0);
    }

    #[test]
    fn restricted_reports_restricted() {
        let mut h = Harness::new(FakeSession::iphone(), AuthorizationState::Restricted);
        h.controller.initialize();
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::RestrictedAuthorization)
        );
    }

    #[test]
    fn prompt_denial_is_terminal() {
        let mut h = Harness::new(FakeSession::iphone(), AuthorizationState::NotDetermined);
        h.controller.initialize();
        h.authorizer.respond(false);
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::PermissionDenied);
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::DeniedAuthorization)
        );
    }

    #[test]
    fn foreground_after_settings_change_recovers_from_denial() {
        let mut h = Harness::new(FakeSession::iphone(), AuthorizationState::Denied);
        h.controller.initialize();
        h.authorizer.set_status(AuthorizationState::Authorized);
        h.controller
            .handle(Command::Event(LifecycleEvent::WillEnterForeground));
        h.run_for(Duration::from_millis(600));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.status().last_error, None);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut h = running_harness();
        h.controller.initialize();
        h.controller.initialize();
        assert_eq!(h.controller.session().begin_calls, 1);
        assert_eq!(h.controller.session().start_calls, 1);
    }

    #[test]
    fn start_stop_is_idempotent() {
        let mut h = running_harness();
        h.controller.stop_session();
        h.controller.stop_session();
        assert!(!h.controller.session().running);
        assert_eq!(h.controller.session().stop_calls, 1);
        assert_eq!(h.state(), LifecycleState::Stopped);

        h.controller.start_session();
        h.controller.start_session();
        assert!(h.controller.session().running);
        assert_eq!(h.controller.session().start_calls, 2);
        // The graph survived the stop; no second configuration.
        assert_eq!(h.controller.session().inputs_added, 1);

        h.controller.stop_session();
        assert!(!h.controller.session().running);
        assert!(!h.controller.status().is_running);
    }

    #[test]
    fn stop_cancels_pending_verification() {
        let mut h = Harness::authorized();
        h.controller.initialize();
        assert_eq!(h.state(), LifecycleState::Verifying);
        h.controller.stop_session();
        h.run_for(Duration::from_secs(10));
        assert_eq!(h.state(), LifecycleState::Stopped);
        assert_eq!(h.controller.resets(), 0);
    }

    #[test]
    fn configuration_retries_then_fails() {
        let mut session = FakeSession::iphone();
        session.reject_input = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();
        assert_eq!(h.state(), LifecycleState::Configuring);
        assert_eq!(h.controller.status().last_error, None);

        h.run_for(Duration::from_secs(5));
        assert_eq!(h.state(), LifecycleState::ConfigurationFailed);
        assert_eq!(h.controller.session().begin_calls, 3);
        let status = h.controller.status();
        assert_eq!(status.last_error, Some(CameraError::ConfigurationFailed));
        assert_eq!(status.last_configuration_error, Some(CameraError::CannotAddInput));
        assert!(h.controller.session().inputs.is_empty());
    }

    #[test]
    fn configuration_failure_retried_on_next_trigger() {
        let mut session = FakeSession::iphone();
        session.reject_input = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();
        h.run_for(Duration::from_secs(5));
        assert_eq!(h.state(), LifecycleState::ConfigurationFailed);

        h.controller.session_mut().reject_input = false;
        h.controller
            .handle(Command::Event(LifecycleEvent::WillEnterForeground));
        h.run_for(Duration::from_millis(600));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.status().last_error, None);
    }

    #[test]
    fn non_retryable_configuration_error_fails_immediately() {
        let mut session = FakeSession::iphone();
        session.input_error = Some(CameraError::Internal("driver crashed".into()));
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();

        assert_eq!(h.state(), LifecycleState::ConfigurationFailed);
        assert_eq!(h.controller.session().begin_calls, 1);
        assert_eq!(
            h.controller.status().last_configuration_error,
            Some(CameraError::Internal("driver crashed".into()))
        );
        assert!(h.sink.pending().is_empty());
    }

    #[test]
    fn slow_configuration_counts_as_failure() {
        let mut session = FakeSession::iphone();
        session.configure_delay = Duration::from_millis(20);
        let config = SessionConfiguration {
            configure_timeout: Duration::from_millis(1),
            ..Harness::config()
        };
        let mut h = Harness::with_config(session, AuthorizationState::Authorized, config);
        h.controller.initialize();
        assert_eq!(h.state(), LifecycleState::Configuring);
        assert!(!h.controller.generation().configured);
        assert!(h.controller.session().inputs.is_empty());
    }

    #[test]
    fn start_refused_while_bracket_open() {
        let mut h = running_harness();
        h.controller.stop_session();
        h.controller.session_mut().begin_configuration();

        h.controller.start_session();
        assert_eq!(h.state(), LifecycleState::Starting);
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::SessionStartFailed)
        );
        assert_eq!(h.controller.session().starts_during_bracket, 0);
        assert_eq!(h.controller.session().start_calls, 1);

        // Deferred retry re-checks the bracket and escalates to a reset.
        h.run_for(Duration::from_millis(500));
        assert_eq!(h.controller.session().starts_during_bracket, 0);
        assert_eq!(h.controller.resets(), 1);

        h.controller.session_mut().commit_configuration();
        h.run_for(Duration::from_secs(2));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.session().starts_during_bracket, 0);
    }

    #[test]
    fn start_retried_once_then_reset() {
        let mut session = FakeSession::iphone();
        session.start_fails = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();
        h.run_for(Duration::from_millis(500));
        assert_eq!(h.controller.session().start_calls, 2);
        assert_eq!(h.controller.resets(), 0);

        h.run_for(Duration::from_millis(500));
        assert_eq!(h.controller.resets(), 1);
        assert_eq!(h.state(), LifecycleState::Resetting);
        // First occurrence heals silently.
        assert_eq!(h.controller.status().last_error, None);
    }

    #[test]
    fn recurring_start_failure_is_surfaced() {
        let mut session = FakeSession::iphone();
        session.start_fails = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();
        h.run_for(Duration::from_secs(3));
        assert!(h.controller.resets() >= 2);
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::SessionStartFailed)
        );
    }

    #[test]
    fn stalled_host_skips_immediate_retry() {
        let mut session = FakeSession::iphone();
        session.start_fails = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.set_probe(Arc::new(crate::session::test_support::StalledProbe));
        h.controller.initialize();
        h.run_for(Duration::from_millis(500));

        assert_eq!(h.controller.session().start_calls, 1);
        assert_eq!(h.state(), LifecycleState::Resetting);
        assert_eq!(
            h.controller.status().last_error,
            Some(CameraError::DeviceUnresponsive)
        );
        // The longer cooldown applies.
        h.run_for(Duration::from_secs(1));
        assert_eq!(h.state(), LifecycleState::Resetting);
        h.run_for(Duration::from_millis(4100));
        assert_eq!(h.state(), LifecycleState::Verifying);
        assert_eq!(h.controller.generation().number, 2);
    }

    #[test]
    fn running_without_frames_resets() {
        let mut h = Harness::authorized();
        h.controller.initialize();
        h.run_for(Duration::from_millis(500));
        assert_eq!(h.state(), LifecycleState::Verifying);
        h.run_for(Duration::from_secs(3));
        assert_eq!(h.controller.resets(), 1);
    }

    #[test]
    fn three_unhealthy_polls_trigger_exactly_one_reset() {
        let mut h = running_harness();
        let device = h.controller.session().devices[0].clone();
        device.set_contended(true);

        h.run_for(Duration::from_secs(2));
        h.run_for(Duration::from_secs(2));
        assert_eq!(h.controller.generation().consecutive_failures, 2);
        assert_eq!(h.controller.resets(), 0);

        h.run_for(Duration::from_secs(2));
        assert_eq!(h.controller.resets(), 1);
        assert_eq!(h.state(), LifecycleState::Resetting);
        assert_eq!(h.controller.generation().consecutive_failures, 0);
        assert_eq!(h.controller.status().last_error, Some(CameraError::DeviceLocked));
        assert!(h.controller.session().inputs.is_empty());
        assert!(!device.is_locked());
    }

    #[test]
    fn contention_clears_after_reset() {
        let mut h = running_harness();
        let device = h.controller.session().devices[0].clone();
        device.set_contended(true);
        h.run_for(Duration::from_secs(6));
        assert_eq!(h.controller.status().last_error, Some(CameraError::DeviceLocked));

        device.set_contended(false);
        h.run_for(Duration::from_millis(1600));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.status().last_error, None);
        assert_eq!(h.controller.generation().number, 2);
        assert_eq!(h.controller.session().inputs.len(), 1);
    }

    #[test]
    fn polling_stops_when_leaving_running() {
        let mut h = running_harness();
        let device = h.controller.session().devices[0].clone();
        let locks_before = device.lock_calls();
        h.controller.stop_session();
        h.run_for(Duration::from_secs(10));
        assert_eq!(device.lock_calls(), locks_before);
    }

    #[test]
    fn background_and_foreground_keep_single_input() {
        let mut h = running_harness();
        h.controller
            .handle(Command::Event(LifecycleEvent::DidEnterBackground));
        assert_eq!(h.state(), LifecycleState::Suspended);
        assert!(!h.controller.session().running);
        h.run_for(Duration::from_secs(10));
        assert_eq!(h.state(), LifecycleState::Suspended);

        h.controller
            .handle(Command::Event(LifecycleEvent::WillEnterForeground));
        h.run_for(Duration::from_millis(500));
        assert_eq!(h.state(), LifecycleState::Verifying);
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.session().max_inputs, 1);
        assert_eq!(h.controller.session().inputs_added, 1);
    }

    #[test]
    fn interruption_end_restarts_without_reset() {
        let mut h = running_harness();
        h.controller.handle(Command::Event(LifecycleEvent::SessionInterrupted(
            InterruptionReason::DeviceInUseByAnotherClient,
        )));
        h.controller.session_mut().running = false;
        assert!(matches!(h.state(), LifecycleState::Interrupted(_)));

        h.controller
            .handle(Command::Event(LifecycleEvent::InterruptionEnded));
        h.run_for(Duration::from_millis(500));
        assert_eq!(h.state(), LifecycleState::Verifying);
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.resets(), 0);
        assert_eq!(h.controller.session().begin_calls, 1);
    }

    #[test]
    fn restart_without_new_frames_resets() {
        let mut h = running_harness();
        h.controller.handle(Command::Event(LifecycleEvent::SessionInterrupted(
            InterruptionReason::DeviceInUseByAnotherClient,
        )));
        h.controller.session_mut().running = false;
        h.controller
            .handle(Command::Event(LifecycleEvent::InterruptionEnded));

        // Frames from before the interruption do not verify the restart.
        h.run_for(Duration::from_millis(600));
        assert_eq!(h.state(), LifecycleState::Verifying);
        assert_eq!(h.controller.resets(), 0);

        h.run_for(Duration::from_secs(3));
        assert_eq!(h.controller.resets(), 1);
        assert_eq!(h.state(), LifecycleState::Resetting);
    }

    #[test]
    fn frame_arrival_from_before_restart_is_ignored() {
        let mut h = running_harness();
        let generation = h.controller.generation().number;
        h.controller
            .handle(Command::Event(LifecycleEvent::DidEnterBackground));
        h.controller
            .handle(Command::Event(LifecycleEvent::WillEnterForeground));
        h.controller.handle(Command::FrameArrived { generation });
        assert_eq!(h.state(), LifecycleState::Verifying);
    }

    #[test]
    fn runtime_error_resets() {
        let mut h = running_harness();
        h.controller.handle(Command::Event(LifecycleEvent::RuntimeError(
            "media services were reset".into(),
        )));
        assert_eq!(h.state(), LifecycleState::Resetting);
        assert_eq!(h.controller.resets(), 1);
    }

    #[test]
    fn refresh_during_reset_is_coalesced() {
        let mut h = running_harness();
        h.controller.refresh();
        h.controller.refresh();
        assert_eq!(h.controller.resets(), 1);
        h.run_for(Duration::from_secs(2));
        h.deliver_frame();
        h.run_for(Duration::ZERO);
        assert_eq!(h.state(), LifecycleState::Running);
        assert_eq!(h.controller.resets(), 1);
    }

    #[test]
    fn refresh_during_configuration_is_deferred() {
        let mut session = FakeSession::iphone();
        session.reject_input = true;
        let mut h = Harness::new(session, AuthorizationState::Authorized);
        h.controller.initialize();
        h.controller.refresh();
        assert_eq!(h.controller.resets(), 0);
        assert!(h.sink.pending().contains(&Command::Refresh));
    }

    #[test]
    fn stale_frame_arrival_is_ignored() {
        let mut h = Harness::authorized();
        h.controller.initialize();
        h.controller.handle(Command::FrameArrived { generation: 99 });
        assert_eq!(h.state(), LifecycleState::Verifying);
    }

    #[test]
    fn preview_release_detaches() {
        let mut h = running_harness();
        let id = PreviewId::new();
        h.controller.attach_preview(id, CaptureOrientation::Portrait);
        assert!(h.controller.status().preview_attached);
        h.controller
            .handle(Command::Event(LifecycleEvent::PreviewReleased(id)));
        assert!(!h.controller.status().preview_attached);
        assert_eq!(h.controller.session().preview_connection_enabled(id), None);
        assert_eq!(h.state(), LifecycleState::Running);
    }

    #[test]
    fn preview_commands_keep_registry_current() {
        let mut h = running_harness();
        let registry = h.controller.preview_registry();
        let id = PreviewId::new();
        registry.insert(id);

        h.controller.handle(Command::AttachPreview {
            id,
            orientation: CaptureOrientation::Portrait,
        });
        assert_eq!(
            h.controller.session().preview_connection_enabled(id),
            Some(true)
        );

        h.controller.session_mut().disable_preview(id);
        h.run_for(Duration::from_millis(2100));
        assert_eq!(registry.connection_enabled(id), Some(false));

        h.controller.handle(Command::DetachPreview { id });
        assert_eq!(registry.connection_enabled(id), None);
        assert!(!h.controller.status().preview_attached);
        assert_eq!(h.controller.session().preview_connection_enabled(id), None);
    }
}
