//! Scripted walk through the camera lifecycle on the simulated backend.
//!
//! Usage: `overlay-demo [settings.json]`
//!
//! Run with `RUST_LOG=debug` to watch every state transition.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;

use camera_session_core::traits::collaborators::{ImagePicker, SettingsStore};
use camera_session_core::{
    AuthorizationState, CameraError, CameraService, CaptureDelegate, DeviceOrientation, InterruptionReason,
    JsonSettingsStore, LifecycleEvent, LifecycleState, SessionConfiguration,
};
use camera_session_sim::{FixedImagePicker, PromptAnswer, SimAuthorizer, SimHostSurface, SimMainThread, SimSession};

/// Delegate that prints every notification as a JSON line, the way a UI
/// bridge would forward them to a web view.
struct EventPrinter;

impl CaptureDelegate for EventPrinter {
    fn on_state_changed(&self, state: &LifecycleState) {
        println!("{}", json!({ "event": "state-changed", "state": state }));
    }

    fn on_error(&self, error: &CameraError) {
        println!(
            "{}",
            json!({ "event": "error", "message": error.to_string(), "hint": error.recovery_hint() })
        );
    }

    fn on_error_cleared(&self) {
        println!("{}", json!({ "event": "error-cleared" }));
    }

    fn on_running_changed(&self, is_running: bool) {
        println!("{}", json!({ "event": "running-changed", "running": is_running }));
    }

    fn on_authorization_changed(&self, is_authorized: bool) {
        println!("{}", json!({ "event": "authorization-changed", "authorized": is_authorized }));
    }
}

fn step(title: &str) {
    println!("\n== {} ==", title);
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("overlay demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CameraError> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("overlay-demo-settings.json"));

    let session = SimSession::phone();
    let authorizer = Arc::new(
        SimAuthorizer::new(AuthorizationState::NotDetermined, PromptAnswer::Grant)
            .with_delay(Duration::from_millis(300)),
    );
    let main_thread = Arc::new(SimMainThread::spawn()?);
    let config = SessionConfiguration {
        health_interval: Duration::from_millis(500),
        frame_stale_after: Duration::from_secs(1),
        reset_cooldown: Duration::from_millis(300),
        ..SessionConfiguration::default()
    };

    let service = CameraService::with_dispatcher(session.clone(), authorizer, main_thread.clone(), config)?;
    service.set_delegate(Arc::new(EventPrinter));
    let notifier = service.lifecycle_notifier();

    step("initialize");
    service.initialize();
    thread::sleep(Duration::from_secs(2));

    let host = SimHostSurface::new(390.0, 844.0);
    let surface = service.bind_preview_surface(&host);
    println!("preview {} bound at {:?}", surface.id(), surface.frame());

    step("overlay image");
    let store = JsonSettingsStore::new(&settings_path);
    let image_path = std::env::temp_dir().join("overlay-demo-reference.png");
    std::fs::write(&image_path, b"demo").map_err(|e| CameraError::Storage(e.to_string()))?;
    if let Some(image) = FixedImagePicker::new(&image_path, 1024, 768).pick()? {
        let settings = store.load()?.with_image(&image);
        store.save(&settings)?;
        println!("overlay settings saved to {}", store.path().display());
    }

    step("rotate to landscape");
    host.rotate(DeviceOrientation::LandscapeLeft);
    let surface = service.recreate_preview_surface(&host);
    println!("preview {} rebuilt with {:?}", surface.id(), surface.orientation());

    step("another app grabs the camera");
    if let Some(camera) = session.active_camera() {
        camera.set_contended(true);
        thread::sleep(Duration::from_secs(2));
        camera.set_contended(false);
    }
    thread::sleep(Duration::from_secs(2));

    step("background and foreground");
    notifier.notify(LifecycleEvent::DidEnterBackground);
    thread::sleep(Duration::from_millis(500));
    notifier.notify(LifecycleEvent::WillEnterForeground);
    thread::sleep(Duration::from_secs(1));

    step("interruption");
    session.simulate_interruption();
    notifier.notify(LifecycleEvent::SessionInterrupted(
        InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps,
    ));
    thread::sleep(Duration::from_millis(500));
    notifier.notify(LifecycleEvent::InterruptionEnded);
    thread::sleep(Duration::from_secs(1));

    step("refresh");
    service.refresh();
    thread::sleep(Duration::from_secs(2));

    step("status");
    println!("{}", service.status_description());
    let report = serde_json::to_string_pretty(&service.status_report())
        .map_err(|e| CameraError::Internal(e.to_string()))?;
    println!("{}", report);

    service.release_preview_surface(&host);
    service.stop_session();
    thread::sleep(Duration::from_millis(200));
    Ok(())
}
