//! # camera-session-sim
//!
//! Software camera backend for camera-session-core.
//!
//! Provides:
//! - `SimSession` — Capture graph with a frame pump thread and fault injection
//! - `SimCamera` — Camera device with switchable connection, video and lock contention
//! - `SimAuthorizer` — One-shot permission prompt with a scripted answer
//! - `SimMainThread` — UI main thread stand-in that can be stalled
//! - `SimHostSurface` / `FixedImagePicker` — Preview host view and image picker
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use camera_session_core::{CameraService, SessionConfiguration};
//! use camera_session_sim::{SimAuthorizer, SimSession};
//!
//! let session = SimSession::phone();
//! let service = CameraService::new(
//!     session.clone(),
//!     Arc::new(SimAuthorizer::authorized()),
//!     SessionConfiguration::default(),
//! )
//! .unwrap();
//! service.initialize();
//! ```

pub mod authorizer;
pub mod catalog;
pub mod error;
pub mod frame_pump;
pub mod host;
pub mod main_thread;
pub mod picker;
pub mod sim_device;
pub mod sim_session;

pub use authorizer::{PromptAnswer, SimAuthorizer};
pub use error::SimError;
pub use host::SimHostSurface;
pub use main_thread::SimMainThread;
pub use picker::FixedImagePicker;
pub use sim_device::SimCamera;
pub use sim_session::{SimCounters, SimFaults, SimSession};
