pub mod authorizer;
pub mod capture_delegate;
pub mod capture_device;
pub mod capture_session;
pub mod collaborators;
pub mod dispatch;
pub mod host_surface;
