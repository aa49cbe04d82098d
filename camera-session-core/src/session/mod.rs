pub mod command;
pub mod configurator;
pub mod controller;
pub mod generation;
pub mod guards;
pub mod health_monitor;
pub mod permission_gate;
pub mod preview_binder;
pub mod queue;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
