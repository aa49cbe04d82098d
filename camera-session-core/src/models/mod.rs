pub mod authorization;
pub mod camera_models;
pub mod config;
pub mod error;
pub mod events;
pub mod health;
pub mod orientation;
pub mod state;
pub mod status;
