pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod location;
pub mod logging;
pub mod map;
pub mod models;
pub mod orchestrator;
pub mod ui;
