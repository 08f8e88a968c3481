mod presenter;
mod routes;
mod server;
mod telemetry;
mod ui;
mod upload;

pub mod app;
pub mod config;

pub use app::start_app;
