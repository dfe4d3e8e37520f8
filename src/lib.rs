//! Terminal dashboard for tasks grouped by time horizon, backed by a REST
//! task service.

pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod logging;
pub mod models;
pub mod stats;
pub mod store;
pub mod timefmt;
pub mod ui;
