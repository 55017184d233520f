//! Spreadsheet quality profiling and script encoding utilities.
//!
//! The profiling core lives in [`services::excel`]: it turns a sheet grid into
//! per-column profiles, statistics and a 0-100 quality score. The binary wraps
//! it in a CLI, an HTTP endpoint and a pair of BOM tools.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }
}
