// hostpulse library - Public API

// Re-export error types
pub mod error;
pub use error::{PulseError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod server;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use core::config::Config;
pub use core::system_monitor::{Broadcaster, MetricsSnapshot, Sources};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
