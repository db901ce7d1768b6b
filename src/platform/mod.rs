// Platform-specific code module

pub mod command;
pub mod signals;
pub mod system;

// Re-exports for cleaner imports
pub use command::run_command;
pub use signals::OsSignals;
