// Linux implementations backed by procfs, sysfs and a few standard utilities

mod host;
mod network;
pub mod processes;
pub mod procfs;

pub use host::LinuxHost;
pub use network::{InternetProbe, LinuxRouting};
pub use processes::PsProcessTable;
