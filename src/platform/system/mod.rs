// OS-specific implementations of the metric sources.
// The Linux sources compile everywhere; elsewhere the preflight check fails at startup.

pub mod linux;
