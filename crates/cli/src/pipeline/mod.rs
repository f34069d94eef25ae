//! Pipeline orchestration module.

mod orchestrator;
mod signals;
mod stats;

pub use orchestrator::Forwarder;
pub use signals::spawn_signal_listener;
pub use stats::print_run_report;
