pub mod monitor;

// A single screen: the display panel (three channel cards) above the
// measurement table, with live-update and interval controls underneath.

pub use monitor::{run_monitor_tui, MonitorState};
