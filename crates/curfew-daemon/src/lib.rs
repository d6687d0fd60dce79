//! curfew Daemon
//!
//! System daemon for curfew - kills apps outside their allowed hours and
//! shuts the machine down at a configured time.

pub mod config;
pub mod daemon;
pub mod notifier;

pub use config::Config;
pub use daemon::Daemon;
pub use notifier::Notifier;
