//! curfew Core Library
//!
//! Core library for curfew - time-of-day process policies and scheduled shutdown.
//! Provides allowed-hours evaluation, process enumeration and killing,
//! category lookup, and the two long-running policies.

pub mod alert;
pub mod categories;
pub mod error;
pub mod executor;
pub mod mock;
pub mod monitor;
pub mod policy;
pub mod shutdown;
pub mod types;
pub mod window;

pub use alert::{alert_channel, AlertSender, DEFAULT_ALERT_CAPACITY};
pub use categories::{CategoryIndex, CategoryOperator, NoCategories};
pub use error::{Error, Result};
pub use executor::ProcessExecutor;
pub use monitor::{ProcessHandle, ProcessMonitor, SystemMonitor, SystemProcess};
pub use policy::{ProcessPolicy, ENFORCEMENT_INTERVAL};
pub use shutdown::{ShutdownInvoker, ShutdownPolicy, SystemShutdown, DEFAULT_ALERT_MINUTES};
pub use types::{AppPolicy, CategoryMap, EnforcementReport, ProcessInfo};
pub use window::{is_allowed_to_run, next_occurrence, parse_clock, Clock, TimeWindow};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
