use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named target (process name or category name) with its allowed hours
///
/// `allowed_from` / `allowed_to` are `HH:MM` wall-clock strings. They are
/// kept unparsed so that a malformed value fails closed at evaluation time
/// instead of rejecting the whole policy set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPolicy {
    pub name: String,
    pub allowed_from: String,
    pub allowed_to: String,
}

impl AppPolicy {
    pub fn new(
        name: impl Into<String>,
        allowed_from: impl Into<String>,
        allowed_to: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            allowed_from: allowed_from.into(),
            allowed_to: allowed_to.into(),
        }
    }

    /// Does this policy target the process, either by name or by one of its categories?
    pub fn governs(&self, process_name: &str, categories: &[String]) -> bool {
        self.name == process_name || categories.iter().any(|c| *c == self.name)
    }
}

/// Category name -> process names, as configured
pub type CategoryMap = BTreeMap<String, Vec<String>>;

/// Identity of a live process, valid for a single enforcement tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: u32,
}

impl ProcessInfo {
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

/// Outcome of one enforcement pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementReport {
    pub inspected: usize,
    /// Processes running outside their allowed hours
    pub blocked: usize,
    pub killed: usize,
    pub kill_failures: usize,
    pub info_failures: usize,
}

impl EnforcementReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kill(&mut self) {
        self.killed += 1;
    }

    pub fn record_kill_failure(&mut self) {
        self.kill_failures += 1;
    }
}
