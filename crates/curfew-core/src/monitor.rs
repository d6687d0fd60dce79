//! Process enumeration
//!
//! The policies only see the `ProcessMonitor` / `ProcessHandle` traits;
//! `SystemMonitor` is the `sysinfo`-backed implementation used by the daemon.

use crate::{executor::ProcessExecutor, types::ProcessInfo, Error, Result};
use std::sync::Mutex;
use sysinfo::System;
use tracing::debug;

/// A live process as seen during one tick
pub trait ProcessHandle: Send {
    fn info(&self) -> Result<ProcessInfo>;

    fn kill(&self) -> Result<()>;
}

/// Source of running processes
pub trait ProcessMonitor: Send + Sync {
    /// Snapshot of running processes, in enumeration order
    fn running_processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>>;
}

/// Process captured from the system process table
#[derive(Debug, Clone)]
pub struct SystemProcess {
    pid: u32,
    name: String,
}

impl SystemProcess {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

impl ProcessHandle for SystemProcess {
    fn info(&self) -> Result<ProcessInfo> {
        if self.name.is_empty() {
            return Err(Error::Process(format!(
                "Process {} has no readable name",
                self.pid
            )));
        }
        Ok(ProcessInfo::new(self.name.clone(), self.pid))
    }

    fn kill(&self) -> Result<()> {
        ProcessExecutor::kill_process(self.pid)
    }
}

/// Monitor backed by `sysinfo`
///
/// The `System` is reused between ticks; only the process table is refreshed.
pub struct SystemMonitor {
    system: Mutex<System>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMonitor for SystemMonitor {
    fn running_processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>> {
        let mut system = self
            .system
            .lock()
            .map_err(|e| Error::Monitor(format!("Process table lock poisoned: {}", e)))?;

        system.refresh_processes();

        let mut processes: Vec<SystemProcess> = system
            .processes()
            .iter()
            .map(|(pid, process)| SystemProcess::new(pid.as_u32(), process.name()))
            .collect();
        processes.sort_by_key(|p| p.pid);

        debug!("Enumerated {} processes", processes.len());

        Ok(processes
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn ProcessHandle>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_process_info() {
        let process = SystemProcess::new(1234, "Notepad");
        let info = process.info().unwrap();

        assert_eq!(info.name, "Notepad");
        assert_eq!(info.pid, 1234);
    }

    #[test]
    fn test_system_process_without_name() {
        let process = SystemProcess::new(77, "");
        let result = process.info();

        assert!(result.is_err());
        assert!(format!("{}", result.unwrap_err()).contains("77"));
    }

    #[test]
    fn test_system_monitor_lists_current_process() {
        let monitor = SystemMonitor::new();
        let processes = monitor.running_processes().expect("Failed to enumerate");
        let own_pid = std::process::id();

        let pids: Vec<u32> = processes
            .iter()
            .filter_map(|p| p.info().ok())
            .map(|info| info.pid)
            .collect();

        assert!(pids.contains(&own_pid));
        assert!(pids.windows(2).all(|w| w[0] <= w[1]));
    }
}
