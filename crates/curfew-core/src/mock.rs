//! Mock collaborators for unit/integration testing

use crate::{
    monitor::{ProcessHandle, ProcessMonitor},
    shutdown::ShutdownInvoker,
    types::ProcessInfo,
    Error, Result,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Mock process with shared kill counters
///
/// Clones share their counters, so a test can keep one copy while the
/// monitor hands out others.
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub name: String,
    pub pid: u32,
    pub fail_info: bool,
    pub fail_kill: bool,
    kills: Arc<AtomicUsize>,
    kill_attempts: Arc<AtomicUsize>,
}

impl MockProcess {
    pub fn new(name: &str, pid: u32) -> Self {
        Self {
            name: name.to_string(),
            pid,
            fail_info: false,
            fail_kill: false,
            kills: Arc::new(AtomicUsize::new(0)),
            kill_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_info(mut self) -> Self {
        self.fail_info = true;
        self
    }

    pub fn failing_kill(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    /// Successful kills
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    /// Kills attempted, successful or not
    pub fn kill_attempts(&self) -> usize {
        self.kill_attempts.load(Ordering::SeqCst)
    }
}

impl ProcessHandle for MockProcess {
    fn info(&self) -> Result<ProcessInfo> {
        if self.fail_info {
            return Err(Error::Process(format!("Mock info failure for {}", self.pid)));
        }
        Ok(ProcessInfo::new(self.name.clone(), self.pid))
    }

    fn kill(&self) -> Result<()> {
        self.kill_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_kill {
            return Err(Error::Process(format!("Mock kill failure for {}", self.pid)));
        }
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock monitor returning a fixed process list
#[derive(Debug, Default)]
pub struct MockMonitor {
    processes: Mutex<Vec<MockProcess>>,
    fail: AtomicBool,
    enumerations: AtomicUsize,
}

impl MockMonitor {
    pub fn new(processes: Vec<MockProcess>) -> Self {
        Self {
            processes: Mutex::new(processes),
            fail: AtomicBool::new(false),
            enumerations: AtomicUsize::new(0),
        }
    }

    /// Configure enumeration to fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_processes(&self, processes: Vec<MockProcess>) {
        *self.processes.lock().unwrap_or_else(PoisonError::into_inner) = processes;
    }

    /// Number of enumeration calls, failed ones included
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl ProcessMonitor for MockMonitor {
    fn running_processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Monitor("Mock enumeration failure".into()));
        }

        Ok(self
            .processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .map(|p| Box::new(p) as Box<dyn ProcessHandle>)
            .collect())
    }
}

/// Mock shutdown invoker counting calls
#[derive(Debug, Default)]
pub struct MockShutdown {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShutdownInvoker for MockShutdown {
    fn shutdown(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Shutdown("shutdown failed".into()));
        }
        Ok(())
    }
}
