use std::{collections::BTreeMap, sync::Arc};

use klocks::SpinMutex;

use super::Process;

/// 全局进程表。僵尸进程在被回收之前仍在表中
pub static PROCESS_MANAGER: ProcessManager = ProcessManager::new();

pub struct ProcessManager(SpinMutex<BTreeMap<usize, Arc<Process>>>);

impl ProcessManager {
    pub const fn new() -> Self {
        Self(SpinMutex::new(BTreeMap::new()))
    }

    pub fn add(&self, pid: usize, process: Arc<Process>) {
        self.0.lock().insert(pid, process);
    }

    pub fn remove(&self, pid: usize) -> Option<Arc<Process>> {
        self.0.lock().remove(&pid)
    }

    pub fn get(&self, pid: usize) -> Option<Arc<Process>> {
        self.0.lock().get(&pid).cloned()
    }

    /// 进程组 `pgid` 中尚未成为僵尸的进程
    pub fn group(&self, pgid: usize) -> Vec<Arc<Process>> {
        self.0
            .lock()
            .values()
            .filter(|process| process.pgid() == pgid && !process.is_zombie())
            .cloned()
            .collect()
    }

    /// 尚未成为僵尸的进程数量
    pub fn live_count(&self) -> usize {
        self.0
            .lock()
            .values()
            .filter(|process| !process.is_zombie())
            .count()
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get(pid: usize) -> Option<Arc<Process>> {
    PROCESS_MANAGER.get(pid)
}

pub fn group(pgid: usize) -> Vec<Arc<Process>> {
    PROCESS_MANAGER.group(pgid)
}

pub fn live_count() -> usize {
    PROCESS_MANAGER.live_count()
}
