#![allow(dead_code)]

use std::{
    thread,
    time::{Duration, Instant},
};

use kernel::process::{self, ThreadStatus};

/// 轮询直到进程 `pid` 阻塞在某个事件上
pub fn wait_blocking(pid: usize) {
    wait_until(|| {
        process::get(pid).is_some_and(|process| process.thread_status() == ThreadStatus::Blocking)
    });
}

/// 轮询直到 `cond` 成立，超过 5 秒视为失败
pub fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}
