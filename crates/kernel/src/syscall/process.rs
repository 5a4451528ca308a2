use std::convert::Infallible;

use defines::{
    error::{errno, KResult},
    misc::WaitFlags,
};
use event_listener::listener;
use kernel_tracer::Level;

use super::syscall;
use crate::process::{exit_process, spawn_user_process, ProcessStatus, PROCESS_MANAGER};

/// 创建子进程，在新的执行流中运行 `child_main`，返回子进程的 pid
pub fn sys_fork(child_main: impl FnOnce() -> KResult<i32> + Send + 'static) -> KResult<usize> {
    syscall("fork", Level::Info, |process| {
        let child = process.fork()?;
        let pid = child.pid();
        spawn_user_process(child, child_main)?;
        Ok(pid)
    })
}

/// 退出当前进程，总是返回 `BREAK`
pub fn sys_exit(exit_code: i32) -> KResult<Infallible> {
    syscall("exit", Level::Trace, |process| {
        exit_process(process, ProcessStatus::exit_code(exit_code));
        Err(errno::BREAK)
    })
}

/// 等待子进程成为僵尸并回收它，返回 `(pid, wstatus)`。
///
/// `pid` 为 -1 时等待任意子进程。指定了 `WNOHANG` 且没有可回收的子进程时返回 `(0, 0)`
pub fn sys_wait4(pid: isize, options: u32) -> KResult<(usize, i32)> {
    syscall("wait4", Level::Debug, |process| {
        if pid != -1 && pid <= 0 {
            error!("waiting for process group {pid} is not supported");
            return Err(errno::EINVAL);
        }
        let options = WaitFlags::from_bits(options).ok_or(errno::EINVAL)?;
        if options.intersects(WaitFlags::WUNTRACED | WaitFlags::WCONTINUED) {
            error!("暂时仅支持 WNOHANG");
            return Err(errno::UNSUPPORTED);
        }

        // 尝试找到一个符合条件，且已经是僵尸的子进程
        loop {
            listener!(process.wait4_event => listener);
            if let Some(child) = process.lock_inner_with(|inner| inner.reap_child(pid))? {
                PROCESS_MANAGER.remove(child.pid());
                return Ok((child.pid(), i32::from(child.status().wstatus())));
            }
            // 否则视 `options` 而定
            if options.contains(WaitFlags::WNOHANG) {
                return Ok((0, 0));
            }
            if process.is_exited() {
                return Err(errno::BREAK);
            }
            // 等待期间有信号需要递送，被打断
            if process.lock_inner_with(|inner| inner.signal_receiver.has_deliverable()) {
                return Err(errno::EINTR);
            }
            trace!("no proper child exited");
            process.block_on(listener, None);
        }
    })
}

pub fn sys_getpid() -> KResult<usize> {
    syscall("getpid", Level::Trace, |process| Ok(process.pid()))
}

/// 父进程的 pid，没有父进程时为 0
pub fn sys_getppid() -> KResult<usize> {
    syscall("getppid", Level::Trace, |process| {
        Ok(process.parent().map_or(0, |parent| parent.pid()))
    })
}

/// 让出执行流，同时也是一个检查点
pub fn sys_sched_yield() -> KResult<()> {
    syscall("sched_yield", Level::Trace, |_| {
        std::thread::yield_now();
        Ok(())
    })
}

