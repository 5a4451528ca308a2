use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
    thread::{self, JoinHandle},
};

use atomic::Ordering;
use defines::{
    error::{errno, KResult},
    signal::{Signal, SignalInfo},
};

use super::{exit_process, Process, ProcessStatus, PROCESS_MANAGER};
use crate::{context, signal::send_signal, time};

/// 为进程创建执行流，在其中运行 `main`。
///
/// `main` 返回 `Ok(code)` 视为以 `code` 退出；返回 `BREAK` 说明进程已被标记退出（被信号杀死或调用了 exit）；
/// 返回其他错误视为以对应的 errno 退出；panic 视为被 SIGABRT 杀死
pub(crate) fn spawn_user_process(
    process: Arc<Process>,
    main: impl FnOnce() -> KResult<i32> + Send + 'static,
) -> KResult<JoinHandle<()>> {
    let pid = process.pid();
    let process2 = Arc::clone(&process);
    thread::Builder::new()
        .name(format!("{}-{pid}", process.name()))
        .spawn(move || {
            let _enter = info_span!("process", pid = pid).entered();
            context::set_curr_process(Arc::clone(&process));
            let wstatus = match panic::catch_unwind(AssertUnwindSafe(main)) {
                Ok(Ok(code)) => Some(ProcessStatus::exit_code(code)),
                Ok(Err(err)) if err == errno::BREAK => None,
                Ok(Err(err)) => {
                    warn!("main returns {err:?}, {err}");
                    Some(ProcessStatus::exit_code(err.errno()))
                }
                Err(_) => {
                    error!("process panicked");
                    Some(ProcessStatus::killed(Signal::SIGABRT))
                }
            };
            if let Some(wstatus) = wstatus {
                exit_process(&process, wstatus);
            }
            become_zombie(&process);
            context::take_curr_process();
        })
        .map_err(|e| {
            warn!("failed to spawn thread for process {pid}: {e}");
            exit_process(&process2, ProcessStatus::killed(Signal::SIGKILL));
            become_zombie(&process2);
            errno::EAGAIN
        })
}

/// 执行流结束后，进程成为僵尸，通知父进程来回收。
///
/// 没有父进程的僵尸没有人回收，直接移出进程表
fn become_zombie(process: &Arc<Process>) {
    // 子进程成为孤儿，之后由它们自己清理
    let children = process.lock_inner_with(|inner| core::mem::take(&mut inner.children));
    for child in children {
        let zombie = child.lock_inner_with(|inner| {
            inner.parent = None;
            child.is_zombie()
        });
        if zombie {
            PROCESS_MANAGER.remove(child.pid());
        }
    }

    let wstatus = process.status().wstatus();
    let parent = process.lock_inner_with(|inner| {
        process
            .status
            .store(ProcessStatus::zombie(wstatus), Ordering::SeqCst);
        inner.parent.as_ref().and_then(Weak::upgrade)
    });
    debug!("process {} becomes zombie", process.pid());
    match parent {
        Some(parent) => {
            send_signal(&parent, SignalInfo::kernel(Signal::SIGCHLD));
            parent.wait4_event.notify(usize::MAX);
        }
        None => {
            PROCESS_MANAGER.remove(process.pid());
        }
    }
}

/// 以 `main` 为入口启动一个没有父进程的进程，等待它结束，返回它的 wstatus。
///
/// 用于从进程之外（比如测试）启动整个模拟
pub fn run_user(
    name: &str,
    main: impl FnOnce() -> KResult<i32> + Send + 'static,
) -> KResult<i32> {
    time::init();
    let process = Process::new_root(name)?;
    let handle = spawn_user_process(Arc::clone(&process), main)?;
    if handle.join().is_err() {
        error!("process {} panicked while exiting", process.pid());
    }
    Ok(i32::from(process.status().wstatus()))
}
