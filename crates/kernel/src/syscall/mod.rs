//! 系统调用。每个函数都作用于当前执行流所属的进程。
//!
//! 返回之前会调用 [`check_signal`]，相当于返回用户态前的信号处理。
//! 进程在此期间被终止的话，返回 `BREAK`，调用者应当用 `?` 一路向上返回

mod misc;
mod process;
mod resource;
mod signal;
mod time;

use std::{fmt::Debug, sync::Arc};

use defines::error::{errno, Error, KResult};
use kernel_tracer::Level;

pub use self::{misc::*, process::*, resource::*, signal::*, time::*};
use crate::{context, process::Process, signal::check_signal};

fn syscall<T: Debug>(
    name: &'static str,
    level: Level,
    f: impl FnOnce(&Arc<Process>) -> KResult<T>,
) -> KResult<T> {
    let process = context::curr_process()?;
    let ret = {
        let _enter = span!(level, "syscall", name = name).entered();
        let ret = f(&process);
        match &ret {
            Ok(ret) => log!(level, "return {ret:?}"),
            Err(err) if is_expected(name, *err) => {
                debug!("return {err:?}, {}", errno::error_info(err.as_isize()));
            }
            Err(err) => warn!("return {err:?}, {}", errno::error_info(err.as_isize())),
        }
        ret
    };
    check_signal(&process)?;
    ret
}

/// 这些错误是正常流程的一部分，不需要警告
fn is_expected(name: &str, err: Error) -> bool {
    err == errno::BREAK
        || name == "wait4" && (err == errno::EAGAIN || err == errno::ECHILD)
        || name == "rt_sigtimedwait" && err == errno::EAGAIN
        || (name == "nanosleep" || name == "rt_sigtimedwait") && err == errno::EINTR
}
