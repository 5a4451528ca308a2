//! 执行流与进程的对应关系。每个进程独占一个宿主机线程，当前进程记录在线程局部变量中

use std::{cell::RefCell, sync::Arc};

use defines::error::{errno, KResult};

use crate::process::Process;

std::thread_local! {
    static CURRENT: RefCell<Option<Arc<Process>>> = const { RefCell::new(None) };
}

/// 当前执行流所属的进程。不在任何进程中时返回 `ESRCH`
pub fn curr_process() -> KResult<Arc<Process>> {
    CURRENT.with_borrow(|current| current.clone().ok_or(errno::ESRCH))
}

pub(crate) fn set_curr_process(process: Arc<Process>) {
    CURRENT.set(Some(process));
}

pub(crate) fn take_curr_process() -> Option<Arc<Process>> {
    CURRENT.take()
}
