use std::time::Duration;

use defines::error::KResult;
use kernel_tracer::Level;

use super::syscall;
use crate::signal;

/// 睡眠 `duration`。睡眠期间有信号被递送的话提前返回 `EINTR`
pub fn sys_nanosleep(duration: Duration) -> KResult<()> {
    syscall("nanosleep", Level::Debug, |process| {
        signal::sleep(process, duration)
    })
}
