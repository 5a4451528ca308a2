use std::time::Duration;

use defines::{
    error::{errno, KResult},
    signal::{KSignalSet, Signal, SignalInfo},
};
use kernel_tracer::Level;
use signal::{Disposition, SigProcMaskHow};

use super::syscall;
use crate::{process, signal as engine};

fn parse_signal(signum: usize) -> KResult<Signal> {
    u8::try_from(signum)
        .ok()
        .and_then(Signal::from_user)
        .ok_or(errno::EINVAL)
}

/// 向 `pid` 指定的进程发送信号。`signum` 为 0 时只检查目标是否存在。
///
/// - `pid > 0`：发给该进程
/// - `pid == 0`：发给调用者所在进程组的所有进程
/// - `pid == -1`：发给调用者所在进程组中除组长外的所有进程，组长在这里扮演 init
/// - `pid < -1`：发给进程组 `-pid` 的所有进程
///
/// 找不到任何目标时返回 `ESRCH`
pub fn sys_kill(pid: isize, signum: usize) -> KResult<()> {
    syscall("kill", Level::Info, |curr| {
        let signal = if signum == 0 {
            None
        } else {
            Some(parse_signal(signum)?)
        };
        let targets = match pid {
            1.. => vec![process::get(pid as usize).ok_or(errno::ESRCH)?],
            0 => process::group(curr.pgid()),
            -1 => {
                let mut targets = process::group(curr.pgid());
                targets.retain(|target| !target.is_group_leader());
                targets
            }
            _ => process::group(pid.unsigned_abs()),
        };
        if targets.is_empty() {
            return Err(errno::ESRCH);
        }
        if let Some(signal) = signal {
            for target in &targets {
                engine::send_signal(target, SignalInfo::user(signal, curr.pid()));
            }
        }
        Ok(())
    })
}

/// 修改信号的处理方式，返回原来的。`new` 为 `None` 时只查询。
///
/// SIGKILL 和 SIGSTOP 的处理方式无法修改，这样的请求被静默忽略，返回 `Default`
pub fn sys_rt_sigaction(signum: usize, new: Option<Disposition>) -> KResult<Disposition> {
    syscall("rt_sigaction", Level::Debug, |process| {
        let signal = parse_signal(signum)?;
        if signal.is_uncatchable() && new.is_some() {
            debug!("disposition of {signal:?} can not be changed");
        }
        Ok(engine::change_disposition(process, signal, new))
    })
}

/// 修改信号掩码，返回原来的掩码。`set` 为 `None` 时只查询，此时 `how` 被忽略。
///
/// 因解除屏蔽而可以递送的信号会在返回前递送
pub fn sys_rt_sigprocmask(how: usize, set: Option<KSignalSet>) -> KResult<KSignalSet> {
    syscall("rt_sigprocmask", Level::Debug, |process| {
        let Some(set) = set else {
            return Ok(process.lock_inner_with(|inner| inner.signal_receiver.blocked()));
        };
        let how = SigProcMaskHow::from_user(how).ok_or(errno::EINVAL)?;
        Ok(engine::set_mask(process, how, set))
    })
}

/// 当前被屏蔽的待处理信号
pub fn sys_rt_sigpending() -> KResult<KSignalSet> {
    syscall("rt_sigpending", Level::Debug, |process| {
        Ok(engine::query_pending(process))
    })
}

/// 等待 `set` 中的信号并取出，返回它的信息，不运行处理函数。
///
/// 超时返回 `EAGAIN`；有超时时，等待期间递送了其他信号返回 `EINTR`
pub fn sys_rt_sigtimedwait(
    set: KSignalSet,
    timeout: Option<Duration>,
) -> KResult<SignalInfo> {
    syscall("rt_sigtimedwait", Level::Info, |process| {
        engine::wait_any(process, set, timeout)?.ok_or(errno::EAGAIN)
    })
}

/// 没有超时的 `sigtimedwait`，只返回信号本身。期间递送的其他信号不会打断它
pub fn sys_sigwait(set: KSignalSet) -> KResult<Signal> {
    sys_rt_sigtimedwait(set, None).map(|info| info.signal)
}

/// 临时将掩码替换为 `mask`，挂起直到有信号被递送
pub fn sys_rt_sigsuspend(mask: KSignalSet) -> KResult<()> {
    syscall("rt_sigsuspend", Level::Info, |process| {
        engine::suspend(process, mask)
    })
}
