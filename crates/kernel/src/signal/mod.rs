//! 信号的产生与递送，以及建立在其上的等待原语。
//!
//! 进程的信号状态（处理方式表、掩码、待处理信号集）都在 `ProcessInner` 中，由进程锁保护。
//! 处理函数总是在目标进程自己的执行流中运行：其他进程产生的信号只会被记入待处理集合并唤醒目标，
//! 目标在下一个检查点（每个系统调用返回前）调用 [`check_signal`] 来递送。
//!
//! 默认行为为终止或停止的信号在产生时立即生效，目标在检查点发现后返回 `BREAK` 或阻塞直到继续

use std::time::{Duration, Instant};

use defines::{
    error::{errno, KResult},
    signal::{KSignalSet, Signal, SignalActionFlags, SignalInfo},
};
use event_listener::listener;
use signal::{DefaultHandler, Disposition, Generated, SigProcMaskHow, SignalAction, SignalExt};

use crate::{
    process::{exit_process, Process, ProcessStatus},
    time,
};

/// 向 `process` 产生一个信号。不会阻塞，也不会在当前执行流中运行目标的处理函数
pub fn send_signal(process: &Process, info: SignalInfo) {
    let signal = info.signal;
    if process.is_exited() {
        debug!("process {} has exited, {signal:?} is dropped", process.pid());
        return;
    }
    // 不论处理方式和掩码如何，SIGCONT 总会让停止的进程继续
    if signal == Signal::SIGCONT {
        process.continue_process();
    }
    let generated = process.lock_inner_with(|inner| {
        let disposition = inner.signal_handlers.action(signal);
        inner.signal_receiver.receive(info, disposition)
    });
    debug!(
        "{signal:?} from {} to process {}: {generated:?}",
        info.sender,
        process.pid()
    );
    if let Generated::DefaultAction(action) = generated {
        do_default_action(process, signal, action);
    }
    // 阻塞在 wait4 上的也需要被打断
    process.wake();
}

fn do_default_action(process: &Process, signal: Signal, action: DefaultHandler) {
    match action {
        // 不会生成 core 文件
        DefaultHandler::Terminate | DefaultHandler::CoreDump => {
            exit_process(process, ProcessStatus::killed(signal));
        }
        DefaultHandler::Stop => {
            process.stop_process(signal);
        }
        DefaultHandler::Ignore | DefaultHandler::Continue => {}
    }
}

/// 进程已退出则返回 `BREAK`；被停止则一直阻塞，直到继续或被杀死
fn wait_while_stopped(process: &Process) -> KResult<()> {
    loop {
        listener!(process.signal_event => listener);
        if process.is_exited() {
            return Err(errno::BREAK);
        }
        if !process.is_stopped() {
            return Ok(());
        }
        trace!("stopped, waiting for SIGCONT");
        process.block_on(listener, None);
    }
}

/// 返回用户态之前的检查点：按编号从小到大递送所有未被屏蔽的待处理信号，直到没有为止。
///
/// 有信号真正被递送（运行了处理函数，或执行了终止、停止等默认行为）时返回 `true`，被忽略的不算。
/// 进程已被终止时返回 `BREAK`
pub fn check_signal(process: &Process) -> KResult<bool> {
    let mut delivered = false;
    loop {
        wait_while_stopped(process)?;
        let next = process.lock_inner_with(|inner| {
            let signal = inner.signal_receiver.take_deliverable()?.signal;
            Some((signal, inner.signal_handlers.get(signal)))
        });
        let Some((signal, disposition)) = next else {
            return Ok(delivered);
        };
        debug!("handle signal {signal:?}");
        match disposition {
            Disposition::Ignore => trace!("{signal:?} is ignored"),
            Disposition::Default => {
                let action = signal.default_handler();
                do_default_action(process, signal, action);
                delivered |= !matches!(action, DefaultHandler::Ignore | DefaultHandler::Continue);
            }
            Disposition::Handler(action) => {
                deliver_handler(process, signal, &action)?;
                delivered = true;
            }
        }
    }
}

/// 在当前执行流中运行处理函数。
///
/// 运行期间额外屏蔽 `action.mask`，以及信号本身（除非指定了 `SA_NODEFER`）。
/// 不论处理函数如何返回，掩码都会恢复为之前的值。指定了 `SA_RESETHAND` 时，
/// 处理函数正常返回后处理方式恢复为默认
pub fn deliver_handler(process: &Process, signal: Signal, action: &SignalAction) -> KResult<()> {
    let saved = process.lock_inner_with(|inner| {
        inner
            .signal_receiver
            .apply(SigProcMaskHow::Block, action.blocked_during(signal))
    });
    let _restore = scopeguard::guard(saved, |saved| {
        process.lock_inner_with(|inner| inner.signal_receiver.restore_mask(saved));
    });

    trace!("enter handler of {signal:?}");
    action.handler.call(signal)?;
    trace!("leave handler of {signal:?}");

    if action.flags.contains(SignalActionFlags::SA_RESETHAND) {
        process.lock_inner_with(|inner| inner.signal_handlers.reset(signal));
    }
    Ok(())
}

/// 修改处理方式，返回原来的。`new` 为 `None` 时只查询
pub fn change_disposition(
    process: &Process,
    signal: Signal,
    new: Option<Disposition>,
) -> Disposition {
    process.lock_inner_with(|inner| match new {
        Some(new) => inner.signal_handlers.set(signal, new),
        None => inner.signal_handlers.get(signal),
    })
}

/// 修改掩码，返回原来的掩码。
///
/// 解除屏蔽后可能有待处理信号可以递送了，由调用者在返回前调用 [`check_signal`]
pub fn set_mask(process: &Process, how: SigProcMaskHow, set: KSignalSet) -> KSignalSet {
    process.lock_inner_with(|inner| inner.signal_receiver.apply(how, set))
}

/// 当前的待处理信号集
pub fn query_pending(process: &Process) -> KSignalSet {
    process.lock_inner_with(|inner| {
        // 未被屏蔽的待处理信号只会在递送途中短暂存在，这里视作它在查询之后才产生
        inner.signal_receiver.pending() & inner.signal_receiver.blocked()
    })
}

/// 等待 `set` 中的任一信号，取出并返回它的信息，不运行处理函数。超时返回 `None`，且不改变任何状态。
///
/// 等待期间 `set` 被临时屏蔽，这样其中的信号只会进入待处理集合；有多个时取编号最小的。
/// 等待期间若有其他信号需要递送：有超时的等待返回 `EINTR`；没有超时的等待就地递送它，然后继续等待
pub fn wait_any(
    process: &Process,
    set: KSignalSet,
    timeout: Option<Duration>,
) -> KResult<Option<SignalInfo>> {
    let set = set - KSignalSet::UNCATCHABLE;
    let deadline = timeout.and_then(time::deadline_after);
    let saved = set_mask(process, SigProcMaskHow::Block, set);
    let _restore = scopeguard::guard(saved, |saved| {
        process.lock_inner_with(|inner| inner.signal_receiver.restore_mask(saved));
    });

    loop {
        wait_while_stopped(process)?;
        listener!(process.signal_event => listener);
        let (taken, interrupted) = process.lock_inner_with(|inner| {
            let taken = inner.signal_receiver.take_pending_in(set);
            (taken, inner.signal_receiver.has_deliverable())
        });
        if let Some(info) = taken {
            debug!("got {:?} from {}", info.signal, info.sender);
            return Ok(Some(info));
        }
        if interrupted {
            if timeout.is_some() {
                return Err(errno::EINTR);
            }
            check_signal(process)?;
            continue;
        }
        // 被终止或停止，交给循环开头处理
        if process.is_exited() || process.is_stopped() {
            continue;
        }
        if !block_until(process, listener, deadline) {
            return Ok(None);
        }
    }
}

/// 原子地将掩码替换为 `temp_mask` 并挂起，直到有信号被递送，然后恢复原来的掩码。
///
/// 被忽略的信号不会让它返回。挂起期间被停止后又被继续也算作一次递送。
/// 处理函数在挂起期间运行，返回时掩码已经恢复，此后因恢复而解除屏蔽的信号由调用者的检查点递送
pub fn suspend(process: &Process, temp_mask: KSignalSet) -> KResult<()> {
    let saved = process.lock_inner_with(|inner| {
        inner.continued = false;
        inner.signal_receiver.replace_mask(temp_mask)
    });
    let _restore = scopeguard::guard(saved, |saved| {
        process.lock_inner_with(|inner| inner.signal_receiver.restore_mask(saved));
    });

    loop {
        listener!(process.signal_event => listener);
        let delivered = check_signal(process)?;
        if delivered || process.lock_inner_with(|inner| core::mem::take(&mut inner.continued)) {
            return Ok(());
        }
        process.block_on(listener, None);
    }
}

/// 睡眠 `duration`。期间有信号被递送则提前返回 `EINTR`
pub fn sleep(process: &Process, duration: Duration) -> KResult<()> {
    let deadline = time::deadline_after(duration);
    loop {
        listener!(process.signal_event => listener);
        if check_signal(process)? {
            return Err(errno::EINTR);
        }
        if !block_until(process, listener, deadline) {
            return Ok(());
        }
    }
}

/// 到达 deadline 返回 `false`
fn block_until(
    process: &Process,
    listener: impl event_listener::Listener,
    deadline: Option<Instant>,
) -> bool {
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        return false;
    }
    process.block_on(listener, deadline)
}
