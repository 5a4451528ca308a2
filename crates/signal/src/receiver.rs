use defines::{
    config::STD_SIGNAL_NUM,
    signal::{KSignalSet, Signal, SignalInfo},
};

use crate::{handlers::SignalExt, DefaultHandler, Disposition, SigProcMaskHow};

/// 信号产生后，根据处理方式和掩码做出的决定
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generated {
    /// 被忽略，直接丢弃。原有的待处理状态不受影响
    Discarded,
    /// 被屏蔽，记入待处理集合，解除屏蔽后才会递送
    Queued,
    /// 未被屏蔽且有处理函数，已记入待处理集合，进程在下一个检查点执行处理函数
    HandlerReady,
    /// 需要立即执行的默认行为（终止或停止）。SIGKILL 和 SIGSTOP 总是落到这里
    DefaultAction(DefaultHandler),
}

/// 进程的信号掩码和待处理信号集
///
/// 这里只维护集合本身，不关心谁来执行处理函数
#[derive(Clone, Debug, Default)]
pub struct SignalReceiver {
    blocked: KSignalSet,
    pending: KSignalSet,
    /// 待处理信号的附加信息，以 `Signal::index` 为下标
    infos: [Option<SignalInfo>; STD_SIGNAL_NUM],
}

impl SignalReceiver {
    #[inline]
    pub const fn new() -> Self {
        Self {
            blocked: KSignalSet::empty(),
            pending: KSignalSet::empty(),
            infos: [None; STD_SIGNAL_NUM],
        }
    }

    /// fork 时子进程继承掩码，但待处理信号集为空
    pub fn fork(&self) -> Self {
        Self {
            blocked: self.blocked,
            ..Self::new()
        }
    }

    pub fn blocked(&self) -> KSignalSet {
        self.blocked
    }

    /// 原始的待处理信号集，可能含有未被屏蔽、正等待递送的信号
    pub fn pending(&self) -> KSignalSet {
        self.pending
    }

    /// 产生一个信号，决定它的去向。
    ///
    /// 同一个信号在待处理集合中至多出现一次，重复产生会被合并，保留第一次的附加信息
    pub fn receive(&mut self, info: SignalInfo, disposition: &Disposition) -> Generated {
        let signal = info.signal;
        if signal.is_uncatchable() {
            return Generated::DefaultAction(signal.default_handler());
        }
        match disposition {
            Disposition::Ignore => Generated::Discarded,
            _ if self.blocked.contains_signal(signal) => {
                self.push(info);
                Generated::Queued
            }
            Disposition::Default => match signal.default_handler() {
                // SIGCONT 的继续动作由调用者在此之前完成
                DefaultHandler::Ignore | DefaultHandler::Continue => Generated::Discarded,
                action => Generated::DefaultAction(action),
            },
            Disposition::Handler(_) => {
                self.push(info);
                Generated::HandlerReady
            }
        }
    }

    fn push(&mut self, info: SignalInfo) {
        if !self.pending.contains_signal(info.signal) {
            self.pending |= KSignalSet::from(info.signal);
            self.infos[info.signal.index()] = Some(info);
        }
    }

    fn take(&mut self, signal: Signal) -> SignalInfo {
        self.pending.remove(KSignalSet::from(signal));
        self.infos[signal.index()]
            .take()
            .unwrap_or(SignalInfo::kernel(signal))
    }

    /// 是否有未被屏蔽的待处理信号
    pub fn has_deliverable(&self) -> bool {
        !(self.pending - self.blocked).is_empty()
    }

    /// 取出编号最小的、未被屏蔽的待处理信号
    pub fn take_deliverable(&mut self) -> Option<SignalInfo> {
        let signal = (self.pending - self.blocked).first()?;
        Some(self.take(signal))
    }

    /// 取出 `set` 中编号最小的待处理信号，不论是否被屏蔽
    pub fn take_pending_in(&mut self, set: KSignalSet) -> Option<SignalInfo> {
        let signal = (self.pending & set).first()?;
        Some(self.take(signal))
    }

    /// `sigprocmask` 的语义，返回原来的掩码。SIGKILL 和 SIGSTOP 不会被屏蔽
    pub fn apply(&mut self, how: SigProcMaskHow, set: KSignalSet) -> KSignalSet {
        let old = self.blocked;
        match how {
            SigProcMaskHow::Block => self.blocked |= set,
            SigProcMaskHow::Unblock => self.blocked -= set,
            SigProcMaskHow::SetMask => self.blocked = set,
        }
        self.blocked -= KSignalSet::UNCATCHABLE;
        old
    }

    /// 整体替换掩码，返回原来的掩码，供之后 [`Self::restore_mask`] 使用
    pub fn replace_mask(&mut self, mask: KSignalSet) -> KSignalSet {
        core::mem::replace(&mut self.blocked, mask - KSignalSet::UNCATCHABLE)
    }

    pub fn restore_mask(&mut self, saved: KSignalSet) {
        self.blocked = saved - KSignalSet::UNCATCHABLE;
    }
}
