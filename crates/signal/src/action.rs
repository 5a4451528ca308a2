use alloc::sync::Arc;
use core::fmt;

use defines::{
    error::KResult,
    signal::{KSignalSet, Signal, SignalActionFlags},
};

/// 用户注册的信号处理函数。
///
/// 返回 `Err` 一般意味着处理函数内部的系统调用发现进程已经终止，需要一路向上退出
#[derive(Clone)]
pub struct SignalHandler(Arc<dyn Fn(Signal) -> KResult<()> + Send + Sync>);

impl SignalHandler {
    pub fn new(f: impl Fn(Signal) -> KResult<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, signal: Signal) -> KResult<()> {
        (self.0)(signal)
    }
}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalHandler({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

/// 处理函数以及执行它时的额外掩码、标志位
#[derive(Clone, Debug)]
pub struct SignalAction {
    pub handler: SignalHandler,
    /// 信号处理程序运行期间，额外的掩码
    pub mask: KSignalSet,
    pub flags: SignalActionFlags,
}

impl SignalAction {
    pub fn new(handler: SignalHandler) -> Self {
        Self {
            handler,
            mask: KSignalSet::empty(),
            flags: SignalActionFlags::empty(),
        }
    }

    pub fn with_mask(mut self, mask: KSignalSet) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_flags(mut self, flags: SignalActionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// 执行处理函数期间需要额外屏蔽的信号。
    ///
    /// 除非指定了 `SA_NODEFER`，否则信号本身也会被屏蔽。SIGKILL 和 SIGSTOP 永远不会被屏蔽
    pub fn blocked_during(&self, signal: Signal) -> KSignalSet {
        let mut blocked = self.mask;
        if !self.flags.contains(SignalActionFlags::SA_NODEFER) {
            blocked |= KSignalSet::from(signal);
        }
        blocked - KSignalSet::UNCATCHABLE
    }
}

/// 进程对某个信号的处理方式
#[derive(Clone, Debug, Default)]
pub enum Disposition {
    /// 执行该信号的默认行为，见 [`DefaultHandler`](crate::DefaultHandler)
    #[default]
    Default,
    /// 忽略
    Ignore,
    /// 执行用户的处理函数
    Handler(SignalAction),
}

impl Disposition {
    pub fn handler(f: impl Fn(Signal) -> KResult<()> + Send + Sync + 'static) -> Self {
        Self::Handler(SignalAction::new(SignalHandler::new(f)))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignore)
    }
}
