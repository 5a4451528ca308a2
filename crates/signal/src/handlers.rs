use defines::{config::STD_SIGNAL_NUM, signal::Signal};
use extend::ext;

use crate::Disposition;

/// 信号的默认行为，参考 <https://man7.org/linux/man-pages/man7/signal.7.html>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultHandler {
    Terminate,
    Ignore,
    /// 不会真正生成 core 文件，效果和 `Terminate` 一样
    CoreDump,
    Stop,
    Continue,
}

impl DefaultHandler {
    pub fn new(signal: Signal) -> Self {
        #[allow(clippy::enum_glob_use)]
        use Signal::*;
        match signal {
            SIGABRT | SIGBUS | SIGFPE | SIGILL | SIGQUIT | SIGSEGV | SIGSYS | SIGTRAP | SIGXCPU
            | SIGXFSZ => DefaultHandler::CoreDump,
            SIGCHLD | SIGURG | SIGWINCH => DefaultHandler::Ignore,
            SIGSTOP | SIGTSTP | SIGTTIN | SIGTTOU => DefaultHandler::Stop,
            SIGCONT => DefaultHandler::Continue,
            _ => DefaultHandler::Terminate,
        }
    }
}

#[ext(pub, name = SignalExt)]
impl Signal {
    fn default_handler(self) -> DefaultHandler {
        DefaultHandler::new(self)
    }
}

/// 信号处理方式表，由进程持有。
///
/// SIGKILL 和 SIGSTOP 的处理方式永远是默认
#[derive(Clone, Debug)]
pub struct SignalHandlers {
    actions: [Disposition; STD_SIGNAL_NUM],
}

impl SignalHandlers {
    pub const fn new() -> Self {
        const DEFAULT_ACTION: Disposition = Disposition::Default;
        Self {
            actions: [DEFAULT_ACTION; STD_SIGNAL_NUM],
        }
    }

    pub fn action(&self, signal: Signal) -> &Disposition {
        &self.actions[signal.index()]
    }

    /// 设置新的处理方式，返回原来的。
    ///
    /// 对 SIGKILL 和 SIGSTOP 的修改被静默忽略，返回的仍是 `Default`
    pub fn set(&mut self, signal: Signal, new: Disposition) -> Disposition {
        if signal.is_uncatchable() {
            return Disposition::Default;
        }
        core::mem::replace(&mut self.actions[signal.index()], new)
    }

    /// 只读地查询原来的处理方式，不做修改
    pub fn get(&self, signal: Signal) -> Disposition {
        self.action(signal).clone()
    }

    /// 恢复为默认处理方式，用于 `SA_RESETHAND`
    pub fn reset(&mut self, signal: Signal) {
        self.actions[signal.index()] = Disposition::Default;
    }
}

impl Default for SignalHandlers {
    fn default() -> Self {
        Self::new()
    }
}
