//! 参考：<https://man7.org/linux/man-pages/man7/signal.7.html>
//!
//! 每个进程持有一张信号处理方式表 [`SignalHandlers`]，以及一个掩码和待处理信号集 [`SignalReceiver`]。
//!
//! `fork` 会继承父进程的处理方式表和掩码，但是待处理信号会置空。
//!
//! 信号产生时的去向见 [`Generated`]。真正执行处理函数、等待信号等需要调度的部分由内核完成

#![no_std]

extern crate alloc;

mod action;
mod handlers;
mod receiver;

pub use action::{Disposition, SignalAction, SignalHandler};
pub use handlers::{DefaultHandler, SignalExt, SignalHandlers};
pub use receiver::{Generated, SignalReceiver};

use num_enum::TryFromPrimitive;

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(usize)]
pub enum SigProcMaskHow {
    /// 掩蔽传入的信号集，即新掩码是传入值和旧的并集
    Block = 0,
    /// 取消掩蔽传入的信号集
    Unblock = 1,
    /// 将掩码设置为传入的信号集，即直接赋值
    SetMask = 2,
}

impl SigProcMaskHow {
    pub fn from_user(how: usize) -> Option<Self> {
        Self::try_from_primitive(how).ok()
    }
}
