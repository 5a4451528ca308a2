//! 标准信号的编号、信号集和 sigaction 的标志位。编号与 Linux 一致，从 1 开始

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const SIGHUP: u8 = 1;
pub const SIGINT: u8 = 2;
pub const SIGQUIT: u8 = 3;
pub const SIGILL: u8 = 4;
pub const SIGTRAP: u8 = 5;
pub const SIGABRT: u8 = 6;
pub const SIGBUS: u8 = 7;
pub const SIGFPE: u8 = 8;
pub const SIGKILL: u8 = 9;
pub const SIGUSR1: u8 = 10;
pub const SIGSEGV: u8 = 11;
pub const SIGUSR2: u8 = 12;
pub const SIGPIPE: u8 = 13;
pub const SIGALRM: u8 = 14;
pub const SIGTERM: u8 = 15;
pub const SIGSTKFLT: u8 = 16;
pub const SIGCHLD: u8 = 17;
pub const SIGCONT: u8 = 18;
pub const SIGSTOP: u8 = 19;
pub const SIGTSTP: u8 = 20;
pub const SIGTTIN: u8 = 21;
pub const SIGTTOU: u8 = 22;
pub const SIGURG: u8 = 23;
pub const SIGXCPU: u8 = 24;
pub const SIGXFSZ: u8 = 25;
pub const SIGVTALRM: u8 = 26;
pub const SIGPROF: u8 = 27;
pub const SIGWINCH: u8 = 28;
pub const SIGIO: u8 = 29;
pub const SIGPWR: u8 = 30;
pub const SIGSYS: u8 = 31;

// TODO: 出于简单性，暂时只考虑标准信号，后续有需要实时信号再添加

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum Signal {
    SIGHUP = 1,
    SIGINT = 2,
    SIGQUIT = 3,
    SIGILL = 4,
    SIGTRAP = 5,
    SIGABRT = 6,
    SIGBUS = 7,
    SIGFPE = 8,
    SIGKILL = 9,
    SIGUSR1 = 10,
    SIGSEGV = 11,
    SIGUSR2 = 12,
    SIGPIPE = 13,
    SIGALRM = 14,
    SIGTERM = 15,
    SIGSTKFLT = 16,
    SIGCHLD = 17,
    SIGCONT = 18,
    SIGSTOP = 19,
    SIGTSTP = 20,
    SIGTTIN = 21,
    SIGTTOU = 22,
    SIGURG = 23,
    SIGXCPU = 24,
    SIGXFSZ = 25,
    SIGVTALRM = 26,
    SIGPROF = 27,
    SIGWINCH = 28,
    SIGIO = 29,
    SIGPWR = 30,
    SIGSYS = 31,
}

impl Signal {
    /// 将用户传入的信号编号转换为 `Signal`。0 和实时信号都视为非法
    pub fn from_user(signum: u8) -> Option<Signal> {
        Signal::try_from_primitive(signum).ok()
    }

    pub fn to_user(self) -> u8 {
        self.into()
    }

    /// SIGKILL 和 SIGSTOP 无法被捕获、忽略或屏蔽
    pub fn is_uncatchable(self) -> bool {
        matches!(self, Signal::SIGKILL | Signal::SIGSTOP)
    }

    /// 在信号集和各种表中的下标
    #[inline]
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

bitflags! {
    /// 其实 posix 规定 64 位平台上应该有 1024bits。[Why is sigset_t in glibc/musl 128 bytes large on 64-bit Linux?](https://unix.stackexchange.com/questions/399342/why-is-sigset-t-in-glibc-musl-128-bytes-large-on-64-bit-linux)
    ///
    /// 在 syscall 边界上，linux 直接使用 64bits，信号 n 对应第 n - 1 位
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KSignalSet: u64 {
        const SIGHUP    = 1 << (SIGHUP - 1);
        const SIGINT    = 1 << (SIGINT - 1);
        const SIGQUIT   = 1 << (SIGQUIT - 1);
        const SIGILL    = 1 << (SIGILL - 1);
        const SIGTRAP   = 1 << (SIGTRAP - 1);
        const SIGABRT   = 1 << (SIGABRT - 1);
        const SIGBUS    = 1 << (SIGBUS - 1);
        const SIGFPE    = 1 << (SIGFPE - 1);
        const SIGKILL   = 1 << (SIGKILL - 1);
        const SIGUSR1   = 1 << (SIGUSR1 - 1);
        const SIGSEGV   = 1 << (SIGSEGV - 1);
        const SIGUSR2   = 1 << (SIGUSR2 - 1);
        const SIGPIPE   = 1 << (SIGPIPE - 1);
        const SIGALRM   = 1 << (SIGALRM - 1);
        const SIGTERM   = 1 << (SIGTERM - 1);
        const SIGSTKFLT = 1 << (SIGSTKFLT - 1);
        const SIGCHLD   = 1 << (SIGCHLD - 1);
        const SIGCONT   = 1 << (SIGCONT - 1);
        const SIGSTOP   = 1 << (SIGSTOP - 1);
        const SIGTSTP   = 1 << (SIGTSTP - 1);
        const SIGTTIN   = 1 << (SIGTTIN - 1);
        const SIGTTOU   = 1 << (SIGTTOU - 1);
        const SIGURG    = 1 << (SIGURG - 1);
        const SIGXCPU   = 1 << (SIGXCPU - 1);
        const SIGXFSZ   = 1 << (SIGXFSZ - 1);
        const SIGVTALRM = 1 << (SIGVTALRM - 1);
        const SIGPROF   = 1 << (SIGPROF - 1);
        const SIGWINCH  = 1 << (SIGWINCH - 1);
        const SIGIO     = 1 << (SIGIO - 1);
        const SIGPWR    = 1 << (SIGPWR - 1);
        const SIGSYS    = 1 << (SIGSYS - 1);

        /// 不可捕获、不可屏蔽的信号
        const UNCATCHABLE = Self::SIGKILL.bits() | Self::SIGSTOP.bits();
    }
}

impl KSignalSet {
    /// 编号最小的信号
    pub fn first(self) -> Option<Signal> {
        if self.is_empty() {
            return None;
        }
        Signal::from_user(self.bits().trailing_zeros() as u8 + 1)
    }

    pub fn contains_signal(self, signal: Signal) -> bool {
        self.contains(Self::from(signal))
    }

    /// 按编号从小到大遍历其中的信号
    pub fn signals(self) -> impl Iterator<Item = Signal> {
        let mut rest = self;
        core::iter::from_fn(move || {
            let signal = rest.first()?;
            rest.remove(KSignalSet::from(signal));
            Some(signal)
        })
    }

    /// 从用户传入的原始位图构造。不认识的位（实时信号）被截断
    pub fn from_user(bits: u64) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<Signal> for KSignalSet {
    fn from(value: Signal) -> Self {
        Self::from_bits_retain(1 << value.index())
    }
}

impl FromIterator<Signal> for KSignalSet {
    fn from_iter<T: IntoIterator<Item = Signal>>(iter: T) -> Self {
        iter.into_iter()
            .fold(KSignalSet::empty(), |set, signal| set | signal.into())
    }
}

/// 由 `kill` 等用户调用产生
pub const SI_USER: i32 = 0;
/// 由内核产生，比如子进程退出时的 SIGCHLD
pub const SI_KERNEL: i32 = 0x80;

/// 信号的附加信息，对应 `siginfo_t` 中与标准信号有关的部分
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalInfo {
    pub signal: Signal,
    /// `si_code`，即 [`SI_USER`]、[`SI_KERNEL`] 等
    pub code: i32,
    /// 发送者的 pid，内核产生时为 0
    pub sender: usize,
}

impl SignalInfo {
    pub const fn user(signal: Signal, sender: usize) -> Self {
        Self {
            signal,
            code: SI_USER,
            sender,
        }
    }

    pub const fn kernel(signal: Signal) -> Self {
        Self {
            signal,
            code: SI_KERNEL,
            sender: 0,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SignalActionFlags: u32 {
        // const SA_NOCLDSTOP = 1;
        // const SA_NOCLDWAIT = 2;
        // const SA_SIGINFO = 4;
        // const SA_ONSTACK = 0x08_000_000;
        // const SA_RESTART = 0x10_000_000;
        /// 一般而言。执行一个 signal handler 时，会屏蔽自己这个信号。
        ///
        /// 若指定以下这个 flag 则不会。sigaction 中的 mask 仍有效
        const SA_NODEFER   = 0x40_000_000;
        /// handler 执行一次后，处理方式重置为默认
        const SA_RESETHAND = 0x80_000_000;
    }
}
