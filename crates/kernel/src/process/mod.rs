mod inner;
mod manager;
mod user;

use std::{
    sync::{Arc, Weak},
    time::Instant,
};

use atomic::{Atomic, Ordering};
use compact_str::CompactString;
use defines::{
    config::TASK_LIMIT,
    error::{errno, KResult},
    resource::RLimits,
    signal::Signal,
};
use event_listener::{Event, Listener};
use idallocator::CyclicAllocator;
use klocks::SpinMutex;
use signal::{SignalHandlers, SignalReceiver};

pub use self::{
    inner::ProcessInner,
    manager::{get, group, live_count, PROCESS_MANAGER},
    user::run_user,
};
pub(crate) use self::user::spawn_user_process;

pub struct Process {
    pid: usize,
    /// 进程组号。没有父进程的进程自成一组，子进程继承父进程的进程组
    pgid: usize,
    name: CompactString,
    /// 子进程状态改变时通知
    pub wait4_event: Event,
    /// 产生信号、被停止或继续、退出时通知
    pub signal_event: Event,
    status: Atomic<ProcessStatus>,
    thread_status: Atomic<ThreadStatus>,
    inner: SpinMutex<ProcessInner>,
}

impl Process {
    /// 创建一个没有父进程的进程，并加入进程表
    pub fn new_root(name: &str) -> KResult<Arc<Self>> {
        let process = Arc::new(Self::with_inner(
            CompactString::new(name),
            None,
            ProcessInner {
                parent: None,
                children: Vec::new(),
                signal_handlers: SignalHandlers::new(),
                signal_receiver: SignalReceiver::new(),
                rlimits: RLimits::new(),
                continued: false,
            },
        )?);
        PROCESS_MANAGER.add(process.pid, Arc::clone(&process));
        Ok(process)
    }

    /// `pgid` 为 `None` 时新进程自成一组
    fn with_inner(
        name: CompactString,
        pgid: Option<usize>,
        inner: ProcessInner,
    ) -> KResult<Self> {
        let pid = PID_ALLOCATOR.lock().alloc().ok_or(errno::EAGAIN)?;
        Ok(Self {
            pid,
            pgid: pgid.unwrap_or(pid),
            name,
            wait4_event: Event::new(),
            signal_event: Event::new(),
            status: Atomic::new(ProcessStatus::normal()),
            thread_status: Atomic::new(ThreadStatus::Running),
            inner: SpinMutex::new(inner),
        })
    }

    /// fork 一个新进程，但还不运行它。
    ///
    /// 子进程复制父进程的信号处理方式、信号掩码和资源限制，待处理信号集为空
    pub fn fork(self: &Arc<Self>) -> KResult<Arc<Self>> {
        let child = self.lock_inner_with(|inner| -> KResult<Arc<Self>> {
            let child = Arc::new(Self::with_inner(
                self.name.clone(),
                Some(self.pgid),
                ProcessInner {
                    parent: Some(Arc::downgrade(self)),
                    children: Vec::new(),
                    signal_handlers: inner.signal_handlers.clone(),
                    signal_receiver: inner.signal_receiver.fork(),
                    rlimits: inner.rlimits.clone(),
                    continued: false,
                },
            )?);
            // 新进程添入原进程的子进程表
            inner.children.push(Arc::clone(&child));
            Ok(child)
        })?;
        PROCESS_MANAGER.add(child.pid, Arc::clone(&child));
        Ok(child)
    }

    /// 锁 inner 然后进行操作，算是个快捷方法。尽量避免同时拿多个锁
    pub fn lock_inner_with<T>(&self, f: impl FnOnce(&mut ProcessInner) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn pid(&self) -> usize {
        self.pid
    }

    pub fn pgid(&self) -> usize {
        self.pgid
    }

    /// 是否为进程组的组长，即进程组里最初的那个进程
    pub fn is_group_leader(&self) -> bool {
        self.pid == self.pgid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<Arc<Process>> {
        self.lock_inner_with(|inner| inner.parent.as_ref().and_then(Weak::upgrade))
    }

    pub fn status(&self) -> ProcessStatus {
        self.status.load(Ordering::SeqCst)
    }

    pub fn thread_status(&self) -> ThreadStatus {
        self.thread_status.load(Ordering::SeqCst)
    }

    /// 已被标记为退出，或已成为僵尸
    pub fn is_exited(&self) -> bool {
        matches!(self.status().state(), ProcessState::Exited | ProcessState::Zombie)
    }

    pub fn is_zombie(&self) -> bool {
        self.status().state() == ProcessState::Zombie
    }

    pub fn is_stopped(&self) -> bool {
        self.status().state() == ProcessState::Stopped
    }

    /// 唤醒该进程所有阻塞中的操作，让它们重新检查条件
    pub fn wake(&self) {
        self.signal_event.notify(usize::MAX);
        self.wait4_event.notify(usize::MAX);
    }

    /// 阻塞当前执行流，直到 `listener` 被通知或到达 `deadline`。超时返回 `false`
    ///
    /// 调用者应当先注册 `listener` 再检查唤醒条件，这样条件在两者之间成立也不会丢失唤醒
    pub fn block_on(&self, listener: impl Listener, deadline: Option<Instant>) -> bool {
        self.thread_status
            .store(ThreadStatus::Blocking, Ordering::SeqCst);
        let notified = match deadline {
            Some(deadline) => listener.wait_deadline(deadline).is_some(),
            None => {
                listener.wait();
                true
            }
        };
        self.thread_status
            .store(ThreadStatus::Running, Ordering::SeqCst);
        notified
    }

    /// 状态从 `Stopped` 变为 `Normal`。原本不处于停止状态则什么都不做。
    ///
    /// 继续会被记下，被停止打断的 `sigsuspend` 据此返回
    pub fn continue_process(&self) -> bool {
        let continued = self
            .status
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |status| {
                (status.state() == ProcessState::Stopped).then(ProcessStatus::normal)
            })
            .is_ok();
        if continued {
            info!("process {} continues", self.pid);
            self.lock_inner_with(|inner| inner.continued = true);
            self.wake();
        }
        continued
    }

    /// 被信号停止。只有正常运行的进程可以被停止
    pub fn stop_process(&self, signal: Signal) -> bool {
        let stopped = self
            .status
            .compare_exchange(
                ProcessStatus::normal(),
                ProcessStatus::stopped(signal),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if stopped {
            info!("process {} stopped by {signal:?}", self.pid);
            self.wake();
        }
        stopped
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        PID_ALLOCATOR.lock().dealloc(self.pid);
    }
}

static PID_ALLOCATOR: SpinMutex<CyclicAllocator> =
    SpinMutex::new(CyclicAllocator::with_range(1, TASK_LIMIT + 1));

/// 标记进程退出，`wstatus` 是之后 `wait4` 看到的状态。
///
/// 进程的执行流此时可能正在运行，因此终止不是立刻发生的，仅仅只是标记该进程为退出，而不回收资源。
/// 执行流在下一个检查点发现进程已标记为退出，从而一路返回 `BREAK`
///
/// 已经退出的进程不会被再次标记，此时返回 `false`
pub fn exit_process(process: &Process, wstatus: u16) -> bool {
    let exited = process
        .status
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |status| {
            match status.state() {
                ProcessState::Normal | ProcessState::Stopped => {
                    Some(ProcessStatus::exited(wstatus))
                }
                ProcessState::Exited | ProcessState::Zombie => None,
            }
        })
        .is_ok();
    if exited {
        info!("process {} exits with wstatus {wstatus:#x}", process.pid);
        process.wake();
    }
    exited
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Normal,
    Stopped,
    /// 标记为退出，但执行流尚未结束
    Exited,
    /// 执行流已结束，等待父进程 wait
    Zombie,
}

/// 进程的状态，其中低 16 位是 Linux 格式的 wstatus：
///
/// - 正常退出：`exit_code << 8`
/// - 被信号杀死：信号编号
/// - 被信号停止：`(信号编号 << 8) | 0x7f`
///
/// 16 位以上记录 [`ProcessState`]
#[derive(bytemuck::NoUninit, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ProcessStatus(u32);

impl ProcessStatus {
    const STATE_SHIFT: u32 = 16;
    const WSTATUS_MASK: u32 = 0xffff;

    const fn with_state(state: u32, wstatus: u16) -> Self {
        Self((state << Self::STATE_SHIFT) | wstatus as u32)
    }

    pub const fn normal() -> Self {
        Self::with_state(0, 0)
    }

    pub fn stopped(signal: Signal) -> Self {
        Self::with_state(1, ((signal.to_user() as u16) << 8) | 0x7f)
    }

    pub const fn exited(wstatus: u16) -> Self {
        Self::with_state(2, wstatus)
    }

    pub const fn zombie(wstatus: u16) -> Self {
        Self::with_state(3, wstatus)
    }

    /// 正常退出时的 wstatus
    pub fn exit_code(code: i32) -> u16 {
        ((code & 0xff) as u16) << 8
    }

    /// 被信号杀死时的 wstatus
    pub fn killed(signal: Signal) -> u16 {
        signal.to_user() as u16
    }

    pub fn state(self) -> ProcessState {
        match self.0 >> Self::STATE_SHIFT {
            0 => ProcessState::Normal,
            1 => ProcessState::Stopped,
            2 => ProcessState::Exited,
            _ => ProcessState::Zombie,
        }
    }

    pub fn wstatus(self) -> u16 {
        (self.0 & Self::WSTATUS_MASK) as u16
    }
}

/// 执行流的调度状态，只用于观察
#[derive(bytemuck::NoUninit, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadStatus {
    Running = 0,
    /// 阻塞在某个事件上
    Blocking = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wstatus_layout() {
        assert_eq!(ProcessStatus::exit_code(3), 0x300);
        assert_eq!(ProcessStatus::exit_code(-1), 0xff00);
        assert_eq!(ProcessStatus::killed(Signal::SIGTERM), 15);
        let stopped = ProcessStatus::stopped(Signal::SIGSTOP);
        assert_eq!(stopped.state(), ProcessState::Stopped);
        assert_eq!(stopped.wstatus(), (19 << 8) | 0x7f);
        let zombie = ProcessStatus::zombie(0x300);
        assert_eq!(zombie.state(), ProcessState::Zombie);
        assert_eq!(zombie.wstatus(), 0x300);
        assert_eq!(ProcessStatus::normal().state(), ProcessState::Normal);
    }

    #[test]
    fn exit_only_once() {
        let process = Process::new_root("exit_only_once").unwrap();
        assert!(exit_process(&process, ProcessStatus::exit_code(1)));
        assert!(!exit_process(&process, ProcessStatus::exit_code(2)));
        assert_eq!(process.status().wstatus(), 0x100);
        assert!(process.is_exited());
        PROCESS_MANAGER.remove(process.pid());
    }

    #[test]
    fn stop_and_continue() {
        let process = Process::new_root("stop_and_continue").unwrap();
        assert!(!process.continue_process());
        assert!(process.stop_process(Signal::SIGTSTP));
        assert!(!process.stop_process(Signal::SIGSTOP));
        assert!(process.is_stopped());
        assert!(process.continue_process());
        assert_eq!(process.status(), ProcessStatus::normal());
        assert!(process.lock_inner_with(|inner| inner.continued));
        PROCESS_MANAGER.remove(process.pid());
    }

    #[test]
    fn fork_copies_signal_state() {
        use defines::signal::{KSignalSet, SignalInfo};
        use signal::{Disposition, SigProcMaskHow};

        let parent = Process::new_root("fork_copies_signal_state").unwrap();
        parent.lock_inner_with(|inner| {
            inner.signal_handlers.set(Signal::SIGUSR1, Disposition::Ignore);
            inner
                .signal_receiver
                .apply(SigProcMaskHow::Block, KSignalSet::SIGTERM);
            inner
                .signal_receiver
                .receive(SignalInfo::kernel(Signal::SIGTERM), &Disposition::Default);
        });
        let child = parent.fork().unwrap();
        assert_eq!(child.parent().map(|p| p.pid()), Some(parent.pid()));
        assert!(parent.is_group_leader());
        assert_eq!(child.pgid(), parent.pid());
        assert!(!child.is_group_leader());
        child.lock_inner_with(|inner| {
            assert!(inner.signal_handlers.action(Signal::SIGUSR1).is_ignore());
            assert_eq!(inner.signal_receiver.blocked(), KSignalSet::SIGTERM);
            assert!(inner.signal_receiver.pending().is_empty());
        });
        PROCESS_MANAGER.remove(child.pid());
        PROCESS_MANAGER.remove(parent.pid());
    }
}
