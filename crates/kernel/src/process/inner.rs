use std::sync::{Arc, Weak};

use defines::{
    error::{errno, KResult},
    resource::RLimits,
};
use signal::{SignalHandlers, SignalReceiver};

use super::Process;

pub struct ProcessInner {
    /* 这里添加的资源都需要考虑在 `Process::new_root()`、`Process::fork()` 时初始化 */
    /* 以及在进程成为僵尸时释放 */

    /* 进程 */
    /// 父进程退出后变为 `None`，此时没有人会回收该进程
    pub parent: Option<Weak<Process>>,
    pub children: Vec<Arc<Process>>,

    /* 信号 */
    pub signal_handlers: SignalHandlers,
    pub signal_receiver: SignalReceiver,
    /// 从停止状态被继续后置位，由信号检查点取走
    pub continued: bool,

    /* 资源 */
    pub rlimits: RLimits,
}

impl ProcessInner {
    /// 在子进程中查找满足条件的僵尸进程，找到则将其移出子进程表。
    ///
    /// `pid` 为 -1 时匹配任意子进程。没有任何子进程匹配 `pid` 时返回 `ECHILD`
    pub fn reap_child(&mut self, pid: isize) -> KResult<Option<Arc<Process>>> {
        let mut has_proper_child = false;
        let mut child_index = None;
        for (index, child) in self.children.iter().enumerate() {
            if pid == -1 || child.pid() as isize == pid {
                has_proper_child = true;
                if child.is_zombie() {
                    child_index = Some(index);
                    break;
                }
            }
        }
        if !has_proper_child {
            return Err(errno::ECHILD);
        }
        Ok(child_index.map(|index| self.children.remove(index)))
    }
}
