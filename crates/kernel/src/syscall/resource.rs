use std::sync::Arc;

use defines::{
    error::{errno, KResult},
    resource::{RLimit, Resource},
};
use kernel_tracer::Level;

use super::syscall;
use crate::process;

/// 获取并设置资源限制，返回原来的限制。
///
/// 参数：
/// - `pid` 目标进程，0 表示当前进程
/// - `resource` 资源种类
/// - `new_limit` 新的限制，为 `None` 时只查询
///
/// 错误：
/// - `ESRCH` 进程不存在
/// - `EINVAL` 资源不存在，或软限制大于硬限制
/// - `EPERM` 试图提高硬限制
pub fn sys_prlimit64(pid: usize, resource: u32, new_limit: Option<RLimit>) -> KResult<RLimit> {
    syscall("prlimit64", Level::Info, |curr| {
        let resource = Resource::from_user(resource).ok_or(errno::EINVAL)?;
        let target = if pid == 0 {
            Arc::clone(curr)
        } else {
            process::get(pid).ok_or(errno::ESRCH)?
        };
        debug!("{resource:?} of process {}", target.pid());
        target.lock_inner_with(|inner| {
            let old = inner.rlimits.get(resource);
            if let Some(new_limit) = new_limit {
                if new_limit.rlim_curr > new_limit.rlim_max {
                    return Err(errno::EINVAL);
                }
                if new_limit.rlim_max > old.rlim_max {
                    return Err(errno::EPERM);
                }
                inner.rlimits.set(resource, new_limit);
            }
            Ok(old)
        })
    })
}
