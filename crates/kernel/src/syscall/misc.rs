use defines::{
    config::{KERNEL_HEAP_SIZE, MEMORY_SIZE},
    error::KResult,
    misc::SysInfo,
};
use kernel_tracer::Level;

use super::syscall;
use crate::{process, time};

/// 系统信息的快照。内存相关的数字来自配置常量
pub fn sys_sysinfo() -> KResult<SysInfo> {
    syscall("sysinfo", Level::Debug, |_| {
        Ok(SysInfo {
            uptime: time::curr_time().as_secs() as i64,
            totalram: MEMORY_SIZE as u64,
            freeram: (MEMORY_SIZE - KERNEL_HEAP_SIZE) as u64,
            procs: u16::try_from(process::live_count()).unwrap_or(u16::MAX),
            mem_unit: 1,
            ..Default::default()
        })
    })
}
