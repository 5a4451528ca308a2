//! 放一些比较杂又非常简单的东西，以至于不值得分出单独的文件

use bitflags::bitflags;

/// `sys_sysinfo` 返回的系统信息，字段与 Linux 的 `struct sysinfo` 一致
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SysInfo {
    /// 启动以来经过的秒数
    pub uptime: i64,
    /// 1, 5, 15 分钟的平均负载
    pub loads: [u64; 3],
    /// 总内存大小
    pub totalram: u64,
    /// 可用内存大小
    pub freeram: u64,
    /// 共享内存大小
    pub sharedram: u64,
    /// 缓冲区占用的内存
    pub bufferram: u64,
    /// 总交换空间大小
    pub totalswap: u64,
    /// 可用交换空间大小
    pub freeswap: u64,
    /// 当前进程数
    pub procs: u16,
    /// 总高位内存
    pub totalhigh: u64,
    /// 可用高位内存
    pub freehigh: u64,
    /// 以上内存大小的单位，字节
    pub mem_unit: u32,
}

bitflags! {
    /// `wait4` 的 options
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct WaitFlags: u32 {
        const WNOHANG    = 1;
        const WUNTRACED  = 2;
        const WCONTINUED = 8;
    }
}
