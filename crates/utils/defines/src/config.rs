const KB: usize = 1024;
const MB: usize = 1024 * KB;

/// 模拟的物理内存大小，仅用于 `sysinfo` 汇报
pub const MEMORY_SIZE: usize = 128 * MB;

/// 模拟的内核堆大小，`sysinfo` 中视作已占用的内存
pub const KERNEL_HEAP_SIZE: usize = 32 * MB;

/// 用户栈的默认大小，也是 `RLIMIT_STACK` 的默认软上限
pub const USER_STACK_SIZE: usize = 8 * MB;

/// 信号机制所需的 bitset 大小
pub const SIGSET_SIZE: usize = 64;
pub const SIGSET_SIZE_BYTES: usize = SIGSET_SIZE / 8;

/// 标准信号的数量，不考虑实时信号
pub const STD_SIGNAL_NUM: usize = 31;

/// 同时存在的进程数量上限
pub const TASK_LIMIT: usize = 256;

/// 默认的文件描述符数量限制（软、硬）
pub const NOFILE_LIMIT: (usize, usize) = (1024, 4096);
