use num_enum::TryFromPrimitive;

use crate::config::{NOFILE_LIMIT, USER_STACK_SIZE};

/// 对资源没有限制
pub const RLIM_INFINITY: usize = usize::MAX;

/// `prlimit64` 可以操作的资源种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum Resource {
    Cpu = 0,
    FSize = 1,
    Data = 2,
    Stack = 3,
    Core = 4,
    Rss = 5,
    NProc = 6,
    NoFile = 7,
    MemLock = 8,
    AddressSpace = 9,
    Locks = 10,
    SigPending = 11,
    MsgQueue = 12,
    Nice = 13,
    RtPrio = 14,
    RtTime = 15,
}

pub const RLIMIT_NLIMITS: usize = 16;

impl Resource {
    pub fn from_user(resource: u32) -> Option<Self> {
        Self::try_from_primitive(resource).ok()
    }
}

/// Resource Limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RLimit {
    /// 软上限，即当前的限制值
    pub rlim_curr: usize,
    /// 硬上限，即软上限的最大值。
    ///
    /// 非特权进程的软上限范围为 `0..=rlimi_max`，且只能（不可逆地）降低 `rlimix_max`
    pub rlim_max: usize,
}

impl RLimit {
    pub const INFINITY: Self = Self::new(RLIM_INFINITY, RLIM_INFINITY);

    pub const fn new(rlim_curr: usize, rlim_max: usize) -> Self {
        Self {
            rlim_curr,
            rlim_max,
        }
    }
}

/// 进程的全部资源限制
#[derive(Debug, Clone)]
pub struct RLimits {
    limits: [RLimit; RLIMIT_NLIMITS],
}

impl RLimits {
    pub const fn new() -> Self {
        let mut limits = [RLimit::INFINITY; RLIMIT_NLIMITS];
        limits[Resource::Stack as usize] = RLimit::new(USER_STACK_SIZE, RLIM_INFINITY);
        limits[Resource::NoFile as usize] = RLimit::new(NOFILE_LIMIT.0, NOFILE_LIMIT.1);
        Self { limits }
    }

    pub fn get(&self, resource: Resource) -> RLimit {
        self.limits[resource as usize]
    }

    pub fn set(&mut self, resource: Resource, limit: RLimit) {
        self.limits[resource as usize] = limit;
    }
}

impl Default for RLimits {
    fn default() -> Self {
        Self::new()
    }
}
