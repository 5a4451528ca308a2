use std::time::{Duration, Instant};

use klocks::Lazy;

static BOOT_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// 记录启动时刻，之后的 `curr_time` 都以此为起点
pub fn init() {
    Lazy::force(&BOOT_TIME);
}

/// 启动以来经过的时间
pub fn curr_time() -> Duration {
    BOOT_TIME.elapsed()
}

/// `now + timeout`，溢出时视为永远不会到达
pub fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}
