use core::{cmp::Ordering, fmt};

use klocks::Lazy;

static LOG_LEVEL_NAMES: [&str; 6] = ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Level {
    Error = 1,
    Warn,
    Info,
    Debug,
    Trace,
}

impl PartialEq<LevelFilter> for Level {
    #[inline]
    fn eq(&self, other: &LevelFilter) -> bool {
        *self as u8 == *other as u8
    }
}

impl PartialOrd<LevelFilter> for Level {
    #[inline]
    fn partial_cmp(&self, other: &LevelFilter) -> Option<Ordering> {
        (*self as u8).partial_cmp(&(*other as u8))
    }
}

impl fmt::Display for Level {
    #[inline]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.pad(self.as_str())
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        LOG_LEVEL_NAMES[*self as usize]
    }
}

#[repr(usize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl PartialEq<Level> for LevelFilter {
    #[inline]
    fn eq(&self, other: &Level) -> bool {
        other.eq(self)
    }
}

impl PartialOrd<Level> for LevelFilter {
    #[inline]
    fn partial_cmp(&self, other: &Level) -> Option<Ordering> {
        (*self as u8).partial_cmp(&(*other as u8))
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.pad(self.as_str())
    }
}

impl LevelFilter {
    pub fn as_str(&self) -> &'static str {
        LOG_LEVEL_NAMES[*self as usize]
    }

    /// 解析 `TRACE`、`debug` 之类的字符串，不区分大小写。无法识别的视为 `OFF`
    pub fn parse(level_str: &str) -> Self {
        let level_str = level_str.trim();
        [
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(level_str))
        .unwrap_or(LevelFilter::Off)
    }
}

/// 编译时通过 `KERNEL_CLOG` 指定的默认控制台日志等级
pub const CLOG_DEFAULT: Option<&str> = option_env!("KERNEL_CLOG");

static CLOG: Lazy<LevelFilter> = Lazy::new(|| {
    decide_log_level(std::env::var("KERNEL_CLOG").ok().as_deref().or(CLOG_DEFAULT))
});

/// 控制台日志等级。运行时的 `KERNEL_CLOG` 环境变量优先于编译时指定的值
#[inline]
pub fn console_level() -> LevelFilter {
    *CLOG
}

fn decide_log_level(level_str: Option<&str>) -> LevelFilter {
    level_str.map_or(LevelFilter::Off, LevelFilter::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_levels() {
        assert_eq!(LevelFilter::parse("TRACE"), LevelFilter::Trace);
        assert_eq!(LevelFilter::parse("debug"), LevelFilter::Debug);
        assert_eq!(LevelFilter::parse(" Info "), LevelFilter::Info);
        assert_eq!(LevelFilter::parse("verbose"), LevelFilter::Off);
        assert_eq!(decide_log_level(None), LevelFilter::Off);
    }

    #[test]
    fn level_ordering() {
        assert!(Level::Error <= LevelFilter::Warn);
        assert!(Level::Trace > LevelFilter::Debug);
        assert!(Level::Error > LevelFilter::Off);
        assert_eq!(format!("{:>5}", Level::Info), " INFO");
    }
}
