//! 简单的日志与 span 设施。日志输出到 stderr，span 栈按执行流（线程）隔离
//!
//! 控制台日志等级由 `KERNEL_CLOG` 决定，默认关闭

#[macro_use]
mod macros;
mod level;
mod record;
mod span;

pub use level::{console_level, Level, LevelFilter, CLOG_DEFAULT};
pub use record::Record;
pub use span::{loggable::Loggable, OwnedEnterGuard, Span, SpanData};

use core::fmt::Write;

use anstyle::{AnsiColor, Reset, Style};
use compact_str::CompactString;

const SPAN_NAME_COLOR: Style = AnsiColor::White.on_default().bold();

fn level_color(level: Level) -> AnsiColor {
    match level {
        Level::Error => AnsiColor::Red,
        Level::Warn => AnsiColor::BrightYellow,
        Level::Info => AnsiColor::Blue,
        Level::Debug => AnsiColor::Green,
        Level::Trace => AnsiColor::BrightBlack,
    }
}

/// 格式化一行日志，形如 `[ INFO]-process{pid=1}-syscall: message`
fn write_log(
    writer: &mut impl Write,
    record: &Record<'_>,
    span_level: LevelFilter,
    colored: bool,
) -> core::fmt::Result {
    // 开头部分，即日志级别，如 `[ INFO]`
    if colored {
        let color = level_color(record.level());
        write!(
            writer,
            "{}[{:>5}]{}",
            color.render_fg(),
            record.level(),
            Reset.render()
        )?;
    } else {
        write!(writer, "[{:>5}]", record.level())?;
    }

    // Span 栈部分
    let mut has_span = false;
    let mut result = Ok(());
    span::for_each_entered(|span_data| {
        if result.is_err() || span_data.level() > span_level {
            return;
        }
        has_span = true;
        result = if colored {
            write!(
                writer,
                "-{}{}{}",
                SPAN_NAME_COLOR.render(),
                span_data.name(),
                Reset.render()
            )
        } else {
            write!(writer, "-{}", span_data.name())
        };
        if let (Ok(()), Some(kvs)) = (result, span_data.kvs()) {
            result = write!(writer, "{{{kvs}}}");
        }
    });
    result?;

    if has_span {
        writer.write_str(": ")?;
    } else {
        writer.write_char(' ')?;
    }

    // 日志信息部分
    writeln!(writer, "{}", record.args())
}

#[inline]
#[doc(hidden)]
pub fn log_impl(level: Level, args: core::fmt::Arguments<'_>) {
    let clog = console_level();
    if level > clog {
        return;
    }
    let record = Record::new(level, args);
    // 先拼好一整行再输出，避免多个执行流的日志交错
    let mut line = CompactString::new("");
    if write_log(&mut line, &record, clog, true).is_ok() {
        eprint!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(level: Level, args: core::fmt::Arguments<'_>) -> CompactString {
        let mut line = CompactString::new("");
        write_log(&mut line, &Record::new(level, args), LevelFilter::Trace, false).unwrap();
        line
    }

    #[test]
    fn plain_line() {
        assert_eq!(render(Level::Warn, format_args!("x = {}", 1)), "[ WARN] x = 1\n");
    }

    #[test]
    fn nested_spans() {
        let outer = Span::new(Level::Info, "process", Some(&[("pid", &3usize as &dyn Loggable)]));
        let _outer = outer.entered();
        {
            let _inner = Span::new(Level::Debug, "syscall", None).entered();
            assert_eq!(
                render(Level::Info, format_args!("hello")),
                "[ INFO]-process{pid=3}-syscall: hello\n"
            );
        }
        assert_eq!(
            render(Level::Error, format_args!("bye")),
            "[ERROR]-process{pid=3}: bye\n"
        );
    }

    #[test]
    fn spans_are_per_thread() {
        let _outer = Span::new(Level::Info, "main", None).entered();
        let other = std::thread::spawn(|| render(Level::Info, format_args!("other")))
            .join()
            .unwrap();
        assert_eq!(other, "[ INFO] other\n");
    }

    #[test]
    fn loggable_values() {
        let names = vec!["a", "b"];
        let span = Span::new(
            Level::Trace,
            "kv",
            Some(&[("names", &names as &dyn Loggable), ("ok", &true)]),
        );
        let _enter = span.entered();
        assert_eq!(
            render(Level::Trace, format_args!("m")),
            "[TRACE]-kv{names=[a, b] ok=true}: m\n"
        );
    }

    #[test]
    fn disabled_span_is_invisible() {
        let _enter = Span::disabled().entered();
        assert_eq!(render(Level::Debug, format_args!("m")), "[DEBUG] m\n");
    }
}
