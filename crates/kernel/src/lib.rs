//! 宿主机上的进程与信号模拟。
//!
//! 每个进程对应一个宿主线程，`main` 中通过 [`syscall`] 里的函数与“内核”交互。
//! 系统调用返回前会检查并递送信号

#[macro_use]
extern crate kernel_tracer;

pub mod context;
pub mod process;
pub mod signal;
pub mod syscall;
pub mod time;

pub use self::process::run_user;
