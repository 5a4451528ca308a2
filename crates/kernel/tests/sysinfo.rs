use defines::{
    config::{KERNEL_HEAP_SIZE, MEMORY_SIZE},
    signal::{KSignalSet, Signal},
};
use kernel::{
    run_user,
    syscall::{sys_fork, sys_kill, sys_rt_sigsuspend, sys_sysinfo, sys_wait4},
};

#[test]
fn sysinfo_snapshot() {
    let wstatus = run_user("sysinfo", || {
        let info = sys_sysinfo()?;
        assert_eq!(info.totalram, MEMORY_SIZE as u64);
        assert_eq!(info.freeram, (MEMORY_SIZE - KERNEL_HEAP_SIZE) as u64);
        assert_eq!(info.mem_unit, 1);
        assert!(info.uptime >= 0);
        assert!(info.procs >= 1);

        // 其他测试可能并行运行，这里只比较相对值
        let child = sys_fork(|| loop {
            sys_rt_sigsuspend(KSignalSet::empty())?;
        })?;
        let with_child = sys_sysinfo()?;
        assert!(with_child.procs >= 2);
        sys_kill(child as isize, usize::from(Signal::SIGKILL.to_user()))?;
        sys_wait4(child as isize, 0)?;
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}
