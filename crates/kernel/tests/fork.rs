mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::wait_until;
use defines::{
    error::{errno, KResult},
    misc::WaitFlags,
    signal::{KSignalSet, Signal},
};
use kernel::{
    process,
    run_user,
    syscall::{
        sys_exit, sys_fork, sys_getpid, sys_getppid, sys_kill, sys_rt_sigaction,
        sys_rt_sigpending, sys_rt_sigprocmask, sys_rt_sigsuspend, sys_sched_yield, sys_wait4,
    },
};
use signal::{Disposition, SigProcMaskHow};

fn signum(signal: Signal) -> usize {
    usize::from(signal.to_user())
}

fn idle_child() -> KResult<i32> {
    loop {
        sys_rt_sigsuspend(KSignalSet::empty())?;
    }
}

#[test]
fn child_inherits_signal_state() {
    let wstatus = run_user("fork_signal", || {
        let usr2 = KSignalSet::from(Signal::SIGUSR2);
        sys_rt_sigaction(signum(Signal::SIGUSR1), Some(Disposition::handler(|_| Ok(()))))?;
        sys_rt_sigaction(signum(Signal::SIGTERM), Some(Disposition::Ignore))?;
        sys_rt_sigprocmask(SigProcMaskHow::Block as usize, Some(usr2))?;
        sys_kill(sys_getpid()? as isize, signum(Signal::SIGUSR2))?;
        assert_eq!(sys_rt_sigpending()?, usr2);

        let child = sys_fork(move || {
            assert!(matches!(
                sys_rt_sigaction(signum(Signal::SIGUSR1), None)?,
                Disposition::Handler(_)
            ));
            assert!(sys_rt_sigaction(signum(Signal::SIGTERM), None)?.is_ignore());
            assert_eq!(sys_rt_sigprocmask(0, None)?, usr2);
            // 待处理信号不会被继承
            assert_eq!(sys_rt_sigpending()?, KSignalSet::empty());
            Ok(0)
        })?;
        assert_eq!(sys_wait4(child as isize, 0)?, (child, 0));
        // 父进程的待处理信号不受影响
        assert_eq!(sys_rt_sigpending()?, usr2);
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn exit_status() {
    let wstatus = run_user("exit_status", || {
        let exited = sys_fork(|| sys_exit(7).map(|never| match never {}))?;
        assert_eq!(sys_wait4(exited as isize, 0)?, (exited, 7 << 8));

        let returned = sys_fork(|| Ok(3))?;
        assert_eq!(sys_wait4(returned as isize, 0)?, (returned, 3 << 8));

        let failed = sys_fork(|| Err(errno::EINVAL))?;
        assert_eq!(sys_wait4(failed as isize, 0)?, (failed, 22 << 8));

        let panicked = sys_fork(|| panic!("child panics"))?;
        assert_eq!(sys_wait4(panicked as isize, 0)?, (panicked, 6));
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn wait4_options() {
    let wstatus = run_user("wait4", || {
        assert_eq!(sys_wait4(-1, 0), Err(errno::ECHILD));
        let child = sys_fork(idle_child)?;
        assert_eq!(sys_wait4(child as isize + 1, 0), Err(errno::ECHILD));
        assert_eq!(sys_wait4(0, 0), Err(errno::EINVAL));
        assert_eq!(
            sys_wait4(-1, WaitFlags::WUNTRACED.bits()),
            Err(errno::UNSUPPORTED)
        );
        assert_eq!(sys_wait4(-1, WaitFlags::WNOHANG.bits())?, (0, 0));

        sys_kill(child as isize, signum(Signal::SIGINT))?;
        assert_eq!(sys_wait4(-1, 0)?, (child, 2));
        // 已被回收
        assert!(process::get(child).is_none());
        assert_eq!(sys_wait4(-1, WaitFlags::WNOHANG.bits()), Err(errno::ECHILD));
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn parent_pid() {
    let wstatus = run_user("getppid", || {
        assert_eq!(sys_getppid()?, 0);
        let parent = sys_getpid()?;
        let child = sys_fork(move || {
            assert_eq!(sys_getppid()?, parent);
            let me = sys_getpid()?;
            // 孙进程
            let grandchild = sys_fork(move || {
                assert_eq!(sys_getppid()?, me);
                Ok(5)
            })?;
            assert_eq!(sys_wait4(grandchild as isize, 0)?, (grandchild, 5 << 8));
            Ok(0)
        })?;
        assert_ne!(child, parent);
        assert_eq!(sys_wait4(child as isize, 0)?, (child, 0));
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn sigchld_on_child_exit() {
    let wstatus = run_user("sigchld", || {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);
        sys_rt_sigaction(
            signum(Signal::SIGCHLD),
            Some(Disposition::handler(move |signal| {
                assert_eq!(signal, Signal::SIGCHLD);
                count2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        )?;
        let child = sys_fork(|| Ok(0))?;
        // SIGCHLD 可能恰好打断 wait4
        let reaped = loop {
            match sys_wait4(child as isize, 0) {
                Err(err) if err == errno::EINTR => {}
                ret => break ret?,
            }
        };
        assert_eq!(reaped, (child, 0));
        wait_until(|| sys_sched_yield().is_ok() && count.load(Ordering::SeqCst) == 1);
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn orphan_cleans_itself() {
    let orphan = Arc::new(AtomicUsize::new(0));
    let orphan2 = Arc::clone(&orphan);
    let wstatus = run_user("orphan", move || {
        let child = sys_fork(|| {
            // 父进程退出后不再有父进程
            wait_until(|| sys_getppid() == Ok(0));
            Ok(0)
        })?;
        orphan2.store(child, Ordering::SeqCst);
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
    let orphan = orphan.load(Ordering::SeqCst);
    assert_ne!(orphan, 0);
    wait_until(|| process::get(orphan).is_none());
}

#[test]
fn kill_broadcast_spares_group_leader() {
    let wstatus = run_user("kill_broadcast", || {
        let first = sys_fork(idle_child)?;
        let second = sys_fork(idle_child)?;
        let grandchild = Arc::new(AtomicUsize::new(0));
        let grandchild2 = Arc::clone(&grandchild);
        let third = sys_fork(move || {
            grandchild2.store(sys_fork(idle_child)?, Ordering::SeqCst);
            idle_child()
        })?;
        wait_until(|| grandchild.load(Ordering::SeqCst) != 0);
        let grandchild =
            process::get(grandchild.load(Ordering::SeqCst)).expect("grandchild exists");
        assert_eq!(grandchild.pgid(), sys_getpid()?);

        // 调用者是组长，不会收到信号
        sys_kill(-1, signum(Signal::SIGTERM))?;
        for child in [first, second, third] {
            assert_eq!(sys_wait4(child as isize, 0)?, (child, 15));
        }
        wait_until(|| grandchild.is_zombie());
        assert_eq!(sys_wait4(-1, 0), Err(errno::ECHILD));
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}

#[test]
fn kill_group_includes_caller() {
    let wstatus = run_user("kill_group", || {
        let term = KSignalSet::from(Signal::SIGTERM);
        sys_rt_sigprocmask(SigProcMaskHow::Block as usize, Some(term))?;
        let child = sys_fork(move || {
            // 子进程继承了掩码，解除屏蔽后才能被终止
            sys_rt_sigprocmask(SigProcMaskHow::Unblock as usize, Some(term))?;
            idle_child()
        })?;
        sys_kill(0, signum(Signal::SIGTERM))?;
        assert_eq!(sys_rt_sigpending()?, term);
        assert_eq!(sys_wait4(child as isize, 0)?, (child, 15));

        // 进程组号即组长的 pid
        sys_fork(idle_child)?;
        sys_kill(-(sys_getpid()? as isize), signum(Signal::SIGKILL))?;
        unreachable!("killed by SIGKILL");
    });
    assert_eq!(wstatus, Ok(9));
}

#[test]
fn reaped_pid_is_not_reused_at_once() {
    let wstatus = run_user("pid_reuse", || {
        let first = sys_fork(|| Ok(0))?;
        assert_eq!(sys_wait4(first as isize, 0)?, (first, 0));
        let second = sys_fork(|| Ok(0))?;
        assert_ne!(first, second);
        assert_eq!(sys_wait4(second as isize, 0)?, (second, 0));
        Ok(0)
    });
    assert_eq!(wstatus, Ok(0));
}
