//! 自旋锁，封装了一下 `spin::mutex::spin`
//!
//! 裁剪了一些不太需要的方法，添加 debug 模式下的死锁检测。
//! 死锁检测需要时钟，因此只在开启 `std` feature（或测试）时生效

use core::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

/// 持锁超过这个时间就认为发生了死锁
#[cfg(all(debug_assertions, any(test, feature = "std")))]
const DEADLOCK_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(2);

pub struct SpinMutex<T: ?Sized> {
    base: spin::mutex::SpinMutex<T>,
}

pub struct SpinMutexGuard<'a, T: ?Sized> {
    inner: spin::mutex::SpinMutexGuard<'a, T>,
    // 不允许 Guard 被移动到其他线程上释放
    _not_send: PhantomData<*const ()>,
}

unsafe impl<T: ?Sized + Send> Sync for SpinMutex<T> {}
unsafe impl<T: ?Sized + Send> Send for SpinMutex<T> {}

unsafe impl<T: ?Sized + Sync> Sync for SpinMutexGuard<'_, T> {}

impl<T> SpinMutex<T> {
    #[inline(always)]
    pub const fn new(data: T) -> Self {
        Self {
            base: spin::mutex::SpinMutex::new(data),
        }
    }

    pub fn into_inner(self) -> T {
        self.base.into_inner()
    }
}

impl<T: ?Sized> SpinMutex<T> {
    /// 上锁并返回 guard，guard 离开作用域时释放锁。
    ///
    /// debug 模式下，等待超过 2 秒会 panic，以便尽早暴露死锁
    #[inline]
    #[track_caller]
    pub fn lock(&self) -> SpinMutexGuard<'_, T> {
        #[cfg(all(debug_assertions, any(test, feature = "std")))]
        let begin = std::time::Instant::now();
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }

            while self.base.is_locked() {
                core::hint::spin_loop();
                #[cfg(all(debug_assertions, any(test, feature = "std")))]
                if begin.elapsed() >= DEADLOCK_THRESHOLD {
                    panic!("deadlock detected");
                }
            }
        }
    }

    #[inline(always)]
    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
        self.base.try_lock().map(|inner| SpinMutexGuard {
            inner,
            _not_send: PhantomData,
        })
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut T {
        self.base.get_mut()
    }
}

impl<T: Default> Default for SpinMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for SpinMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinMutex").field("data", &&*guard).finish(),
            None => f.write_str("SpinMutex { <locked> }"),
        }
    }
}

impl<T: ?Sized> Deref for SpinMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> DerefMut for SpinMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, vec::Vec};

    use super::SpinMutex;

    #[test]
    fn relock_after_drop() {
        let m = SpinMutex::new(0);
        *m.lock() += 1;
        *m.lock() += 1;
        assert_eq!(m.into_inner(), 2);
    }

    #[test]
    fn contended_counter() {
        const THREADS: usize = 6;
        const ROUNDS: usize = 1000;

        let counter = Arc::new(SpinMutex::new(0usize));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        *counter.lock() += 1;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock(), THREADS * ROUNDS);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let m = SpinMutex::new(42);
        let held = m.try_lock();
        assert_eq!(held.as_deref(), Some(&42));
        assert!(m.try_lock().is_none());
        assert_eq!(format!("{m:?}"), "SpinMutex { <locked> }");
        drop(held);
        assert_eq!(m.try_lock().as_deref(), Some(&42));
    }

    #[test]
    fn lock_released_on_unwind() {
        let m = Arc::new(SpinMutex::new(1));
        let m2 = Arc::clone(&m);
        let result = thread::spawn(move || {
            let mut guard = m2.lock();
            *guard += 1;
            panic!("unwinding while holding the lock");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(*m.lock(), 2);
    }

    #[test]
    fn unsized_slice() {
        let m: &SpinMutex<[i32]> = &SpinMutex::new([1, 2, 3]);
        m.lock()[1] = 5;
        assert_eq!(&*m.lock(), &[1, 5, 3]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "deadlock detected")]
    fn relock_in_same_thread_panics() {
        let m = SpinMutex::new(());
        let _first = m.lock();
        let _second = m.lock();
    }
}
