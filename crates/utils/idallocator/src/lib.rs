#![no_std]

extern crate alloc;

use alloc::collections::BTreeSet;

/// 循环分配 id。每次从上一次分配的位置之后开始寻找空闲的 id，到达上限后回到开头，
/// 因此刚释放的 id 要等一轮之后才会被再次分配
///
/// 分配出的 id 总在 `begin..limit` 范围内
#[derive(Clone, Debug)]
pub struct CyclicAllocator {
    begin: usize,
    limit: usize,
    next: usize,
    used: BTreeSet<usize>,
}

impl Default for CyclicAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl CyclicAllocator {
    /// 默认从 0 开始分配，没有上限
    pub const fn new() -> Self {
        Self::with_range(0, usize::MAX)
    }

    /// 分配 `begin..limit` 范围内的 id
    pub const fn with_range(begin: usize, limit: usize) -> Self {
        CyclicAllocator {
            begin,
            limit,
            next: begin,
            used: BTreeSet::new(),
        }
    }

    /// 范围内的 id 都已被占用时返回 `None`
    pub fn alloc(&mut self) -> Option<usize> {
        let id = (self.next..self.limit)
            .chain(self.begin..self.next)
            .find(|id| !self.used.contains(id))?;
        self.used.insert(id);
        self.next = if id + 1 >= self.limit { self.begin } else { id + 1 };
        Some(id)
    }

    pub fn dealloc(&mut self, id: usize) {
        let removed = self.used.remove(&id);
        debug_assert!(removed, "id {id} has been deallocated!");
    }
}

#[cfg(test)]
mod tests {
    use super::CyclicAllocator;

    #[test]
    fn sequential_from_begin() {
        let mut allocator = CyclicAllocator::with_range(1, usize::MAX);
        assert_eq!(allocator.alloc(), Some(1));
        assert_eq!(allocator.alloc(), Some(2));
        assert_eq!(allocator.alloc(), Some(3));
    }

    #[test]
    fn released_id_is_not_reused_immediately() {
        let mut allocator = CyclicAllocator::new();
        let ids = [(); 5].map(|()| allocator.alloc().unwrap());
        assert_eq!(ids, [0, 1, 2, 3, 4]);
        allocator.dealloc(4);
        allocator.dealloc(1);
        assert_eq!(allocator.alloc(), Some(5));
        assert_eq!(allocator.alloc(), Some(6));
    }

    #[test]
    fn wraps_around() {
        let mut allocator = CyclicAllocator::with_range(1, 5);
        let ids = [(); 4].map(|()| allocator.alloc().unwrap());
        assert_eq!(ids, [1, 2, 3, 4]);
        allocator.dealloc(3);
        allocator.dealloc(2);
        // 回到开头后跳过仍在使用的 1
        assert_eq!(allocator.alloc(), Some(2));
        assert_eq!(allocator.alloc(), Some(3));
        assert_eq!(allocator.alloc(), None);
    }

    #[test]
    fn exhausted() {
        let mut allocator = CyclicAllocator::with_range(1, 3);
        assert_eq!(allocator.alloc(), Some(1));
        assert_eq!(allocator.alloc(), Some(2));
        assert_eq!(allocator.alloc(), None);
        allocator.dealloc(1);
        assert_eq!(allocator.alloc(), Some(1));
    }

    #[test]
    #[should_panic(expected = "has been deallocated")]
    #[cfg(debug_assertions)]
    fn double_free() {
        let mut allocator = CyclicAllocator::new();
        allocator.alloc();
        allocator.dealloc(0);
        allocator.dealloc(0);
    }
}
