//! 等待队列
//!
//! 参考 Linux 的等待队列 (include/linux/wait.h)，但队列项是进程表槽位下标，
//! 并且由调度器锁保护，自身不加锁。
//!
//! 用于：
//! - 阻塞在 zap() 上的进程（目标 quit 时全部唤醒）
//! - 已退出、等待父进程 join 的子进程

use alloc::collections::VecDeque;

/// 槽位下标的 FIFO 队列
#[derive(Debug, Default, Clone)]
pub struct WaitQueue {
    list: VecDeque<usize>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            list: VecDeque::new(),
        }
    }

    /// 添加到队尾
    pub fn add(&mut self, slot: usize) {
        self.list.push_back(slot);
    }

    /// 取出队首
    pub fn pop(&mut self) -> Option<usize> {
        self.list.pop_front()
    }

    /// 取出全部项（按加入顺序）
    pub fn take_all(&mut self) -> VecDeque<usize> {
        core::mem::take(&mut self.list)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut wq = WaitQueue::new();
        wq.add(4);
        wq.add(1);
        wq.add(7);
        assert_eq!(wq.pop(), Some(4));
        assert_eq!(wq.pop(), Some(1));
        assert_eq!(wq.len(), 1);
    }

    #[test]
    fn test_take_all_keeps_order() {
        let mut wq = WaitQueue::new();
        wq.add(2);
        wq.add(3);
        wq.add(5);
        let all: alloc::vec::Vec<usize> = wq.take_all().into_iter().collect();
        assert_eq!(all, [2, 3, 5]);
        assert!(wq.is_empty());
        assert_eq!(wq.pop(), None);
    }
}
