//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 就绪队列
//!
//! 所有就绪进程按优先级排列的单一有序序列：
//! - 优先级数值小的在前
//! - 同优先级内按入队先后排列（FIFO），同级轮转由此实现

use alloc::collections::VecDeque;

/// 就绪队列项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RqEntry {
    slot: usize,
    priority: i32,
}

/// 就绪队列
#[derive(Debug, Default)]
pub struct ReadyQueue {
    entries: VecDeque<RqEntry>,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// 插入到所有优先级不低于它的项之后
    pub fn insert(&mut self, slot: usize, priority: i32) {
        let idx = self
            .entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(idx, RqEntry { slot, priority });
    }

    /// 移除指定槽位，不在队列中时返回 false
    pub fn remove(&mut self, slot: usize) -> bool {
        match self.entries.iter().position(|e| e.slot == slot) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// 队首（最高优先级中最早入队的）
    pub fn peek_highest(&self) -> Option<usize> {
        self.entries.front().map(|e| e.slot)
    }

    /// 队首的优先级
    pub fn peek_priority(&self) -> Option<i32> {
        self.entries.front().map(|e| e.priority)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按调度顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.slot)
    }
}
