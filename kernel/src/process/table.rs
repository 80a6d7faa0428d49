//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 进程表
//!
//! 固定 MAX_PROC 个槽位的 arena，槽位下标即进程记录的句柄。
//! 父子关系通过 first_child / next_sibling 串成单链表，
//! 子进程按 fork 顺序排列。

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::arch::Arch;
use crate::config::{HIGHEST_PRIORITY, LOWEST_PRIORITY, MAX_PROC, MIN_STACK, SENTINEL_PRIORITY};
use crate::errno::Errno;
use super::pid::PidAllocator;
use super::task::{EntryFn, Pid, Task, TaskState};

/// 进程表
pub struct ProcTable<A: Arch> {
    slots: Vec<Option<Task<A>>>,
    pids: PidAllocator,
}

impl<A: Arch> ProcTable<A> {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_PROC);
        slots.resize_with(MAX_PROC, || None);
        Self {
            slots,
            pids: PidAllocator::new(),
        }
    }

    /// 分配一个槽位并初始化进程记录
    ///
    /// 检查顺序：栈大小、优先级、容量。只有成功找到槽位后才消耗 PID。
    /// `allow_sentinel` 为 true 时允许 SENTINEL_PRIORITY（仅启动流程使用）。
    pub fn allocate(
        &mut self,
        name: &str,
        arg: &str,
        entry: EntryFn<A>,
        stack_size: usize,
        priority: i32,
        allow_sentinel: bool,
    ) -> Result<usize, Errno> {
        if stack_size < MIN_STACK {
            return Err(Errno::StackTooSmall);
        }
        let valid = (HIGHEST_PRIORITY..=LOWEST_PRIORITY).contains(&priority)
            || (allow_sentinel && priority == SENTINEL_PRIORITY);
        if !valid {
            return Err(Errno::InvalidPriority);
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Errno::TableFull)?;
        let pid = self.pids.alloc().ok_or(Errno::TableFull)?;

        self.slots[slot] = Some(Task::new(pid, name, arg, entry, stack_size, priority));
        Ok(slot)
    }

    /// 释放槽位，返回被移除的记录
    pub fn free(&mut self, slot: usize) -> Option<Task<A>> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// 按 PID 查找槽位
    pub fn lookup(&self, pid: Pid) -> Option<usize> {
        self.iter().find(|(_, t)| t.pid == pid).map(|(slot, _)| slot)
    }

    pub fn get(&self, slot: usize) -> Option<&Task<A>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Task<A>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// 遍历所有已占用的槽位
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Task<A>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, t)| t.as_ref().map(|t| (slot, t)))
    }

    /// 对每个已占用的槽位调用 `f`
    pub fn for_each<F: FnMut(usize, &Task<A>)>(&self, mut f: F) {
        for (slot, task) in self.iter() {
            f(slot, task);
        }
    }

    /// 已占用的槽位数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|t| t.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 将 `child` 追加到 `parent` 的子进程链表末尾
    pub fn add_child(&mut self, parent: usize, child: usize) {
        let mut cursor = self[parent].first_child;
        let mut last = None;
        while let Some(slot) = cursor {
            last = Some(slot);
            cursor = self[slot].next_sibling;
        }
        match last {
            Some(last) => self[last].next_sibling = Some(child),
            None => self[parent].first_child = Some(child),
        }
        self[parent].live_children += 1;
        self[child].parent = Some(parent);
        self[child].next_sibling = None;
    }

    /// 将 `child` 从 `parent` 的子进程链表中摘除
    pub fn unlink_child(&mut self, parent: usize, child: usize) {
        let next = self[child].next_sibling;
        if self[parent].first_child == Some(child) {
            self[parent].first_child = next;
        } else {
            let mut cursor = self[parent].first_child;
            while let Some(slot) = cursor {
                if self[slot].next_sibling == Some(child) {
                    self[slot].next_sibling = next;
                    break;
                }
                cursor = self[slot].next_sibling;
            }
        }
        self[child].next_sibling = None;
        self[child].parent = None;
    }

    /// 除 sentinel 外仍未退出的进程
    pub fn unfinished(&self) -> impl Iterator<Item = (usize, &Task<A>)> + '_ {
        self.iter()
            .filter(|(_, t)| !t.is_idle() && t.state != TaskState::Quit)
    }
}

impl<A: Arch> Default for ProcTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// 槽位必须已被占用，访问空槽位是内核的逻辑错误
impl<A: Arch> Index<usize> for ProcTable<A> {
    type Output = Task<A>;

    fn index(&self, slot: usize) -> &Task<A> {
        match self.get(slot) {
            Some(task) => task,
            None => panic!("process table: slot {} is vacant", slot),
        }
    }
}

impl<A: Arch> IndexMut<usize> for ProcTable<A> {
    fn index_mut(&mut self, slot: usize) -> &mut Task<A> {
        match self.get_mut(slot) {
            Some(task) => task,
            None => panic!("process table: slot {} is vacant", slot),
        }
    }
}
