//! PID 管理
//!
//! - PID 1: sentinel 空闲进程
//! - PID 2: start1（第一个用户进程）
//! - PID 3+: 普通 PID
//!
//! PID 单调递增分配，不复用

use super::task::Pid;

/// 最大 PID 数值
pub const PID_MAX_LIMIT: Pid = 4194304;

/// sentinel 进程 PID
pub const PID_SENTINEL: Pid = 1;

/// PID 分配器
#[derive(Debug)]
pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub const fn new() -> Self {
        Self { next: PID_SENTINEL }
    }

    /// 分配一个新的 PID，用尽时返回 None
    pub fn alloc(&mut self) -> Option<Pid> {
        if self.next >= PID_MAX_LIMIT {
            return None;
        }
        let pid = self.next;
        self.next += 1;
        Some(pid)
    }

    /// 下一个将被分配的 PID
    pub fn peek(&self) -> Pid {
        self.next
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_monotonic_from_sentinel() {
        let mut pids = PidAllocator::new();
        assert_eq!(pids.alloc(), Some(PID_SENTINEL));
        assert_eq!(pids.alloc(), Some(2));
        assert_eq!(pids.alloc(), Some(3));
        assert_eq!(pids.peek(), 4);
    }

    #[test]
    fn test_pid_exhausted() {
        let mut pids = PidAllocator { next: PID_MAX_LIMIT - 1 };
        assert_eq!(pids.alloc(), Some(PID_MAX_LIMIT - 1));
        assert_eq!(pids.alloc(), None);
    }
}
