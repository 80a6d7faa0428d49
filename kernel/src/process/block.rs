//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 通用阻塞接口
//!
//! 供上层（信号量、设备驱动等）使用的阻塞 / 唤醒原语。
//! 原因码 <= BLOCK_THRESHOLD 保留给内核内部（join / zap）。

use crate::arch::Arch;
use crate::config::BLOCK_THRESHOLD;
use crate::errno::{Errno, FatalError};
use crate::sched::Kernel;
use super::task::Pid;

impl<A: Arch> Kernel<A> {
    /// 以 `reason` 阻塞当前进程，直到被 unblock_proc() 唤醒
    ///
    /// # 错误
    /// - `Zapped`: 调用时已被 zap，或阻塞期间被 zap
    pub fn block_me(&self, reason: i32) -> Result<(), Errno> {
        self.check_mode("block_me");
        if reason <= BLOCK_THRESHOLD {
            self.fatal(FatalError::ReservedBlockReason { reason });
        }

        let mut rq = self.rq.lock();
        let cur = self.current_slot(&rq, "block_me");
        if rq.table[cur].is_zapped() {
            return Err(Errno::Zapped);
        }

        rq.table[cur].block(reason);
        self.dispatcher(rq);

        if self.current_zapped() {
            Err(Errno::Zapped)
        } else {
            Ok(())
        }
    }

    /// 唤醒由 block_me() 阻塞的进程 `pid`
    ///
    /// # 错误
    /// - `Zapped`: 调用者已被 zap
    /// - `NoSuchProcess`: 没有该进程
    /// - `NotBlocked`: 目标是调用者自己、未阻塞，或因内部原因阻塞
    pub fn unblock_proc(&self, pid: Pid) -> Result<(), Errno> {
        self.check_mode("unblock_proc");

        let mut rq = self.rq.lock();
        let cur = self.current_slot(&rq, "unblock_proc");
        if rq.table[cur].is_zapped() {
            return Err(Errno::Zapped);
        }

        let target = rq.table.lookup(pid).ok_or(Errno::NoSuchProcess)?;
        if target == cur || !rq.table[target].is_blocked_by_user(BLOCK_THRESHOLD) {
            return Err(Errno::NotBlocked);
        }

        let st = &mut *rq;
        let task = &mut st.table[target];
        task.wake();
        let priority = task.priority;
        st.ready.insert(target, priority);

        self.dispatcher(rq);
        Ok(())
    }
}
