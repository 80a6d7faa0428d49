//! sentinel 空闲进程
//!
//! 优先级最低（SENTINEL_PRIORITY），只有在没有其他进程就绪时才会运行。
//! 它一旦运行，说明剩下的进程要么全部退出（正常停机），
//! 要么全部阻塞且无人能唤醒（死锁）。

use alloc::vec::Vec;

use crate::arch::Arch;
use crate::process::task::{Pid, TaskState};
use super::Kernel;

impl<A: Arch> Kernel<A> {
    /// sentinel 的主循环
    pub(crate) fn sentinel(&self) -> ! {
        loop {
            self.check_deadlock();
            self.arch.waitint();
        }
    }

    /// 检查系统是否停滞
    ///
    /// - 所有非 sentinel 进程都已退出: halt(0)
    /// - 仍有进程阻塞: 记录这些进程，halt(1)
    /// - 仍有进程就绪: 返回，等待下一次中断
    pub(crate) fn check_deadlock(&self) {
        let stuck: Vec<(Pid, TaskState, i32)> = {
            let rq = self.rq.lock();
            if rq.table.unfinished().any(|(_, t)| t.state == TaskState::Ready) {
                return;
            }
            rq.table
                .unfinished()
                .map(|(_, t)| (t.pid, t.state, t.blocked_reason))
                .collect()
        };

        if stuck.is_empty() {
            log::info!("check_deadlock(): all processes completed");
            self.halt(0);
        }

        for (pid, state, reason) in &stuck {
            log::error!("check_deadlock(): process {} is {} (reason {})", pid, state, reason);
        }
        log::error!("check_deadlock(): {} process(es) stalled, halting", stuck.len());
        self.halt(1)
    }
}
