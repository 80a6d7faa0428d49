//! 强制终止请求 (zap)
//!
//! zap 是协作式的：只设置目标的 ZAPPED 标志并阻塞调用者，
//! 目标通过 is_zapped() 发现请求后自行 quit，quit 时释放所有 zapper。

use crate::arch::Arch;
use crate::errno::{Errno, FatalError};
use crate::sched::Kernel;
use super::task::task_flags::TaskFlags;
use super::task::{Pid, TaskState, BLOCKED_ZAP};

impl<A: Arch> Kernel<A> {
    /// 请求进程 `pid` 终止，并阻塞直到它 quit
    ///
    /// 目标不存在或是调用者自己是致命错误；目标已退出时立即返回。
    /// 等待期间调用者自己被 zap 则返回 `Zapped`。
    pub fn zap(&self, pid: Pid) -> Result<(), Errno> {
        self.check_mode("zap");

        let mut rq = self.rq.lock();
        let cur = self.current_slot(&rq, "zap");
        let me = rq.table[cur].pid;

        if pid == me {
            drop(rq);
            self.fatal(FatalError::ZapSelf { pid });
        }
        let Some(target) = rq.table.lookup(pid) else {
            drop(rq);
            self.fatal(FatalError::ZapNoSuchProcess { pid });
        };

        if rq.table[target].state == TaskState::Quit {
            return Ok(());
        }

        {
            let task = &mut rq.table[target];
            task.flags.insert(TaskFlags::ZAPPED);
            task.zappers.add(cur);
        }
        rq.table[cur].block(BLOCKED_ZAP);
        log::debug!("zap(): process {} waits for {} to quit", me, pid);
        self.dispatcher(rq);

        if self.current_zapped() {
            Err(Errno::Zapped)
        } else {
            Ok(())
        }
    }

    /// 当前进程是否有未处理的 zap 请求
    ///
    /// 同时是一个抢占点，长时间运行的循环应该定期调用
    pub fn is_zapped(&self) -> bool {
        self.cond_resched();
        self.current_zapped()
    }
}
