//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 进程退出与等待
//!
//! - quit(): 记录退出码，把自己交给父进程的 completed 队列，
//!   唤醒等待的父进程和所有 zapper，然后让出 CPU，不再返回
//! - join(): 按退出顺序取回一个已退出的子进程，必要时阻塞等待

use crate::arch::Arch;
use crate::errno::{Errno, FatalError};
use crate::sched::Kernel;
use super::task::task_flags::TaskFlags;
use super::task::{Pid, TaskState, BLOCKED_JOIN};

impl<A: Arch> Kernel<A> {
    /// 等待一个子进程退出
    ///
    /// 返回最早退出且尚未被 join 的子进程的 (pid, 退出码)，并回收其槽位。
    ///
    /// # 错误
    /// - `NoChild`: 既没有已退出的也没有活动的子进程
    /// - `Zapped`: 阻塞等待期间被 zap
    pub fn join(&self) -> Result<(Pid, i32), Errno> {
        self.check_mode("join");

        let mut rq = self.rq.lock();
        let cur = self.current_slot(&rq, "join");

        loop {
            if let Some(child) = rq.table[cur].completed.pop() {
                rq.table.unlink_child(cur, child);
                let Some(task) = rq.table.free(child) else {
                    continue;
                };
                let code = task.exit_code.unwrap_or(0);
                log::debug!("join(): process {} collected child {} ({})", rq.table[cur].pid, task.pid, code);
                return Ok((task.pid, code));
            }

            if rq.table[cur].live_children == 0 {
                return Err(Errno::NoChild);
            }

            rq.table[cur].block(BLOCKED_JOIN);
            self.dispatcher(rq);

            rq = self.rq.lock();
            if rq.table[cur].is_zapped() {
                return Err(Errno::Zapped);
            }
        }
    }

    /// 退出当前进程
    ///
    /// 仍有活动子进程时是致命错误。
    pub fn quit(&self, code: i32) -> ! {
        self.check_mode("quit");

        let mut rq = self.rq.lock();
        let cur = self.current_slot(&rq, "quit");
        let st = &mut *rq;

        let (pid, live) = (st.table[cur].pid, st.table[cur].live_children);
        if live > 0 {
            drop(rq);
            self.fatal(FatalError::QuitWithLiveChildren { pid, live });
        }

        {
            let task = &mut st.table[cur];
            task.flags.insert(TaskFlags::EXITING);
            task.state = TaskState::Quit;
            task.exit_code = Some(code);
            task.stack = None;
            task.entry = None;
        }

        // 没有人能再 join 这些子进程了
        let orphans = st.table[cur].completed.take_all();
        for child in orphans {
            st.table.unlink_child(cur, child);
            st.table.free(child);
        }

        if let Some(parent) = st.table[cur].parent {
            let p = &mut st.table[parent];
            p.live_children = p.live_children.saturating_sub(1);
            p.completed.add(cur);
            if p.state == TaskState::Blocked && p.blocked_reason == BLOCKED_JOIN {
                p.wake();
                let priority = p.priority;
                st.ready.insert(parent, priority);
            }
        }

        let zappers = st.table[cur].zappers.take_all();
        for zapper in zappers {
            let z = &mut st.table[zapper];
            if z.state == TaskState::Blocked {
                z.wake();
                let priority = z.priority;
                st.ready.insert(zapper, priority);
            }
        }

        self.hooks.on_quit(pid);
        log::debug!("quit(): process {} exited with {}", pid, code);

        self.dispatcher(rq);
        self.fatal(FatalError::QuitReturned { pid })
    }
}
