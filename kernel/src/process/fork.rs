//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 进程创建
//!
//! fork() 创建一个新进程作为调用者的最后一个子进程：
//! 1. 检查名字和参数长度（达到 MAX_NAME - 1 / MAX_ARG - 1 是致命错误）
//! 2. 在进程表中分配槽位（栈大小 / 优先级 / 容量）
//! 3. 分配栈，创建上下文，新上下文的第一段代码是 launch()
//! 4. 链接到父进程，加入就绪队列，运行调度器

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::arch::{Arch, LaunchFn};
use crate::config::{MAX_ARG, MAX_NAME};
use crate::errno::{Errno, FatalError};
use crate::sched::Kernel;
use super::task::task_flags::TaskFlags;
use super::task::Pid;

impl<A: Arch> Kernel<A> {
    /// 创建子进程
    ///
    /// `entry` 的返回值作为子进程的退出码。`arg` 为 None 时传入空字符串。
    ///
    /// # 错误
    /// - `StackTooSmall`: stack_size 小于 MIN_STACK
    /// - `InvalidPriority`: 优先级不在 HIGHEST_PRIORITY..=LOWEST_PRIORITY
    /// - `TableFull`: 进程表已满
    /// - `OutOfMemory`: 无法分配栈或上下文
    pub fn fork<F>(
        &self,
        name: &str,
        entry: F,
        arg: Option<&str>,
        stack_size: usize,
        priority: i32,
    ) -> Result<Pid, Errno>
    where
        F: Fn(&Kernel<A>, &str) -> i32 + Send + Sync + 'static,
    {
        self.check_mode("fork");

        if name.len() >= MAX_NAME - 1 {
            self.fatal(FatalError::NameTooLong { len: name.len() });
        }
        let arg = arg.unwrap_or("");
        if arg.len() >= MAX_ARG - 1 {
            self.fatal(FatalError::ArgTooLong { len: arg.len() });
        }

        self.spawn(name, arg, entry, stack_size, priority, false)
    }

    /// 创建进程的公共路径
    ///
    /// `sentinel` 为 true 时允许 SENTINEL_PRIORITY，并且不运行调度器
    /// （第二个进程存在之前不能让出 CPU）。
    pub(crate) fn spawn<F>(
        &self,
        name: &str,
        arg: &str,
        entry: F,
        stack_size: usize,
        priority: i32,
        sentinel: bool,
    ) -> Result<Pid, Errno>
    where
        F: Fn(&Kernel<A>, &str) -> i32 + Send + Sync + 'static,
    {
        let mut rq = self.rq.lock();

        let slot = rq
            .table
            .allocate(name, arg, Arc::new(entry), stack_size, priority, sentinel)
            .map_err(|err| {
                log::warn!("fork(): cannot create {}: {}", name, err);
                err
            })?;
        let pid = rq.table[slot].pid;

        let Some(stack) = self.arch.alloc_stack(stack_size) else {
            rq.table.free(slot);
            log::warn!("fork(): no stack of {} bytes for {}", stack_size, name);
            return Err(Errno::OutOfMemory);
        };

        let Some(kernel) = self.this.upgrade() else {
            rq.table.free(slot);
            return Err(Errno::OutOfMemory);
        };
        let launch: LaunchFn = Box::new(move || {
            kernel.launch();
        });
        let Some(context) = self.arch.context_init(pid, name, &stack, launch) else {
            rq.table.free(slot);
            log::warn!("fork(): cannot create context for {}", name);
            return Err(Errno::OutOfMemory);
        };

        {
            let task = &mut rq.table[slot];
            task.stack = Some(stack);
            task.context = Some(context);
            if sentinel {
                task.flags.insert(TaskFlags::IDLE);
            }
        }

        if let Some(parent) = rq.current {
            rq.table.add_child(parent, slot);
        }
        rq.ready.insert(slot, priority);
        self.hooks.on_fork(pid);
        log::debug!("fork(): created {} (pid {}, priority {})", name, pid, priority);

        if !sentinel {
            self.dispatcher(rq);
        }
        Ok(pid)
    }

    /// 新上下文执行的第一段代码
    ///
    /// 取出入口函数和参数，运行入口，以返回值调用 quit()
    pub(crate) fn launch(&self) -> ! {
        let (entry, arg) = {
            let mut rq = self.rq.lock();
            let cur = self.current_slot(&rq, "launch");
            let task = &mut rq.table[cur];
            (task.entry.take(), task.arg.clone())
        };

        let code = match entry {
            Some(entry) => entry(self, &arg),
            None => 0,
        };
        self.quit(code)
    }
}
