//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 调度器实现
//!
//! 单 CPU、静态优先级的抢占式调度器：
//! - 调度状态 (SchedState): 进程表 + 就绪队列 + 当前进程，由一把自旋锁保护
//! - 调度入口: dispatcher() -> Arch::context_switch()
//! - 抢占: scheduler_tick() 设置 need_resched，cond_resched() 在进程上下文中让出 CPU
//!
//! 持锁区间相当于"关中断"区间，锁总是在上下文切换之前释放。

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, MutexGuard};

use crate::arch::Arch;
use crate::config::{
    HIGHEST_PRIORITY, KERNEL_NAME, KERNEL_VERSION, MIN_STACK, QUANTUM, SENTINEL_PRIORITY,
};
use crate::errno::FatalError;
use crate::process::table::ProcTable;
use crate::process::task::{Pid, ProcInfo, TaskState};
use super::runqueue::ReadyQueue;

/// 调度事件钩子
///
/// 上层在这里挂接自己的记账逻辑。钩子在调度器锁内调用，
/// 不得回调 `Kernel` 的任何方法。
pub trait SchedHooks: Send + Sync {
    /// 新进程已创建并入队
    fn on_fork(&self, _pid: Pid) {}

    /// 进程已退出
    fn on_quit(&self, _pid: Pid) {}

    /// 即将从 `old` 切换到 `new`
    fn on_switch(&self, _old: Option<Pid>, _new: Pid) {}
}

/// 不做任何事的钩子
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SchedHooks for NoHooks {}

/// 调度状态
pub struct SchedState<A: Arch> {
    pub(crate) table: ProcTable<A>,
    pub(crate) ready: ReadyQueue,
    /// 当前运行进程的槽位（第一次调度之前为 None）
    pub(crate) current: Option<usize>,
}

impl<A: Arch> SchedState<A> {
    fn new() -> Self {
        Self {
            table: ProcTable::new(),
            ready: ReadyQueue::new(),
            current: None,
        }
    }
}

pub(crate) type RqGuard<'a, A> = MutexGuard<'a, SchedState<A>>;

/// 调度器内核
///
/// 只能通过 `Kernel::new` / `Kernel::with_hooks` 以 `Arc` 形式创建，
/// 新进程的启动闭包通过 `this` 持有内核。
pub struct Kernel<A: Arch> {
    pub(crate) arch: Arc<A>,
    pub(crate) rq: Mutex<SchedState<A>>,
    need_resched: AtomicBool,
    pub(crate) hooks: Arc<dyn SchedHooks>,
    fatal_cause: Mutex<Option<FatalError>>,
    pub(crate) this: Weak<Kernel<A>>,
}

impl<A: Arch> Kernel<A> {
    pub fn new(arch: Arc<A>) -> Arc<Self> {
        Self::with_hooks(arch, Arc::new(NoHooks))
    }

    pub fn with_hooks(arch: Arc<A>, hooks: Arc<dyn SchedHooks>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            arch,
            rq: Mutex::new(SchedState::new()),
            need_resched: AtomicBool::new(false),
            hooks,
            fatal_cause: Mutex::new(None),
            this: this.clone(),
        })
    }

    #[inline]
    pub fn arch(&self) -> &A {
        &self.arch
    }

    /// 导致 halt(1) 的不可恢复错误（如果有）
    pub fn fatal_cause(&self) -> Option<FatalError> {
        self.fatal_cause.lock().clone()
    }

    // ========================================================================
    // 启动
    // ========================================================================

    /// 启动内核
    ///
    /// 注册时钟中断处理函数，创建 sentinel（不调度），
    /// 然后以最高优先级 fork `start1`，由此进入第一次调度。
    /// 整机 halt 之前不会返回。
    pub fn startup<F>(&self, start1: F)
    where
        F: Fn(&Kernel<A>, &str) -> i32 + Send + Sync + 'static,
    {
        log::info!("startup(): booting {} v{}", KERNEL_NAME, KERNEL_VERSION);

        let weak = self.this.clone();
        self.arch.register_clock_handler(Box::new(move || {
            if let Some(kernel) = weak.upgrade() {
                kernel.scheduler_tick();
            }
        }));

        if let Err(err) = self.spawn(
            "sentinel",
            "",
            |kernel, _| kernel.sentinel(),
            MIN_STACK,
            SENTINEL_PRIORITY,
            true,
        ) {
            self.fatal(FatalError::BootFailure { name: "sentinel", err });
        }

        log::info!("startup(): calling fork() for start1");
        if let Err(err) = self.fork("start1", start1, None, 2 * MIN_STACK, HIGHEST_PRIORITY) {
            self.fatal(FatalError::BootFailure { name: "start1", err });
        }

        log::warn!("startup(): returned from the first dispatch");
    }

    // ========================================================================
    // 调度
    // ========================================================================

    /// 调度器
    ///
    /// 选择下一个运行的进程并切换过去。调用者持有调度器锁，
    /// 锁在上下文切换之前释放。
    pub(crate) fn dispatcher(&self, mut rq: RqGuard<'_, A>) {
        self.need_resched.store(false, Ordering::Release);
        let now = self.arch.sys_clock();
        let st = &mut *rq;
        let prev = st.current;

        if let Some(prev) = prev {
            let (state, priority, start) = {
                let task = &st.table[prev];
                (task.state, task.priority, task.start_time)
            };
            if state == TaskState::Running {
                let in_slice = now.saturating_sub(start) < QUANTUM;
                let best = st.ready.peek_priority();
                if in_slice && best.map_or(true, |best| priority <= best) {
                    return;
                }
                // 仍可运行：先放回就绪队列，再选择队首
                st.table[prev].state = TaskState::Ready;
                st.ready.insert(prev, priority);
            }
            let task = &mut st.table[prev];
            task.cpu_time += now.saturating_sub(start);
        }

        let Some(next) = st.ready.peek_highest() else {
            drop(rq);
            self.fatal(FatalError::NoRunnableProcess);
        };
        st.ready.remove(next);
        {
            let task = &mut st.table[next];
            task.state = TaskState::Running;
            task.start_time = now;
        }
        st.current = Some(next);

        if prev == Some(next) {
            return;
        }

        let new_pid = st.table[next].pid;
        let old_pid = prev.map(|slot| st.table[slot].pid);
        // 已退出进程的上下文随本次切换一起释放
        let exiting = prev.map_or(false, |slot| st.table[slot].is_exiting());
        let old_ctx = match prev {
            Some(slot) if exiting => st.table[slot].context.take(),
            Some(slot) => st.table[slot].context.clone(),
            None => None,
        };
        let Some(new_ctx) = st.table[next].context.clone() else {
            drop(rq);
            self.fatal(FatalError::NoRunnableProcess);
        };

        self.hooks.on_switch(old_pid, new_pid);
        log::debug!("dispatcher(): switch {:?} -> {}", old_pid, new_pid);
        drop(rq);

        match old_ctx {
            Some(old) if exiting => self.arch.context_exit(&old, new_ctx),
            old => self.arch.context_switch(old.as_deref(), &new_ctx),
        }
    }

    /// 时钟中断处理
    ///
    /// 可在异步上下文中调用，只检查时间片并设置 need_resched
    pub fn scheduler_tick(&self) {
        let now = self.arch.sys_clock();
        let rq = self.rq.lock();
        if let Some(cur) = rq.current {
            let task = &rq.table[cur];
            if task.state == TaskState::Running && now.saturating_sub(task.start_time) >= QUANTUM {
                self.set_need_resched();
            }
        }
    }

    /// 检查是否需要重新调度
    #[inline]
    pub fn need_resched(&self) -> bool {
        self.need_resched.load(Ordering::Acquire)
    }

    /// 设置重新调度标志
    #[inline]
    pub fn set_need_resched(&self) {
        self.need_resched.store(true, Ordering::Release);
    }

    /// 进程上下文中的抢占点
    ///
    /// need_resched 被设置时运行调度器。不在当前进程上下文中调用时什么也不做。
    pub fn cond_resched(&self) {
        if !self.need_resched() {
            return;
        }
        let rq = self.rq.lock();
        let Some(cur) = rq.current else {
            return;
        };
        if self.arch.on_cpu() != Some(rq.table[cur].pid) {
            return;
        }
        self.dispatcher(rq);
    }

    // ========================================================================
    // 当前进程
    // ========================================================================

    /// 当前进程的槽位，没有当前进程是致命错误
    pub(crate) fn current_slot(&self, rq: &SchedState<A>, op: &'static str) -> usize {
        match rq.current {
            Some(slot) => slot,
            None => self.fatal(FatalError::NoCurrentProcess { op }),
        }
    }

    /// 当前进程是否被 zap（不是抢占点）
    pub(crate) fn current_zapped(&self) -> bool {
        let rq = self.rq.lock();
        rq.current.map_or(false, |cur| rq.table[cur].is_zapped())
    }

    /// 特权检查：调用代码必须运行在当前进程的上下文中
    pub(crate) fn check_mode(&self, op: &'static str) {
        let current = {
            let rq = self.rq.lock();
            rq.current.map(|cur| rq.table[cur].pid)
        };
        if self.arch.on_cpu() != current {
            self.fatal(FatalError::ModeViolation { op });
        }
    }

    /// 当前进程的 PID
    pub fn getpid(&self) -> Pid {
        let rq = self.rq.lock();
        match rq.current {
            Some(cur) => rq.table[cur].pid,
            None => {
                drop(rq);
                self.fatal(FatalError::NoCurrentProcess { op: "getpid" })
            }
        }
    }

    /// 当前进程本次被调度以来经过的时间
    pub fn readtime(&self) -> u64 {
        let now = self.arch.sys_clock();
        let rq = self.rq.lock();
        rq.current
            .map_or(0, |cur| now.saturating_sub(rq.table[cur].start_time))
    }

    /// 当前进程最近一次被调度的时刻
    pub fn read_cur_start_time(&self) -> u64 {
        let rq = self.rq.lock();
        rq.current.map_or(0, |cur| rq.table[cur].start_time)
    }

    // ========================================================================
    // 诊断
    // ========================================================================

    /// 进程表快照（按槽位顺序）
    pub fn dump_processes(&self) -> Vec<ProcInfo> {
        let rq = self.rq.lock();
        let table = &rq.table;
        let mut out = Vec::with_capacity(table.len());
        table.for_each(|slot, task| {
            out.push(ProcInfo {
                slot,
                pid: task.pid,
                name: task.name.clone(),
                parent: task.parent.and_then(|p| table.get(p)).map(|p| p.pid),
                priority: task.priority,
                state: task.state,
                live_children: task.live_children,
                cpu_time: task.cpu_time,
                zapped: task.is_zapped(),
                blocked_reason: task.blocked_reason,
                exit_code: task.exit_code,
                stack_size: task.stack_size,
            });
        });
        out
    }

    // ========================================================================
    // 停机
    // ========================================================================

    /// 不可恢复错误：记录原因并 halt(1)
    pub fn fatal(&self, err: FatalError) -> ! {
        log::error!("{}", err);
        {
            let mut cause = self.fatal_cause.lock();
            if cause.is_none() {
                *cause = Some(err);
            }
        }
        self.arch.halt(1)
    }

    /// 停机
    pub fn halt(&self, status: i32) -> ! {
        log::info!("halt({})", status);
        self.arch.halt(status)
    }
}
