//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 宿主机后端
//!
//! 在普通操作系统上运行调度核心：
//! - 进程上下文: OS 线程 + 门控令牌 (context)
//! - 时钟: 手动时钟或墙上时钟，可选的时钟中断线程 (clock)
//! - halt: 记录状态，唤醒所有线程并展开它们的调用栈
//! - 日志: stderr 日志后端 (logger)
//!
//! `Machine` 把这些组装起来：启动内核，运行到 halt，返回停机报告。

pub mod clock;
pub mod context;
pub mod logger;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::arch::{Arch, ClockHandler, LaunchFn};
use crate::config::CLOCK_INTERVAL_MS;
use crate::errno::FatalError;
use crate::process::task::{Pid, ProcInfo};
use crate::sched::{Kernel, NoHooks, SchedHooks};

pub use clock::ManualClock;
pub use context::HostContext;
use context::ExitUnwind;
use clock::ClockSource;

/// 运行在宿主机后端上的内核
pub type HostKernel = Kernel<HostArch>;

static NEXT_MACHINE_ID: AtomicU64 = AtomicU64::new(1);

/// halt 时用来展开进程线程调用栈的 panic 载荷
pub(crate) struct HaltUnwind;

/// 忽略锁中毒
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 进程栈
///
/// 真正的栈由承载线程提供，这里只记录请求的大小
#[derive(Debug)]
pub struct HostStack {
    size: usize,
}

impl HostStack {
    pub fn size(&self) -> usize {
        self.size
    }
}

/// 一台机器上所有线程共享的状态
pub(crate) struct HostShared {
    pub(crate) id: u64,
    clock: ClockSource,
    tick: Option<Duration>,
    halt: Mutex<Option<i32>>,
    halted: Condvar,
    contexts: Mutex<Vec<Arc<HostContext>>>,
    /// 仍然存活的进程线程数
    pub(crate) threads: AtomicUsize,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

impl HostShared {
    fn new(clock: ClockSource, tick: Option<Duration>) -> Self {
        Self {
            id: NEXT_MACHINE_ID.fetch_add(1, Ordering::Relaxed),
            clock,
            tick,
            halt: Mutex::new(None),
            halted: Condvar::new(),
            contexts: Mutex::new(Vec::new()),
            threads: AtomicUsize::new(0),
            panic: Mutex::new(None),
        }
    }

    /// 停机：记录第一个状态，关闭所有上下文的门
    pub(crate) fn shutdown(&self, status: i32) {
        {
            let mut halt = lock(&self.halt);
            if halt.is_none() {
                *halt = Some(status);
            }
        }
        for ctx in lock(&self.contexts).iter() {
            ctx.halt();
        }
        self.halted.notify_all();
    }

    fn halt_status(&self) -> Option<i32> {
        *lock(&self.halt)
    }

    fn wait_halt(&self) -> i32 {
        let mut halt = lock(&self.halt);
        loop {
            if let Some(status) = *halt {
                return status;
            }
            halt = self
                .halted
                .wait(halt)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 最多等待 `timeout`，返回机器是否已停机
    fn wait_halt_timeout(&self, timeout: Duration) -> bool {
        let halt = lock(&self.halt);
        let (halt, _) = self
            .halted
            .wait_timeout_while(halt, timeout, |status| status.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        halt.is_some()
    }

    pub(crate) fn record_panic(&self, payload: Box<dyn Any + Send>) {
        let mut slot = lock(&self.panic);
        if slot.is_none() {
            *slot = Some(payload);
        }
    }

    fn take_panic(&self) -> Option<Box<dyn Any + Send>> {
        lock(&self.panic).take()
    }
}

/// 宿主机执行环境
pub struct HostArch {
    shared: Arc<HostShared>,
}

impl HostArch {
    fn new(clock: ClockSource, tick: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(HostShared::new(clock, tick)),
        }
    }

    /// 机器编号
    pub fn machine_id(&self) -> u64 {
        self.shared.id
    }

    /// 机器已经 halt 时的状态
    pub fn halt_status(&self) -> Option<i32> {
        self.shared.halt_status()
    }

    /// 仍然存活的进程线程数
    pub fn live_threads(&self) -> usize {
        self.shared.threads.load(Ordering::SeqCst)
    }

    /// 已登记、尚未释放的上下文数
    pub fn live_contexts(&self) -> usize {
        lock(&self.shared.contexts).len()
    }
}

impl Arch for HostArch {
    type Context = HostContext;
    type Stack = HostStack;

    fn alloc_stack(&self, size: usize) -> Option<HostStack> {
        Some(HostStack { size })
    }

    fn context_init(
        &self,
        pid: Pid,
        name: &str,
        stack: &HostStack,
        launch: LaunchFn,
    ) -> Option<Arc<HostContext>> {
        let ctx = Arc::new(HostContext::new(pid));
        lock(&self.shared.contexts).push(ctx.clone());

        match context::spawn(self.shared.clone(), ctx.clone(), name, stack.size, launch) {
            Ok(()) => Some(ctx),
            Err(err) => {
                log::warn!("host: cannot spawn thread for {}: {}", name, err);
                lock(&self.shared.contexts).retain(|c| !Arc::ptr_eq(c, &ctx));
                None
            }
        }
    }

    fn context_switch(&self, old: Option<&HostContext>, new: &HostContext) {
        new.resume();
        match old {
            Some(old) => old.park(),
            None => {
                // 启动线程交出 CPU 后只等待停机
                self.shared.wait_halt();
                panic::resume_unwind(Box::new(HaltUnwind));
            }
        }
    }

    fn context_exit(&self, old: &HostContext, new: Arc<HostContext>) -> ! {
        lock(&self.shared.contexts).retain(|c| !std::ptr::eq(Arc::as_ptr(c), old));
        // 承载线程展开结束后才交出令牌
        panic::resume_unwind(Box::new(ExitUnwind(new)))
    }

    fn sys_clock(&self) -> u64 {
        self.shared.clock.now()
    }

    fn register_clock_handler(&self, handler: ClockHandler) {
        let Some(interval) = self.shared.tick else {
            return;
        };
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(String::from("clock"))
            .spawn(move || {
                while !shared.wait_halt_timeout(interval) {
                    handler();
                }
            });
        if let Err(err) = spawned {
            log::warn!("host: cannot start clock thread: {}", err);
        }
    }

    fn halt(&self, status: i32) -> ! {
        self.shared.shutdown(status);
        panic::resume_unwind(Box::new(HaltUnwind))
    }

    fn waitint(&self) {
        let interval = self
            .shared
            .tick
            .unwrap_or(Duration::from_millis(CLOCK_INTERVAL_MS));
        if self.shared.wait_halt_timeout(interval) {
            panic::resume_unwind(Box::new(HaltUnwind));
        }
    }

    fn on_cpu(&self) -> Option<Pid> {
        context::on_cpu(self.shared.id)
    }
}

// ============================================================================
// 机器
// ============================================================================

/// 停机报告
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// halt 状态：0 正常结束，1 死锁或致命错误
    pub status: i32,
    /// 致命错误的原因
    pub cause: Option<FatalError>,
    /// 停机时的进程表
    pub processes: Vec<ProcInfo>,
}

impl Shutdown {
    /// 所有进程都已退出且没有致命错误
    pub fn is_clean(&self) -> bool {
        self.status == 0 && self.cause.is_none()
    }

    /// 按 PID 查找停机时的进程表项
    pub fn process(&self, pid: Pid) -> Option<&ProcInfo> {
        self.processes.iter().find(|p| p.pid == pid)
    }
}

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "halt({})", self.status)?;
        if let Some(cause) = &self.cause {
            writeln!(f, "cause: {}", cause)?;
        }
        writeln!(f, "{}", ProcInfo::HEADER)?;
        for proc in &self.processes {
            writeln!(f, "{}", proc)?;
        }
        Ok(())
    }
}

/// 机器构建器
///
/// 默认使用墙上时钟，时钟中断间隔 CLOCK_INTERVAL_MS。
/// 使用手动时钟时默认不启动时钟中断线程。
pub struct MachineBuilder {
    clock: Option<ManualClock>,
    tick: Option<Option<Duration>>,
    hooks: Arc<dyn SchedHooks>,
}

impl MachineBuilder {
    /// 使用手动推进的时钟
    pub fn manual_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 时钟中断间隔
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick = Some(Some(interval));
        self
    }

    /// 不产生时钟中断
    pub fn no_timer(mut self) -> Self {
        self.tick = Some(None);
        self
    }

    /// 调度事件钩子
    pub fn hooks(mut self, hooks: Arc<dyn SchedHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Machine {
        let (clock, default_tick) = match self.clock {
            Some(clock) => (ClockSource::Manual(clock), None),
            None => (
                ClockSource::wall(),
                Some(Duration::from_millis(CLOCK_INTERVAL_MS)),
            ),
        };
        let tick = self.tick.unwrap_or(default_tick);
        Machine {
            arch: Arc::new(HostArch::new(clock, tick)),
            hooks: self.hooks,
        }
    }
}

/// 一台单 CPU 宿主机
pub struct Machine {
    arch: Arc<HostArch>,
    hooks: Arc<dyn SchedHooks>,
}

impl Machine {
    pub fn builder() -> MachineBuilder {
        MachineBuilder {
            clock: None,
            tick: None,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn arch(&self) -> &HostArch {
        &self.arch
    }

    /// 启动内核并运行到 halt
    ///
    /// 进程中的 panic（例如测试断言失败）会在调用者线程上重新抛出
    pub fn run<F>(self, start1: F) -> Shutdown
    where
        F: Fn(&HostKernel, &str) -> i32 + Send + Sync + 'static,
    {
        let kernel = Kernel::with_hooks(self.arch.clone(), self.hooks);

        let booted = panic::catch_unwind(AssertUnwindSafe(|| kernel.startup(start1)));
        if let Err(payload) = booted {
            if !payload.is::<HaltUnwind>() {
                panic::resume_unwind(payload);
            }
        }
        if let Some(payload) = self.arch.shared.take_panic() {
            panic::resume_unwind(payload);
        }

        let status = self.arch.shared.halt_status().unwrap_or(1);
        let shutdown = Shutdown {
            status,
            cause: kernel.fatal_cause(),
            processes: kernel.dump_processes(),
        };
        log::info!("machine {}: halted with status {}", self.arch.machine_id(), status);
        shutdown
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
