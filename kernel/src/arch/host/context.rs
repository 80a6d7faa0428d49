//! 宿主机上下文
//!
//! 每个进程上下文是一个 OS 线程，只有拿到 CPU 令牌时才会运行。
//! 令牌通过每个上下文自己的门 (Gate) 传递：
//!
//! ```text
//! Parked --resume()--> Run --park()--> Parked
//!    \                  |
//!     +----halt()-------+--> Halted (park() 展开线程调用栈)
//! ```
//!
//! context_switch(old, new) = new.resume(); old.park()，
//! 因此任意时刻最多只有一个进程线程在执行内核或用户代码。

use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::arch::LaunchFn;
use crate::process::task::Pid;
use super::{lock, HaltUnwind, HostShared};

/// 进程线程的最小栈
const HOST_THREAD_STACK: usize = 512 * 1024;

thread_local! {
    /// 当前线程承载的 (机器编号, PID)
    static ON_CPU: Cell<Option<(u64, Pid)>> = const { Cell::new(None) };
}

/// 调用线程在机器 `machine` 上承载的进程
pub(crate) fn on_cpu(machine: u64) -> Option<Pid> {
    ON_CPU
        .with(Cell::get)
        .filter(|(id, _)| *id == machine)
        .map(|(_, pid)| pid)
}

/// 已退出进程的线程展开时携带的下一个上下文
pub(crate) struct ExitUnwind(pub(crate) Arc<HostContext>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Parked,
    Run,
    Halted,
}

/// 进程上下文
#[derive(Debug)]
pub struct HostContext {
    pid: Pid,
    gate: Mutex<Gate>,
    cv: Condvar,
}

impl HostContext {
    pub(crate) fn new(pid: Pid) -> Self {
        Self {
            pid,
            gate: Mutex::new(Gate::Parked),
            cv: Condvar::new(),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// 把 CPU 令牌交给这个上下文
    pub(crate) fn resume(&self) {
        let mut gate = lock(&self.gate);
        if *gate != Gate::Halted {
            *gate = Gate::Run;
        }
        self.cv.notify_one();
    }

    /// 等待 CPU 令牌，机器 halt 时展开调用栈
    pub(crate) fn park(&self) {
        let mut gate = lock(&self.gate);
        loop {
            match *gate {
                Gate::Run => {
                    *gate = Gate::Parked;
                    return;
                }
                Gate::Halted => {
                    drop(gate);
                    panic::resume_unwind(Box::new(HaltUnwind));
                }
                Gate::Parked => {
                    gate = self
                        .cv
                        .wait(gate)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
            }
        }
    }

    /// 机器 halt：永久关闭这个门
    pub(crate) fn halt(&self) {
        *lock(&self.gate) = Gate::Halted;
        self.cv.notify_all();
    }
}

/// 为上下文创建承载线程
///
/// 线程先等待第一次被调度，然后执行 `launch`。
/// 进程退出时线程展开并结束，随后把令牌交给下一个上下文；
/// 非 halt 引起的 panic 被记录下来，并以状态 1 停机。
pub(crate) fn spawn(
    shared: Arc<HostShared>,
    ctx: Arc<HostContext>,
    name: &str,
    stack_size: usize,
    launch: LaunchFn,
) -> io::Result<()> {
    let pid = ctx.pid();
    let machine = shared.id;
    shared.threads.fetch_add(1, Ordering::SeqCst);
    let counter = shared.clone();
    thread::Builder::new()
        .name(format!("{}:{}", name, pid))
        .stack_size(stack_size.max(HOST_THREAD_STACK))
        .spawn(move || {
            ON_CPU.with(|cell| cell.set(Some((machine, pid))));
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                ctx.park();
                launch();
            }));
            drop(ctx);
            shared.threads.fetch_sub(1, Ordering::SeqCst);

            let Err(payload) = result else {
                return;
            };
            match payload.downcast::<ExitUnwind>() {
                Ok(exit) => exit.0.resume(),
                Err(payload) if payload.is::<HaltUnwind>() => {}
                Err(payload) => {
                    log::error!("host: process {} panicked", pid);
                    shared.record_panic(payload);
                    shared.shutdown(1);
                }
            }
        })
        .map(|_| ())
        .map_err(|err| {
            counter.threads.fetch_sub(1, Ordering::SeqCst);
            err
        })
}
