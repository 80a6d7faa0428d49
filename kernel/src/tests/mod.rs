//! 单元测试模块
//!
//! - `NullArch`: 不切换上下文的空执行环境，用于进程表和调度器的单元测试
//! - 场景测试: 在宿主机后端上启动一台手动时钟、无时钟中断的机器，
//!   每个交错顺序都是确定的
//!
//! 运行测试：
//! ```bash
//! cargo test --package procsched
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::arch::{Arch, ClockHandler, LaunchFn};
use crate::process::task::Pid;

#[cfg(feature = "host")]
pub mod zap;
#[cfg(feature = "host")]
pub mod scheduler;
#[cfg(feature = "host")]
pub mod preemptive_scheduler;

/// 空执行环境
///
/// context_switch 只记录切换，调用者直接继续执行
#[derive(Default)]
pub(crate) struct NullArch {
    pub(crate) now: AtomicU64,
    pub(crate) no_stack: AtomicBool,
    pub(crate) switches: spin::Mutex<Vec<(Option<Pid>, Pid)>>,
}

impl NullArch {
    pub(crate) fn switches(&self) -> Vec<(Option<Pid>, Pid)> {
        self.switches.lock().clone()
    }
}

impl Arch for NullArch {
    type Context = Pid;
    type Stack = ();

    fn alloc_stack(&self, _size: usize) -> Option<()> {
        if self.no_stack.load(Ordering::SeqCst) {
            None
        } else {
            Some(())
        }
    }

    fn context_init(
        &self,
        pid: Pid,
        _name: &str,
        _stack: &(),
        _launch: LaunchFn,
    ) -> Option<Arc<Pid>> {
        Some(Arc::new(pid))
    }

    fn context_switch(&self, old: Option<&Pid>, new: &Pid) {
        self.switches.lock().push((old.copied(), *new));
    }

    fn context_exit(&self, old: &Pid, new: Arc<Pid>) -> ! {
        self.switches.lock().push((Some(*old), *new));
        panic!("context_exit({} -> {})", old, new)
    }

    fn sys_clock(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn register_clock_handler(&self, _handler: ClockHandler) {}

    fn halt(&self, status: i32) -> ! {
        panic!("halt({})", status)
    }

    fn waitint(&self) {}

    fn on_cpu(&self) -> Option<Pid> {
        None
    }
}

#[cfg(feature = "host")]
pub(crate) use host_support::*;

#[cfg(feature = "host")]
mod host_support {
    use std::string::String;
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    use crate::arch::host::{HostKernel, Machine, ManualClock, Shutdown};

    /// 用新的手动时钟启动一台机器
    pub(crate) fn boot<F>(start1: F) -> Shutdown
    where
        F: Fn(&HostKernel, &str) -> i32 + Send + Sync + 'static,
    {
        boot_with_clock(ManualClock::new(), start1)
    }

    /// 用给定的手动时钟启动一台机器
    pub(crate) fn boot_with_clock<F>(clock: ManualClock, start1: F) -> Shutdown
    where
        F: Fn(&HostKernel, &str) -> i32 + Send + Sync + 'static,
    {
        Machine::builder().manual_clock(clock).build().run(start1)
    }

    /// 按发生顺序记录的事件
    #[derive(Clone, Default)]
    pub(crate) struct Trace(Arc<Mutex<Vec<String>>>);

    impl Trace {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push(&self, event: impl Into<String>) {
            self.0.lock().unwrap().push(event.into());
        }

        pub(crate) fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }
}
