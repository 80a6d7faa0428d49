//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! procsched - 单 CPU 优先级进程调度核心
//!
//! 调度核心是 `no_std + alloc` 代码，只通过 `arch::Arch` 使用底层执行环境。
//! `host` 特性提供一个在普通操作系统上运行的后端（OS 线程模拟进程上下文）。
//!
//! 进程级接口都是 `Kernel` 的方法：
//! fork / join / quit / zap / is_zapped / block_me / unblock_proc / dump_processes

#![cfg_attr(not(any(test, feature = "host")), no_std)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod errno;
pub mod process;
pub mod sched;

#[cfg(test)]
mod tests;

pub use arch::Arch;
pub use errno::{Errno, FatalError};
pub use process::{Pid, ProcInfo, TaskState};
pub use sched::{Kernel, NoHooks, SchedHooks};

#[cfg(feature = "host")]
pub use arch::host::{HostArch, HostKernel, Machine, MachineBuilder, ManualClock, Shutdown};
