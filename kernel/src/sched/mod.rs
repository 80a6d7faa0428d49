//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!

//! 调度器模块
//!
//! - 就绪队列 (runqueue): 按优先级排序，同级 FIFO
//! - 调度器 (sched): 调度状态、dispatcher、时钟中断与抢占点
//! - 空闲进程 (idle): sentinel 与死锁检测
//!
//! 调度入口: dispatcher() -> Arch::context_switch()

pub mod runqueue;
pub mod sched;
pub mod idle;

pub use runqueue::ReadyQueue;
pub use sched::{Kernel, NoHooks, SchedHooks, SchedState};
