//! 进程管理模块
//!
//! - `task`: 进程控制块与进程表项快照
//! - `pid`: PID 分配
//! - `wait`: 等待队列
//! - `table`: 固定容量的进程表
//! - `fork`: 进程创建
//! - `exit`: 进程退出与等待 (quit / join)
//! - `zap`: 强制终止请求
//! - `block`: 通用阻塞接口 (block_me / unblock_proc)

pub mod task;
pub mod pid;
pub mod wait;
pub mod table;
pub mod fork;
pub mod exit;
pub mod zap;
pub mod block;

pub use task::{EntryFn, Pid, ProcInfo, Task, TaskState};
pub use table::ProcTable;
