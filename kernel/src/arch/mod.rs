//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 架构相关代码
//!
//! 调度核心只通过 `Arch` trait 使用底层执行环境：
//! - 栈分配
//! - 上下文初始化 / 原子切换（不透明的 continuation 句柄）
//! - 单调时钟与时钟中断注册
//! - halt 与等待中断
//!
//! 当前支持的后端：
//! - **host** - 用 OS 线程模拟进程上下文，默认启用

#[cfg(feature = "host")]
pub mod host;

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::process::task::Pid;

/// 新上下文第一次被切换到时执行的入口
pub type LaunchFn = Box<dyn FnOnce() + Send + 'static>;

/// 时钟中断处理函数
pub type ClockHandler = Box<dyn Fn() + Send + Sync + 'static>;

/// 执行环境
///
/// 对应 Linux 的 arch 层接口 (switch_to / sched_clock / machine_halt)
pub trait Arch: Send + Sync + Sized + 'static {
    /// 保存的上下文句柄，核心代码从不检查其内容
    type Context: Send + Sync + 'static;

    /// 进程拥有的栈
    type Stack: Send + 'static;

    /// 分配 `size` 字节的栈，失败返回 None
    fn alloc_stack(&self, size: usize) -> Option<Self::Stack>;

    /// 在 `stack` 上创建一个新上下文，第一次切换到它时执行 `launch`
    fn context_init(
        &self,
        pid: Pid,
        name: &str,
        stack: &Self::Stack,
        launch: LaunchFn,
    ) -> Option<Arc<Self::Context>>;

    /// 原子地从 `old` 切换到 `new`
    ///
    /// 在 `old` 的控制流中，只有当 `old` 再次被调度时才返回。
    /// `old` 为 None 表示第一次调度（启动流程）。
    fn context_switch(&self, old: Option<&Self::Context>, new: &Self::Context);

    /// 从已退出进程的上下文 `old` 切换到 `new`，不再返回
    ///
    /// `old` 之后不会再被调度，它占用的执行资源在这里释放。
    /// 必须在 `old` 自己的控制流中调用。
    fn context_exit(&self, old: &Self::Context, new: Arc<Self::Context>) -> !;

    /// 单调时钟（时间单位：毫秒）
    fn sys_clock(&self) -> u64;

    /// 注册时钟中断处理函数
    fn register_clock_handler(&self, handler: ClockHandler);

    /// 以给定状态停机
    fn halt(&self, status: i32) -> !;

    /// 空闲等待下一个中断
    fn waitint(&self);

    /// 调用方代码当前运行在哪个进程的上下文中
    ///
    /// 启动流程（第一次调度之前）返回 None
    fn on_cpu(&self) -> Option<Pid>;
}
