//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 错误代码定义
//!
//! 两类错误：
//! - `Errno`: 可恢复错误，通过 `Result` 返回给调用进程
//! - `FatalError`: 不可恢复错误，记录原因后整机 halt(1)

use core::fmt;

use crate::process::task::Pid;

/// 可恢复错误代码
///
/// 判别值沿用 Linux errno (include/uapi/asm-generic/errno-base.h)，
/// `legacy_code()` 给出进程级 API 的经典返回值 (-1 / -2)
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// 目标进程不是由 block_me() 阻塞的 (EPERM, 1)
    NotBlocked = 1,

    /// 没有该进程 (ESRCH, 3)
    NoSuchProcess = 3,

    /// 等待期间调用者被 zap (EINTR, 4)
    Zapped = 4,

    /// 没有子进程 (ECHILD, 10)
    NoChild = 10,

    /// 进程表已满 (EAGAIN, 11)
    TableFull = 11,

    /// 无法分配栈或上下文 (ENOMEM, 12)
    OutOfMemory = 12,

    /// 优先级超出范围 (EINVAL, 22)
    InvalidPriority = 22,

    /// 栈太小 (ERANGE, 34)
    StackTooSmall = 34,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 进程级 API 的经典返回码
    ///
    /// - fork: 表满/优先级非法 -1，栈太小 -2
    /// - join: 被 zap -1，没有子进程 -2
    /// - zap / block_me: 被 zap -1
    /// - unblock_proc: 调用者被 zap -1，目标非法 -2
    pub const fn legacy_code(self) -> i32 {
        match self {
            Errno::TableFull | Errno::InvalidPriority | Errno::OutOfMemory => -1,
            Errno::Zapped => -1,
            Errno::StackTooSmall | Errno::NoChild => -2,
            Errno::NoSuchProcess | Errno::NotBlocked => -2,
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Errno::NotBlocked => "process is not blocked by block_me",
            Errno::NoSuchProcess => "no such process",
            Errno::Zapped => "zapped while waiting",
            Errno::NoChild => "no child processes",
            Errno::TableFull => "process table full",
            Errno::OutOfMemory => "cannot allocate stack",
            Errno::InvalidPriority => "priority out of range",
            Errno::StackTooSmall => "stack size too small",
        };
        f.write_str(msg)
    }
}

/// 不可恢复错误
///
/// 这些都是调用代码的编程错误，内核记录原因后 halt(1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// 进程名过长
    NameTooLong { len: usize },
    /// 启动参数过长
    ArgTooLong { len: usize },
    /// 仍有活动子进程时调用 quit
    QuitWithLiveChildren { pid: Pid, live: usize },
    /// zap 自己
    ZapSelf { pid: Pid },
    /// zap 不存在的进程
    ZapNoSuchProcess { pid: Pid },
    /// block_me 使用了保留的原因码
    ReservedBlockReason { reason: i32 },
    /// 特权操作在错误的执行上下文中调用
    ModeViolation { op: &'static str },
    /// 需要当前进程的操作在没有当前进程时调用
    NoCurrentProcess { op: &'static str },
    /// 就绪队列为空且当前进程不可运行
    NoRunnableProcess,
    /// quit 之后控制流又回到了调用者
    QuitReturned { pid: Pid },
    /// 启动 sentinel 或 start1 失败
    BootFailure { name: &'static str, err: Errno },
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::NameTooLong { len } => {
                write!(f, "fork(): process name too long ({} bytes)", len)
            }
            FatalError::ArgTooLong { len } => {
                write!(f, "fork(): argument too long ({} bytes)", len)
            }
            FatalError::QuitWithLiveChildren { pid, live } => {
                write!(f, "quit(): process {} has {} active children", pid, live)
            }
            FatalError::ZapSelf { pid } => write!(f, "zap(): process {} tried to zap itself", pid),
            FatalError::ZapNoSuchProcess { pid } => {
                write!(f, "zap(): process {} does not exist", pid)
            }
            FatalError::ReservedBlockReason { reason } => {
                write!(f, "block_me(): reserved block reason {}", reason)
            }
            FatalError::ModeViolation { op } => {
                write!(f, "{}: called outside the running process context", op)
            }
            FatalError::NoCurrentProcess { op } => write!(f, "{}: no current process", op),
            FatalError::NoRunnableProcess => f.write_str("dispatcher: no runnable process"),
            FatalError::QuitReturned { pid } => {
                write!(f, "quit(): process {} returned from dispatcher", pid)
            }
            FatalError::BootFailure { name, err } => {
                write!(f, "startup(): fork of {} failed: {}", name, err)
            }
        }
    }
}
