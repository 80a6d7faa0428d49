//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! 进程控制块 (Process Control Block)
//!
//! 对应 Linux 内核的 `struct task_struct` (include/linux/sched.h)，
//! 但家族关系用进程表内的槽位下标表示，不持有其他记录的引用：
//! - parent / first_child / next_sibling: 槽位下标
//! - completed: 已退出、尚未被 join 的子进程（按退出顺序）
//! - zappers: 阻塞在 zap() 上等待本进程退出的进程（按 zap 顺序）

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::arch::Arch;
use crate::sched::Kernel;
use super::wait::WaitQueue;

/// 进程标识符
pub type Pid = u32;

/// 进程入口函数：参数为内核句柄和启动参数，返回值作为退出码
pub type EntryFn<A> = Arc<dyn Fn(&Kernel<A>, &str) -> i32 + Send + Sync + 'static>;

/// 未阻塞
pub const BLOCKED_NONE: i32 = 0;
/// 阻塞在 join() 上
pub const BLOCKED_JOIN: i32 = 1;
/// 阻塞在 zap() 上
pub const BLOCKED_ZAP: i32 = 2;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// 在就绪队列中等待 CPU
    Ready,
    /// 正在 CPU 上运行（任意时刻至多一个）
    Running,
    /// 等待 join / zap / unblock_proc
    Blocked,
    /// 已退出，终态
    Quit,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Ready => "READY",
            TaskState::Running => "RUNNING",
            TaskState::Blocked => "BLOCKED",
            TaskState::Quit => "QUIT",
        };
        f.pad(s)
    }
}

/// 任务标志
pub mod task_flags {
    use bitflags::bitflags;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct TaskFlags: u32 {
            /// 有进程请求终止本进程
            const ZAPPED  = 0x0000_0001;
            /// sentinel 空闲进程
            const IDLE    = 0x0000_0002;
            /// 已进入 quit()
            const EXITING = 0x0000_0004;
        }
    }
}

use task_flags::TaskFlags;

/// 进程控制块
pub struct Task<A: Arch> {
    pub(crate) pid: Pid,
    pub(crate) name: String,
    pub(crate) arg: String,
    pub(crate) entry: Option<EntryFn<A>>,

    /// 优先级，数值越小优先级越高
    pub(crate) priority: i32,
    pub(crate) state: TaskState,
    /// 累计 CPU 时间
    pub(crate) cpu_time: u64,
    /// 最近一次被调度的时刻
    pub(crate) start_time: u64,

    pub(crate) parent: Option<usize>,
    pub(crate) first_child: Option<usize>,
    pub(crate) next_sibling: Option<usize>,
    /// 尚未退出的子进程数
    pub(crate) live_children: usize,
    pub(crate) completed: WaitQueue,

    pub(crate) flags: TaskFlags,
    pub(crate) zappers: WaitQueue,
    pub(crate) exit_code: Option<i32>,
    pub(crate) blocked_reason: i32,

    pub(crate) stack_size: usize,
    pub(crate) stack: Option<A::Stack>,
    pub(crate) context: Option<Arc<A::Context>>,
}

impl<A: Arch> Task<A> {
    pub(crate) fn new(
        pid: Pid,
        name: &str,
        arg: &str,
        entry: EntryFn<A>,
        stack_size: usize,
        priority: i32,
    ) -> Self {
        Self {
            pid,
            name: String::from(name),
            arg: String::from(arg),
            entry: Some(entry),
            priority,
            state: TaskState::Ready,
            cpu_time: 0,
            start_time: 0,
            parent: None,
            first_child: None,
            next_sibling: None,
            live_children: 0,
            completed: WaitQueue::new(),
            flags: TaskFlags::empty(),
            zappers: WaitQueue::new(),
            exit_code: None,
            blocked_reason: BLOCKED_NONE,
            stack_size,
            stack: None,
            context: None,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline]
    pub fn is_zapped(&self) -> bool {
        self.flags.contains(TaskFlags::ZAPPED)
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags.contains(TaskFlags::IDLE)
    }

    /// 已进入 quit()，上下文不会再被调度
    #[inline]
    pub fn is_exiting(&self) -> bool {
        self.flags.contains(TaskFlags::EXITING)
    }

    /// 由 block_me() 阻塞（原因码高于保留阈值）
    pub fn is_blocked_by_user(&self, threshold: i32) -> bool {
        self.state == TaskState::Blocked && self.blocked_reason > threshold
    }

    /// 设置为阻塞状态
    pub(crate) fn block(&mut self, reason: i32) {
        self.state = TaskState::Blocked;
        self.blocked_reason = reason;
    }

    /// 从阻塞状态唤醒为就绪（调用者负责入队）
    pub(crate) fn wake(&mut self) {
        self.state = TaskState::Ready;
        self.blocked_reason = BLOCKED_NONE;
    }
}

/// 进程表项快照，用于诊断输出和测试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    pub slot: usize,
    pub pid: Pid,
    pub name: String,
    pub parent: Option<Pid>,
    pub priority: i32,
    pub state: TaskState,
    pub live_children: usize,
    pub cpu_time: u64,
    pub zapped: bool,
    pub blocked_reason: i32,
    pub exit_code: Option<i32>,
    pub stack_size: usize,
}

impl ProcInfo {
    /// 表头，与 `Display` 的列对齐
    pub const HEADER: &'static str =
        "SLOT  PID   PARENT  PRIO  STATUS    KIDS  CPU(ms)  ZAP  NAME";
}

impl fmt::Display for ProcInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5} {:<5} ", self.slot, self.pid)?;
        match self.parent {
            Some(ppid) => write!(f, "{:<7} ", ppid)?,
            None => write!(f, "{:<7} ", "-")?,
        }
        write!(
            f,
            "{:<5} {:<9} {:<5} {:<8} {:<4} {}",
            self.priority,
            self.state,
            self.live_children,
            self.cpu_time,
            if self.zapped { "yes" } else { "no" },
            self.name,
        )
    }
}
