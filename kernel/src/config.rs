//! procsched 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "procsched";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 进程表配置
// ============================================================

/// 进程表容量
pub const MAX_PROC: usize = 50;

/// 进程名最大长度（含结束符）
pub const MAX_NAME: usize = 50;

/// 启动参数最大长度（含结束符）
pub const MAX_ARG: usize = 100;

/// 最小栈大小（字节）
pub const MIN_STACK: usize = 81920;

// ============================================================
// 调度器配置
// ============================================================

/// 最高优先级（数值越小优先级越高）
pub const HIGHEST_PRIORITY: i32 = 1;

/// 用户进程可用的最低优先级
pub const LOWEST_PRIORITY: i32 = 5;

/// sentinel 专用优先级
pub const SENTINEL_PRIORITY: i32 = 6;

/// 时间片长度（时间单位）
pub const QUANTUM: u64 = 80;

/// 时钟中断周期（毫秒）
pub const CLOCK_INTERVAL_MS: u64 = 20;

/// block_me() 保留的原因码上限
pub const BLOCK_THRESHOLD: i32 = 10;

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "info";
