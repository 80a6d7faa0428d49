//! 宿主机时钟
//!
//! - `ManualClock`: 由测试代码手动推进，时间完全确定
//! - 墙上时钟: 从机器创建开始经过的毫秒数

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// 手动推进的时钟
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前时间
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    /// 时间前进 `delta`
    pub fn advance(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::AcqRel);
    }

    /// 设置当前时间
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }
}

/// 机器使用的时钟源
#[derive(Debug, Clone)]
pub(crate) enum ClockSource {
    Manual(ManualClock),
    Wall(Instant),
}

impl ClockSource {
    pub(crate) fn wall() -> Self {
        ClockSource::Wall(Instant::now())
    }

    /// 当前时间（毫秒）
    pub(crate) fn now(&self) -> u64 {
        match self {
            ClockSource::Manual(clock) => clock.now(),
            ClockSource::Wall(origin) => {
                u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
            }
        }
    }
}
