//! 宿主机日志输出
//!
//! `log` crate 的后端，输出到 stderr：`[LEVEL] target: message`

use std::io::Write;
use std::str::FromStr;

use log::{LevelFilter, Metadata, Record};

use crate::config::LOG_LEVEL;

/// 日志后端
pub struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let stderr = std::io::stderr();
            let mut out = stderr.lock();
            let _ = writeln!(
                out,
                "[{:5}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: KernelLogger = KernelLogger;

/// Kernel.toml 中配置的日志级别，无法识别时为 Info
pub fn configured_level() -> LevelFilter {
    LevelFilter::from_str(LOG_LEVEL).unwrap_or(LevelFilter::Info)
}

/// 以配置的级别安装日志后端
pub fn init() {
    init_with_level(configured_level());
}

/// 以给定级别安装日志后端，重复安装时只更新级别
pub fn init_with_level(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
