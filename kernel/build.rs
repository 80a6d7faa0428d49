//! procsched 构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml 配置文件
//! 2. 生成 src/config.rs 配置常量

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=build.rs");

    // Kernel.toml 缺失或损坏时回退到默认配置
    let config = match fs::read_to_string("../Kernel.toml") {
        Ok(content) => match toml::from_str::<toml::Value>(&content) {
            Ok(value) => value,
            Err(e) => {
                println!("cargo:warning=Kernel.toml parse error ({}), using defaults", e);
                toml::Value::Table(toml::map::Map::new())
            }
        },
        Err(_) => {
            println!("cargo:warning=Kernel.toml not found, using defaults");
            toml::Value::Table(toml::map::Map::new())
        }
    };

    generate_config_code(&config);
}

fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a str> {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
}

fn generate_config_code(config: &toml::Value) {
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };

    let kernel_name = get_str(config, "general", "name").unwrap_or("procsched");
    let kernel_version = get_str(config, "general", "version").unwrap_or("0.1.0");

    let highest = get_int(config, "scheduler", "highest_priority", 1);
    let lowest = get_int(config, "scheduler", "lowest_priority", 5).max(highest);
    let sentinel = get_int(config, "scheduler", "sentinel_priority", lowest + 1).max(lowest + 1);

    let config_code = format!(
        r#"//! procsched 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// 进程表配置
// ============================================================

/// 进程表容量
pub const MAX_PROC: usize = {};

/// 进程名最大长度（含结束符）
pub const MAX_NAME: usize = {};

/// 启动参数最大长度（含结束符）
pub const MAX_ARG: usize = {};

/// 最小栈大小（字节）
pub const MIN_STACK: usize = {};

// ============================================================
// 调度器配置
// ============================================================

/// 最高优先级（数值越小优先级越高）
pub const HIGHEST_PRIORITY: i32 = {};

/// 用户进程可用的最低优先级
pub const LOWEST_PRIORITY: i32 = {};

/// sentinel 专用优先级
pub const SENTINEL_PRIORITY: i32 = {};

/// 时间片长度（时间单位）
pub const QUANTUM: u64 = {};

/// 时钟中断周期（毫秒）
pub const CLOCK_INTERVAL_MS: u64 = {};

/// block_me() 保留的原因码上限
pub const BLOCK_THRESHOLD: i32 = {};

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "{}";
"#,
        kernel_name,
        kernel_version,
        get_int(config, "process", "max_proc", 50).max(2),
        get_int(config, "process", "max_name", 50).max(2),
        get_int(config, "process", "max_arg", 100).max(2),
        get_int(config, "process", "min_stack", 81920).max(4096),
        highest,
        lowest,
        sentinel,
        get_int(config, "scheduler", "quantum", 80).max(1),
        get_int(config, "scheduler", "clock_interval_ms", 20).max(1),
        get_int(config, "scheduler", "block_threshold", 10),
        get_str(config, "debug", "log_level").unwrap_or("info"),
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_code {
        if let Err(e) = fs::write(&config_file, &config_code) {
            println!("cargo:warning=failed to write {}: {}", config_file.display(), e);
        }
    }
}
