//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! procsched 演示程序
//!
//! 用法: procsched [program]
//!
//! 在宿主机后端上启动一台单 CPU 机器，运行选中的 start1 程序，
//! 停机后打印进程表并以 halt 状态退出。

mod programs;

use std::process::ExitCode;

use procsched::arch::host::logger;
use procsched::config::{KERNEL_NAME, KERNEL_VERSION};
use procsched::Machine;

fn main() -> ExitCode {
    logger::init();

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("fork_join"));
    let Some(program) = programs::find(&name) else {
        eprintln!("main: unknown program '{}'", name);
        eprintln!("available programs:");
        for p in programs::PROGRAMS {
            eprintln!("  {:<10} {}", p.name, p.about);
        }
        return ExitCode::from(2);
    };

    println!("{} v{} - {}", KERNEL_NAME, KERNEL_VERSION, program.about);
    let shutdown = Machine::new().run(program.start1);
    print!("{}", shutdown);

    ExitCode::from(u8::try_from(shutdown.status).unwrap_or(1))
}
