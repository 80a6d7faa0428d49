//! 内置的 start1 程序
//!
//! 演示程序按名字选择，每个程序都是一个普通的进程入口函数

use std::time::{Duration, Instant};

use procsched::config::{MIN_STACK, QUANTUM};
use procsched::HostKernel;

/// 内置程序
pub struct Program {
    pub name: &'static str,
    pub about: &'static str,
    pub start1: fn(&HostKernel, &str) -> i32,
}

pub const PROGRAMS: &[Program] = &[
    Program {
        name: "fork_join",
        about: "fork children at several priorities and join them in completion order",
        start1: fork_join,
    },
    Program {
        name: "zap",
        about: "zap a long-running worker and wait for it to quit",
        start1: zap,
    },
    Program {
        name: "preempt",
        about: "two equal-priority busy workers sharing the CPU by quantum",
        start1: preempt,
    },
    Program {
        name: "deadlock",
        about: "block every process so the sentinel halts with status 1",
        start1: deadlock,
    },
];

/// 按名字查找程序
pub fn find(name: &str) -> Option<&'static Program> {
    PROGRAMS.iter().find(|p| p.name == name)
}

fn worker(k: &HostKernel, arg: &str) -> i32 {
    println!("worker {}: running with arg '{}'", k.getpid(), arg);
    arg.parse().unwrap_or(0)
}

fn fork_join(k: &HostKernel, _arg: &str) -> i32 {
    for (priority, code) in [(4, "40"), (2, "20"), (3, "30")] {
        match k.fork("worker", worker, Some(code), MIN_STACK, priority) {
            Ok(pid) => println!("start1: forked pid {} at priority {}", pid, priority),
            Err(err) => {
                println!("start1: fork failed: {} ({})", err, err.legacy_code());
                return 1;
            }
        }
    }
    loop {
        match k.join() {
            Ok((pid, code)) => println!("start1: joined pid {} with code {}", pid, code),
            Err(err) => {
                println!("start1: join: {}", err);
                return 0;
            }
        }
    }
}

fn spinner(k: &HostKernel, _arg: &str) -> i32 {
    let mut polls: u64 = 0;
    while !k.is_zapped() {
        polls += 1;
        std::thread::sleep(Duration::from_millis(1));
    }
    println!("spinner {}: zapped after {} polls", k.getpid(), polls);
    7
}

fn zap(k: &HostKernel, _arg: &str) -> i32 {
    let target = match k.fork("spinner", spinner, None, MIN_STACK, 3) {
        Ok(pid) => pid,
        Err(err) => return err.legacy_code(),
    };
    println!("start1: zapping pid {}", target);
    if let Err(err) = k.zap(target) {
        println!("start1: zap: {}", err);
    }
    match k.join() {
        Ok((pid, code)) => println!("start1: joined pid {} with code {}", pid, code),
        Err(err) => println!("start1: join: {}", err),
    }
    0
}

fn busy(k: &HostKernel, arg: &str) -> i32 {
    let until = Instant::now() + Duration::from_millis(4 * QUANTUM);
    let mut slices = 0;
    let mut last_start = k.read_cur_start_time();
    while Instant::now() < until {
        let start = k.read_cur_start_time();
        if start != last_start {
            slices += 1;
            last_start = start;
            println!("busy {}: resumed at {} ms", arg, start);
        }
        k.cond_resched();
        std::hint::spin_loop();
    }
    slices
}

fn preempt(k: &HostKernel, _arg: &str) -> i32 {
    for name in ["A", "B"] {
        if let Err(err) = k.fork("busy", busy, Some(name), MIN_STACK, 3) {
            return err.legacy_code();
        }
    }
    while let Ok((pid, slices)) = k.join() {
        println!("start1: pid {} was preempted {} times", pid, slices);
    }
    0
}

fn sleeper(k: &HostKernel, _arg: &str) -> i32 {
    println!("sleeper {}: blocking with nobody to wake it", k.getpid());
    match k.block_me(20) {
        Ok(()) => 0,
        Err(err) => err.legacy_code(),
    }
}

fn deadlock(k: &HostKernel, _arg: &str) -> i32 {
    if let Err(err) = k.fork("sleeper", sleeper, None, MIN_STACK, 3) {
        return err.legacy_code();
    }
    let _ = k.join();
    0
}
