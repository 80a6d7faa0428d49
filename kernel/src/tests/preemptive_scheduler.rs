// 测试：抢占式调度器
//
// 测试内容：
// 1. 时间片用完之前，同优先级进程不会抢占
// 2. 时间片用完后同优先级进程轮转
// 3. 没有同级进程时，时间片用完的进程继续运行（sentinel 不会被调度）
// 4. is_zapped() 是抢占点
// 5. 时钟中断线程驱动的抢占（墙上时钟）

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::arch::host::{Machine, ManualClock};
use crate::config::{MIN_STACK, QUANTUM};
use super::{boot_with_clock, Trace};

#[test]
fn test_no_preemption_within_quantum() {
    let clock = ManualClock::new();
    let trace = Trace::new();
    let (c, t) = (clock.clone(), trace.clone());
    let shutdown = boot_with_clock(clock, move |k, _| {
        for name in ["a", "b"] {
            let (c, t) = (c.clone(), t.clone());
            k.fork(
                name,
                move |k, _| {
                    t.push(format!("{} start", name));
                    c.advance(QUANTUM - 1);
                    k.scheduler_tick();
                    assert!(!k.need_resched());
                    k.cond_resched();
                    t.push(format!("{} end", name));
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        }
        k.join().unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["a start", "a end", "b start", "b end"]);
}

#[test]
fn test_quantum_expiry_round_robin() {
    let clock = ManualClock::new();
    let trace = Trace::new();
    let (c, t) = (clock.clone(), trace.clone());
    let shutdown = boot_with_clock(clock, move |k, _| {
        for name in ["a", "b"] {
            let (c, t) = (c.clone(), t.clone());
            k.fork(
                name,
                move |k, _| {
                    for round in 1..=2 {
                        t.push(format!("{}{}", name, round));
                        c.advance(QUANTUM);
                        k.scheduler_tick();
                        k.cond_resched();
                    }
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        }
        k.join().unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["a1", "b1", "a2", "b2"]);
}

#[test]
fn test_expired_quantum_without_peers_keeps_cpu() {
    let clock = ManualClock::new();
    let c = clock.clone();
    let shutdown = boot_with_clock(clock, move |k, _| {
        let c = c.clone();
        k.fork(
            "worker",
            move |k, _| {
                c.advance(QUANTUM + 20);
                k.scheduler_tick();
                assert!(k.need_resched());
                k.cond_resched();
                // 重新获得一个完整的时间片
                assert!(!k.need_resched());
                assert_eq!(k.readtime(), 0);
                assert_eq!(k.read_cur_start_time(), QUANTUM + 20);
                0
            },
            None,
            MIN_STACK,
            3,
        )
        .unwrap();
        k.join().unwrap();
        0
    });
    // sentinel 没有在 worker 仍可运行时报告死锁
    assert!(shutdown.is_clean());
}

#[test]
fn test_is_zapped_is_preemption_point() {
    let clock = ManualClock::new();
    let trace = Trace::new();
    let (c, t) = (clock.clone(), trace.clone());
    let shutdown = boot_with_clock(clock, move |k, _| {
        let (spin_clock, spin_trace) = (c.clone(), t.clone());
        let spinner = k
            .fork(
                "spinner",
                move |k, _| {
                    let mut polls = 0;
                    while !k.is_zapped() {
                        polls += 1;
                        spin_clock.advance(QUANTUM / 2);
                        k.scheduler_tick();
                    }
                    spin_trace.push(format!("spinner zapped after {} polls", polls));
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();

        let zap_trace = t.clone();
        k.fork(
            "zapper",
            move |k, _| {
                zap_trace.push("zapper runs");
                assert_eq!(k.zap(spinner), Ok(()));
                zap_trace.push("zapper done");
                0
            },
            None,
            MIN_STACK,
            3,
        )
        .unwrap();

        k.join().unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(
        trace.events(),
        ["zapper runs", "spinner zapped after 2 polls", "zapper done"]
    );
}

#[test]
fn test_timer_preempts_busy_process() {
    let other_ran = Arc::new(AtomicBool::new(false));
    let flag = other_ran.clone();
    let shutdown = Machine::builder()
        .tick_interval(Duration::from_millis(5))
        .build()
        .run(move |k, _| {
            let spin_flag = flag.clone();
            k.fork(
                "busy",
                move |k, _| {
                    let deadline = Instant::now() + Duration::from_secs(10);
                    while !spin_flag.load(Ordering::SeqCst) {
                        if Instant::now() > deadline {
                            return 1;
                        }
                        k.cond_resched();
                        std::thread::yield_now();
                    }
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();

            let peer_flag = flag.clone();
            k.fork(
                "peer",
                move |_, _| {
                    peer_flag.store(true, Ordering::SeqCst);
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();

            let (_, first) = k.join().unwrap();
            let (_, second) = k.join().unwrap();
            first + second
        });
    assert!(other_ran.load(Ordering::SeqCst));
    assert_eq!(shutdown.status, 0);
    assert_eq!(shutdown.process(2).unwrap().exit_code, Some(0));
}
