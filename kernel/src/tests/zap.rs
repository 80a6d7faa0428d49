//! MIT License
//!
//! Copyright (c) 2026 procsched Developers
//!
//! zap() 测试
//!
//! 测试内容：
//! 1. zap 阻塞调用者直到目标 quit
//! 2. 目标已经 quit 时立即返回
//! 3. zap 自己 / 不存在的进程是致命错误
//! 4. 多个 zapper 按 zap 顺序被释放

use crate::config::MIN_STACK;
use crate::errno::FatalError;
use super::{boot, Trace};

#[test]
fn test_zap_waits_for_target() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        let target_trace = t.clone();
        let target = k
            .fork(
                "target",
                move |k, _| {
                    target_trace.push("target running");
                    assert!(k.is_zapped());
                    target_trace.push("target quits");
                    5
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        assert_eq!(k.zap(target), Ok(()));
        t.push("zap returned");
        assert!(!k.is_zapped());
        assert_eq!(k.join(), Ok((target, 5)));
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["target running", "target quits", "zap returned"]);
}

#[test]
fn test_zap_quit_target_returns_immediately() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        let t = t.clone();
        k.fork(
            "driver",
            move |k, _| {
                // quick 优先级更高，fork 返回时已经退出但尚未被 join
                let quick = k.fork("quick", |_, _| 1, None, MIN_STACK, 3).unwrap();
                assert_eq!(k.zap(quick), Ok(()));
                t.push("zap returned");
                assert_eq!(k.join(), Ok((quick, 1)));
                0
            },
            None,
            MIN_STACK,
            4,
        )
        .unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["zap returned"]);
}

#[test]
fn test_zap_self_is_fatal() {
    let shutdown = boot(|k, _| {
        let _ = k.zap(k.getpid());
        0
    });
    assert_eq!(shutdown.status, 1);
    assert_eq!(shutdown.cause, Some(FatalError::ZapSelf { pid: 2 }));
}

#[test]
fn test_zap_nonexistent_is_fatal() {
    let shutdown = boot(|k, _| {
        let _ = k.zap(99);
        0
    });
    assert_eq!(shutdown.status, 1);
    assert_eq!(shutdown.cause, Some(FatalError::ZapNoSuchProcess { pid: 99 }));
}

#[test]
fn test_zappers_released_in_order() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        let target_trace = t.clone();
        let target = k
            .fork(
                "target",
                move |k, _| {
                    assert!(k.is_zapped());
                    target_trace.push("target quits");
                    0
                },
                None,
                MIN_STACK,
                5,
            )
            .unwrap();

        for name in ["z1", "z2"] {
            let zap_trace = t.clone();
            k.fork(
                name,
                move |k, _| {
                    zap_trace.push(format!("{} zaps", name));
                    assert_eq!(k.zap(target), Ok(()));
                    zap_trace.push(format!("{} released", name));
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        }

        for _ in 0..3 {
            k.join().unwrap();
        }
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(
        trace.events(),
        ["z1 zaps", "z2 zaps", "target quits", "z1 released", "z2 released"]
    );
}

#[test]
fn test_zap_does_not_preempt_target() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        let target_trace = t.clone();
        let target = k
            .fork(
                "target",
                move |k, _| {
                    // 被 zap 之后仍然可以继续运行，自己决定何时退出
                    assert!(k.is_zapped());
                    target_trace.push("cleanup");
                    // helper 优先级更高，join 不需要阻塞
                    let helper = k.fork("helper", |_, _| 0, None, MIN_STACK, 2).unwrap();
                    assert_eq!(k.join(), Ok((helper, 0)));
                    target_trace.push("done");
                    0
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        k.zap(target).unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["cleanup", "done"]);
}
