// 测试：进程调度器
//
// 测试内容：
// 1. 优先级 1 的进程先于优先级 3 的进程被调度
// 2. 同优先级按 fork 顺序 (FIFO) 调度
// 3. getpid / readtime / read_cur_start_time
// 4. dump_processes 快照
// 5. CPU 时间记账
// 6. 调度钩子

use std::sync::{Arc, Mutex};

use crate::arch::host::{Machine, ManualClock};
use crate::config::{MIN_STACK, SENTINEL_PRIORITY};
use crate::process::task::{Pid, ProcInfo, TaskState};
use crate::sched::SchedHooks;
use super::{boot, boot_with_clock, Trace};

#[test]
fn test_priority_one_before_three() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        for (name, priority) in [("w3", 3), ("w1", 1)] {
            let t = t.clone();
            k.fork(
                name,
                move |_, _| {
                    t.push(name);
                    0
                },
                None,
                MIN_STACK,
                priority,
            )
            .unwrap();
        }
        // 同为优先级 1 的 w1 不会抢占 start1
        t.push("forked");
        k.join().unwrap();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());
    assert_eq!(trace.events(), ["forked", "w1", "w3"]);
}

#[test]
fn test_fifo_among_equal_priority() {
    let trace = Trace::new();
    let t = trace.clone();
    let shutdown = boot(move |k, _| {
        for name in ["a", "b", "c"] {
            let t = t.clone();
            k.fork(
                name,
                move |_, _| {
                    t.push(name);
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
    assert_eq!(trace.events(), ["a", "b", "c"]);
}

#[test]
fn test_getpid_and_readtime() {
    let clock = ManualClock::new();
    let c = clock.clone();
    let shutdown = boot_with_clock(clock, move |k, _| {
        assert_eq!(k.getpid(), 2);
        assert_eq!(k.read_cur_start_time(), 0);
        c.advance(30);
        assert_eq!(k.readtime(), 30);

        let c = c.clone();
        let child = k
            .fork(
                "child",
                move |k, _| {
                    // 子进程在 t=30 被调度
                    assert_eq!(k.read_cur_start_time(), 30);
                    c.advance(5);
                    assert_eq!(k.readtime(), 5);
                    k.getpid() as i32
                },
                None,
                MIN_STACK,
                3,
            )
            .unwrap();
        assert_eq!(k.join(), Ok((child, child as i32)));
        assert_eq!(k.read_cur_start_time(), 35);
        0
    });
    assert!(shutdown.is_clean());
}

#[test]
fn test_dump_processes_snapshot() {
    let dumps: Arc<Mutex<Vec<ProcInfo>>> = Arc::default();
    let d = dumps.clone();
    let shutdown = boot(move |k, _| {
        k.fork("child", |_, _| 0, Some("x"), MIN_STACK, 4).unwrap();
        *d.lock().unwrap() = k.dump_processes();
        k.join().unwrap();
        0
    });
    assert!(shutdown.is_clean());

    let dump = dumps.lock().unwrap().clone();
    assert_eq!(dump.len(), 3);

    let sentinel = &dump[0];
    assert_eq!((sentinel.pid, sentinel.name.as_str()), (1, "sentinel"));
    assert_eq!(sentinel.priority, SENTINEL_PRIORITY);
    assert_eq!(sentinel.state, TaskState::Ready);
    assert_eq!(sentinel.parent, None);

    let start1 = &dump[1];
    assert_eq!(start1.pid, 2);
    assert_eq!(start1.state, TaskState::Running);
    assert_eq!(start1.live_children, 1);
    assert_eq!(start1.stack_size, 2 * MIN_STACK);

    let child = &dump[2];
    assert_eq!(child.pid, 3);
    assert_eq!(child.parent, Some(2));
    assert_eq!(child.state, TaskState::Ready);
    assert!(!child.zapped);

    let line = child.to_string();
    assert!(line.contains("READY"));
    assert!(line.ends_with("child"));
    assert!(ProcInfo::HEADER.starts_with("SLOT"));
}

#[test]
fn test_cpu_time_accounting() {
    let clock = ManualClock::new();
    let c = clock.clone();
    let shutdown = boot_with_clock(clock, move |k, _| {
        c.advance(30);
        let c = c.clone();
        k.fork(
            "child",
            move |_, _| {
                c.advance(20);
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
    assert!(shutdown.is_clean());
    // start1 在 t=30 让出 CPU，t=50 恢复后立即退出
    assert_eq!(shutdown.process(2).unwrap().cpu_time, 30);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl SchedHooks for Recorder {
    fn on_fork(&self, pid: Pid) {
        self.events.lock().unwrap().push(format!("fork {}", pid));
    }

    fn on_quit(&self, pid: Pid) {
        self.events.lock().unwrap().push(format!("quit {}", pid));
    }

    fn on_switch(&self, old: Option<Pid>, new: Pid) {
        self.events.lock().unwrap().push(format!("switch {:?} {}", old, new));
    }
}

#[test]
fn test_hooks_observe_scheduling() {
    let recorder = Arc::new(Recorder::default());
    let shutdown = Machine::builder()
        .manual_clock(ManualClock::new())
        .hooks(recorder.clone())
        .build()
        .run(|k, _| {
            k.fork("child", |_, _| 0, None, MIN_STACK, 3).unwrap();
            k.join().unwrap();
            0
        });
    assert!(shutdown.is_clean());
    assert_eq!(
        *recorder.events.lock().unwrap(),
        [
            "fork 1",
            "fork 2",
            "switch None 2",
            "fork 3",
            "switch Some(2) 3",
            "quit 3",
            "switch Some(3) 2",
            "quit 2",
            "switch Some(2) 1",
        ]
    );
}
