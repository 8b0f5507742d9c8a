//! FIFO of N cooperative tasks: N=10 tasks each yield K=10 times; on
//! each resumption a task asserts that its global resumption index modulo
//! N equals its own number, exercising fairness, the tick barrier, and
//! stack integrity across 100 context swaps.

use std::cell::Cell;
use std::rc::Rc;

use greenloop::{yield_now, EventLoop, Task, TaskState};

#[test]
fn fifo_of_cooperative_tasks_is_fair() {
    const N: u64 = 10;
    const K: u64 = 10;

    let rt = EventLoop::init();
    let resumptions = Rc::new(Cell::new(0u64));

    let tasks: Vec<Task> = (0..N)
        .map(|number| {
            let resumptions = Rc::clone(&resumptions);
            Task::spawn(&rt, 0, move |loop_| {
                for _ in 0..K {
                    let index = resumptions.get();
                    assert_eq!(
                        index % N,
                        number,
                        "task {number} ran out of FIFO order at resumption {index}"
                    );
                    resumptions.set(index + 1);
                    yield_now(&loop_);
                }
                0
            })
            .expect("spawn should succeed")
        })
        .collect();

    for _ in 0..(K + 1) {
        rt.tick().unwrap();
    }

    assert_eq!(resumptions.get(), N * K);
    for task in &tasks {
        assert_eq!(task.state(), TaskState::Stopped);
    }
}
