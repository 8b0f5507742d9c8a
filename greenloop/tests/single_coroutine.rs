//! single coroutine round-trip: one task that yields once then
//! returns a value, resumed by two ticks of the driving loop.

use greenloop::{yield_now, EventLoop, Task, TaskState};

#[test]
fn single_coroutine_round_trip() {
    let rt = EventLoop::init();
    let task = Task::spawn(&rt, 0, |loop_| {
        yield_now(&loop_);
        777
    })
    .expect("spawn should succeed");

    rt.tick().unwrap();
    assert_eq!(task.state(), TaskState::Pending);

    rt.tick().unwrap();
    assert_eq!(task.state(), TaskState::Stopped);
    assert_eq!(task.result(), 777);
}
