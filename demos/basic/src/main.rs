//! Drives a handful of tasks to completion, and separately shows a poller
//! multiplexing a small batch of externally-completed futures.
//!
//! Nothing here drives real I/O: `greenloop` only provides the scheduler,
//! the stack-switch primitive and the future/poller bookkeeping. Producing
//! results for a future (what a real event source would do) is always the
//! caller's job; this demo plays that role with a plain loop counter.

use greenloop::{yield_now, EventLoop, Future, Poller, Task};

fn main() {
    println!("greenloop {}", greenloop::version_string());

    run_tasks_to_completion();
    println!();
    drain_a_poller();
}

/// Spawns a few tasks that yield a handful of times each, then ticks the
/// loop until every one of them has stopped.
fn run_tasks_to_completion() {
    let rt = EventLoop::init();

    let workers: Vec<Task> = (0..3)
        .map(|id| {
            Task::spawn(&rt, 0, move |loop_| {
                for round in 0..3 {
                    println!("task {id}: round {round}");
                    yield_now(&loop_);
                }
                println!("task {id}: done");
                id * 10
            })
            .expect("stack allocation should succeed")
        })
        .collect();

    while workers.iter().any(|t| t.state() != greenloop::TaskState::Stopped) {
        rt.tick().expect("tick never fails in this core");
    }

    for (id, task) in workers.iter().enumerate() {
        println!("task {id} result: {}", task.result());
    }
}

/// Registers a batch of futures with a poller, completes them out of order
/// from outside the loop (standing in for whatever would normally wake them
/// up — a timer, a socket, a worker thread), and pops results as they
/// become available.
fn drain_a_poller() {
    let rt = EventLoop::init();
    let poller = Poller::init(&rt, 4).expect("capacity 4 is valid");

    let futures: Vec<Future> = (0..4).map(|_| Future::init(&rt)).collect();
    for f in &futures {
        poller.add(f).expect("fresh future, room in the poller");
    }

    // Complete them out of submission order, as a real producer might.
    for &i in &[2usize, 0, 3, 1] {
        futures[i]
            .set_result(std::ptr::null_mut(), (i as i32) * 100)
            .expect("each future completes exactly once");
    }

    while let Some(done) = poller.pop() {
        let mut value = 0;
        done.result(None, Some(&mut value)).expect("popped future is complete");
        println!("poller: future completed with {value}");
    }
}
