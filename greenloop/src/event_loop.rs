//! The loop/scheduler: owns the FIFO ready queue and tick counter, and
//! drives dispatch of tasks spawned on it.

use std::cell::{Cell, RefCell, UnsafeCell};
use std::collections::VecDeque;
use std::panic::Location;
use std::rc::Rc;

use crate::context::{self, Registers};
use crate::error::Result;
use crate::task::{Task, TaskState};

struct LoopInner {
    current_tick: Cell<u64>,
    next_task_id: Cell<u64>,
    ready: RefCell<VecDeque<Task>>,
    current: RefCell<Option<Task>>,
    // The context to which a running task's stack returns control.
    context: UnsafeCell<Registers>,
}

/// A single-threaded scheduler. Must only ever be driven (via [`tick`] or
/// [`yield_now`]) from the thread that created it — there are no atomics
/// and no locks anywhere in this core.
#[derive(Clone)]
pub struct EventLoop(Rc<LoopInner>);

impl PartialEq for EventLoop {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for EventLoop {}

impl EventLoop {
    pub fn init() -> EventLoop {
        EventLoop(Rc::new(LoopInner {
            current_tick: Cell::new(0),
            next_task_id: Cell::new(1),
            ready: RefCell::new(VecDeque::new()),
            current: RefCell::new(None),
            context: UnsafeCell::new(Registers::new()),
        }))
    }

    pub fn acquire(&self) -> EventLoop {
        self.clone()
    }

    pub fn release(self) {
        drop(self);
    }

    /// Drains the ready queue of every task eligible to run this tick: the
    /// head, repeatedly, for as long as its recorded scheduling tick does
    /// not exceed the snapshot taken at entry. A task that yields mid-tick
    /// is re-enqueued carrying the post-increment tick value, so it is
    /// skipped for the remainder of this call and only eligible again on a
    /// later one — this is the whole of the re-entrancy guarantee.
    pub fn tick(&self) -> Result<()> {
        let snapshot = self.0.current_tick.get();
        self.0.current_tick.set(snapshot + 1);

        loop {
            let head = match self.0.ready.borrow().front().cloned() {
                Some(head) => head,
                None => break,
            };
            if head.scheduled_tick() > snapshot {
                break;
            }
            debug_assert_eq!(
                head.state(),
                TaskState::Pending,
                "ready-queue invariant violated: head task is not pending"
            );

            head.set_state(TaskState::Running);
            *self.0.current.borrow_mut() = Some(head.clone());

            unsafe {
                context::swap(self.context_mut_ptr(), head.context_ptr());
            }

            *self.0.current.borrow_mut() = None;

            if head.state() == TaskState::Stopped {
                self.reclaim_stopped(&head);
            } else {
                let still_at_head = self
                    .0
                    .ready
                    .borrow()
                    .front()
                    .is_some_and(|front| front.ptr_eq(&head));
                debug_assert!(
                    !still_at_head || head.scheduled_tick() > snapshot,
                    "a task ran twice within a single tick"
                );
            }
        }

        Ok(())
    }

    pub(crate) fn current_tick(&self) -> u64 {
        self.0.current_tick.get()
    }

    pub(crate) fn next_task_id(&self) -> u64 {
        let id = self.0.next_task_id.get();
        self.0.next_task_id.set(id + 1);
        id
    }

    pub(crate) fn push_ready(&self, task: Task) {
        self.0.ready.borrow_mut().push_back(task);
    }

    /// Pops `task` from the ready-queue head. `task` is always there when
    /// this is called — either `tick` just put it there, or it put itself
    /// there on an earlier yield, and nothing else can run in between in a
    /// single-threaded cooperative scheduler.
    pub(crate) fn pop_ready_head_expect(&self, task: &Task) {
        let popped = self.0.ready.borrow_mut().pop_front();
        debug_assert!(
            popped.is_some_and(|front| front.ptr_eq(task)),
            "expected task to be at the ready-queue head"
        );
    }

    pub(crate) fn current(&self) -> Option<Task> {
        self.0.current.borrow().clone()
    }

    pub(crate) fn context_mut_ptr(&self) -> *mut Registers {
        self.0.context.get()
    }

    pub(crate) fn context_ptr(&self) -> *const Registers {
        self.0.context.get()
    }

    fn reclaim_stopped(&self, task: &Task) {
        // SAFETY: matches the strong reference `Task::spawn` leaked via
        // `Rc::into_raw` and `bootstrap` re-leaked via `mem::forget` right
        // before its final switch. Reclaiming it here, now that control has
        // safely returned to the loop's own stack, is what lets a task free
        // its own stack without freeing memory out from under code still
        // executing on it (see DESIGN.md).
        unsafe {
            drop(Rc::from_raw(task.as_ptr()));
        }
    }
}

/// Voluntary surrender of control from the currently running task back to
/// `loop_`. Re-enqueues the task at the ready-queue tail carrying the
/// current tick, so it is not eligible again until a later `tick()` call.
/// Panics (precondition violation, not a `Result`) if no task is running.
#[track_caller]
pub fn yield_now(loop_: &EventLoop) {
    let location = Location::caller();
    let task = loop_
        .current()
        .expect("yield_now called with no task currently running");
    debug_assert_eq!(task.state(), TaskState::Running);

    task.set_source(location);
    loop_.pop_ready_head_expect(&task);
    task.set_state(TaskState::Pending);
    task.set_scheduled_tick(loop_.current_tick());
    loop_.push_ready(task.clone());

    unsafe {
        context::swap(task.context_mut_ptr(), loop_.context_ptr());
    }
    // Resumed here once a later `tick()` switches back into this task.
}
