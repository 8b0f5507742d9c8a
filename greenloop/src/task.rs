//! Tasks: a closure running on its own stack, cooperatively scheduled.

use std::cell::{Cell, RefCell, UnsafeCell};
use std::panic::Location;
use std::rc::Rc;

use crate::context::{self, Registers};
use crate::error::{Error, Result};
use crate::event_loop::EventLoop;

/// A task's lifecycle state. A *pending* task sits in its loop's ready
/// queue; a *blocked* one has yielded and is not (yet) re-queued by
/// anything in this core; *running* is held by at most one task at a time;
/// *stopped* is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Reserved for the `wait(poller)` extension point (DESIGN.md Open
    /// Question #2): no code path in this crate constructs it yet, since
    /// the only suspension this core implements is `yield_now`, which
    /// always re-enqueues as `Pending`.
    Blocked,
    Pending,
    Running,
    Stopped,
}

pub(crate) struct TaskInner {
    loop_: EventLoop,
    id: u64,
    entry: RefCell<Option<Box<dyn FnOnce(EventLoop) -> i32>>>,
    state: Cell<TaskState>,
    scheduled_tick: Cell<u64>,
    result: Cell<i32>,
    source: RefCell<String>,
    // Boxed so the backing allocation never moves once `context.rsp` has
    // been computed to point into it.
    stack: RefCell<Box<[u8]>>,
    context: UnsafeCell<Registers>,
}

/// A coroutine, running on its own private stack, scheduled cooperatively
/// by the [`EventLoop`] it was spawned on. Cloning a `Task` is
/// `task_acquire`; letting the last clone drop is `task_release`.
#[derive(Clone)]
pub struct Task(Rc<TaskInner>);

impl Task {
    /// Spawns a new task on `loop_` and enqueues it at the ready-queue
    /// tail. `stack_size` of `0` uses [`context::DEFAULT_STACK_SIZE`]. The
    /// entry closure is handed a fresh handle to `loop_` so it can yield or
    /// spawn further tasks; its return value becomes [`Task::result`].
    ///
    /// Fails with [`Error::NoMemory`] if the stack allocation fails; in
    /// that case no task is created and the ready queue is untouched.
    #[track_caller]
    pub fn spawn<F>(loop_: &EventLoop, stack_size: usize, entry: F) -> Result<Task>
    where
        F: FnOnce(EventLoop) -> i32 + 'static,
    {
        let source = Location::caller();
        let size = if stack_size == 0 {
            context::DEFAULT_STACK_SIZE
        } else {
            stack_size
        };

        let mut stack = Vec::new();
        stack.try_reserve_exact(size).map_err(|_| Error::NoMemory)?;
        stack.resize(size, 0u8);

        let inner = Rc::new(TaskInner {
            loop_: loop_.clone(),
            id: loop_.next_task_id(),
            entry: RefCell::new(Some(Box::new(entry))),
            state: Cell::new(TaskState::Pending),
            scheduled_tick: Cell::new(loop_.current_tick()),
            result: Cell::new(0),
            source: RefCell::new(format!("{source}")),
            stack: RefCell::new(stack.into_boxed_slice()),
            context: UnsafeCell::new(Registers::new()),
        });

        // The task's self-reference, carried across the first switch in a
        // callee-saved register. `bootstrap` reconstructs it, and
        // `EventLoop::reclaim_stopped` is the only place that ever drops
        // it, once control has safely returned to the loop's own stack.
        let self_ref = Rc::into_raw(Rc::clone(&inner)) as u64;

        {
            let mut stack = inner.stack.borrow_mut();
            let regs = Registers::prepare(&mut stack[..], bootstrap, self_ref);
            unsafe {
                *inner.context.get() = regs;
            }
        }

        let task = Task(inner);
        loop_.push_ready(task.clone());
        Ok(task)
    }

    pub fn state(&self) -> TaskState {
        self.0.state.get()
    }

    /// The task's return value. Only meaningful once
    /// `state() == TaskState::Stopped`; asserts otherwise, matching the
    /// original's `green_coroutine_result`.
    pub fn result(&self) -> i32 {
        debug_assert_eq!(self.0.state.get(), TaskState::Stopped);
        self.0.result.get()
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn acquire(&self) -> Task {
        self.clone()
    }

    pub fn release(self) {
        drop(self);
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.0.state.set(state);
    }

    pub(crate) fn scheduled_tick(&self) -> u64 {
        self.0.scheduled_tick.get()
    }

    pub(crate) fn set_scheduled_tick(&self, tick: u64) {
        self.0.scheduled_tick.set(tick);
    }

    pub(crate) fn set_source(&self, location: &Location<'_>) {
        *self.0.source.borrow_mut() = format!("{location}");
    }

    pub(crate) fn ptr_eq(&self, other: &Task) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const TaskInner {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn context_ptr(&self) -> *const Registers {
        self.0.context.get()
    }

    pub(crate) fn context_mut_ptr(&self) -> *mut Registers {
        self.0.context.get()
    }
}

/// Runs once, at the bottom of a freshly created stack, the first (and
/// only) time a task is switched into. Mirrors `_coroutine` in the C
/// original: holds an extra reference for the duration of the call, runs
/// the entry point, marks the task stopped, then switches away for good.
///
/// # Safety
/// `task_ptr` must be a pointer previously produced by `Rc::into_raw` on an
/// `Rc<TaskInner>`, threaded through unmodified by `Registers::prepare` and
/// `context::swap`.
unsafe extern "C" fn bootstrap(task_ptr: u64) -> ! {
    let task = Rc::from_raw(task_ptr as *const TaskInner);
    debug_assert_eq!(task.state.get(), TaskState::Running);

    let entry = task
        .entry
        .borrow_mut()
        .take()
        .expect("task entry point already consumed");
    let result = entry(task.loop_.clone());

    debug_assert_eq!(task.state.get(), TaskState::Running);
    task.result.set(result);
    task.state.set(TaskState::Stopped);

    // Guaranteed to be at the ready-queue head: the loop chose it.
    task.loop_.pop_ready_head_expect(&Task(Rc::clone(&task)));

    let loop_ctx = task.loop_.context_ptr();
    let mut discarded = Registers::new();

    // Leak the self-reference again. `EventLoop::reclaim_stopped` picks it
    // back up right after this swap returns control to the loop — never
    // from here, which would free this very stack while still running on
    // it (see DESIGN.md).
    std::mem::forget(task);

    context::swap(&mut discarded, loop_ctx);
    unreachable!("a stopped task's stack is never resumed");
}
