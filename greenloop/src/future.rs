//! Single-shot futures: a result cell with pending/complete/cancelled
//! states, that may belong to at most one poller at a time.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::event_loop::EventLoop;
use crate::poller::{Poller, PollerInner};

/// A future's three possible states. Transitions are one-way: `Pending` to
/// either `Complete` or `Cancelled`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    Pending,
    Complete,
    Cancelled,
}

pub(crate) struct FutureInner {
    loop_: EventLoop,
    state: Cell<FutureState>,
    result_ptr: Cell<*mut ()>,
    result_value: Cell<i32>,
    // Weak: the poller owns a strong reference to its members, not the
    // other way around, so a future never keeps a dead poller's allocation
    // alive.
    attachment: RefCell<Option<(Weak<PollerInner>, usize)>>,
}

/// A single-shot result cell. Cloning a `Future` is `future_acquire`;
/// letting the last clone drop is `future_release`.
#[derive(Clone)]
pub struct Future(Rc<FutureInner>);

impl Future {
    pub fn init(loop_: &EventLoop) -> Future {
        Future(Rc::new(FutureInner {
            loop_: loop_.clone(),
            state: Cell::new(FutureState::Pending),
            result_ptr: Cell::new(std::ptr::null_mut()),
            result_value: Cell::new(0),
            attachment: RefCell::new(None),
        }))
    }

    pub fn done(&self) -> bool {
        !matches!(self.0.state.get(), FutureState::Pending)
    }

    pub fn cancelled(&self) -> bool {
        self.0.state.get() == FutureState::Cancelled
    }

    /// Stores `(ptr, value)` and marks the future complete. `ptr` is
    /// opaque to this crate: it is never dereferenced or freed here.
    ///
    /// Fails with [`Error::Cancelled`] if the future was cancelled, or
    /// [`Error::BadState`] if it was already completed — this is a
    /// single-shot cell, results are never queued or replayed.
    pub fn set_result(&self, ptr: *mut (), value: i32) -> Result<()> {
        match self.0.state.get() {
            FutureState::Cancelled => Err(Error::Cancelled),
            FutureState::Complete => Err(Error::BadState),
            FutureState::Pending => {
                self.0.result_ptr.set(ptr);
                self.0.result_value.set(value);
                self.0.state.set(FutureState::Complete);

                if let Some((poller, slot)) = self.0.attachment.borrow().clone() {
                    if let Some(poller) = poller.upgrade() {
                        poller.promote_to_done(slot);
                    }
                }
                Ok(())
            }
        }
    }

    /// Reads the stored result. Either output may be omitted by passing
    /// `None` to request only part of the payload.
    ///
    /// Fails with [`Error::Busy`] while pending, or [`Error::BadState`] if
    /// cancelled.
    pub fn result(&self, ptr_out: Option<&mut *mut ()>, value_out: Option<&mut i32>) -> Result<()> {
        match self.0.state.get() {
            FutureState::Pending => Err(Error::Busy),
            FutureState::Cancelled => Err(Error::BadState),
            FutureState::Complete => {
                if let Some(p) = ptr_out {
                    *p = self.0.result_ptr.get();
                }
                if let Some(v) = value_out {
                    *v = self.0.result_value.get();
                }
                Ok(())
            }
        }
    }

    /// Cancels a pending future. Has no effect on anything already queued
    /// or waiting on it in this core; a producer that later calls
    /// `set_result` on a cancelled future gets [`Error::Cancelled`] back
    /// and is expected to drop its result silently.
    pub fn cancel(&self) -> Result<()> {
        if self.0.state.get() != FutureState::Pending {
            return Err(Error::BadState);
        }
        self.0.state.set(FutureState::Cancelled);
        if self.0.attachment.borrow().is_some() {
            eprintln!("future cancelled while attached to a poller; will surface as done on next pop");
        }
        Ok(())
    }

    pub fn acquire(&self) -> Future {
        self.clone()
    }

    pub fn release(self) {
        drop(self);
    }

    pub(crate) fn loop_handle(&self) -> &EventLoop {
        &self.0.loop_
    }

    pub(crate) fn state(&self) -> FutureState {
        self.0.state.get()
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.0.attachment.borrow().is_some()
    }

    pub(crate) fn slot(&self) -> Option<usize> {
        self.0.attachment.borrow().as_ref().map(|(_, slot)| *slot)
    }

    pub(crate) fn poller_is(&self, poller: &Poller) -> bool {
        self.0
            .attachment
            .borrow()
            .as_ref()
            .is_some_and(|(weak, _)| std::ptr::eq(weak.as_ptr(), poller.as_ptr()))
    }

    pub(crate) fn attach(&self, poller: &Poller, slot: usize) {
        *self.0.attachment.borrow_mut() = Some((poller.downgrade(), slot));
    }

    pub(crate) fn detach(&self) {
        *self.0.attachment.borrow_mut() = None;
    }

    pub(crate) fn set_slot(&self, slot: usize) {
        if let Some(entry) = self.0.attachment.borrow_mut().as_mut() {
            entry.1 = slot;
        }
    }
}
