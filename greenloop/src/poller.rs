//! A bounded set of futures, partitioned into a "busy" (pending) region and
//! a "done" (completed) region, supporting add/remove/pop in O(1).
//!
//! The array is logically three contiguous regions:
//!
//! ```text
//! [0 .. busy)      pending futures
//! [busy .. used)   completed futures ready to be popped
//! [used .. size)   free slots
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::event_loop::EventLoop;
use crate::future::{Future, FutureState};

pub(crate) struct PollerInner {
    loop_: EventLoop,
    slots: RefCell<Vec<Option<Future>>>,
    size: usize,
    used: Cell<usize>,
    busy: Cell<usize>,
}

/// A fixed-capacity member set. Cloning a `Poller` is `poller_acquire`;
/// letting the last clone drop is `poller_release`, which detaches every
/// remaining member.
#[derive(Clone)]
pub struct Poller(Rc<PollerInner>);

impl Poller {
    /// `capacity` must be at least 1; `None` otherwise.
    pub fn init(loop_: &EventLoop, capacity: usize) -> Option<Poller> {
        if capacity == 0 {
            return None;
        }
        Some(Poller(Rc::new(PollerInner {
            loop_: loop_.clone(),
            slots: RefCell::new(vec![None; capacity]),
            size: capacity,
            used: Cell::new(0),
            busy: Cell::new(0),
        })))
    }

    pub fn size(&self) -> usize {
        self.0.size
    }

    pub fn used(&self) -> usize {
        self.0.used.get()
    }

    pub fn done(&self) -> usize {
        self.0.used.get() - self.0.busy.get()
    }

    /// Registers `future` with this poller. Rejects a future from a
    /// different loop ([`Error::Invalid`]), one already attached somewhere
    /// ([`Error::Already`]), or a poller already at capacity
    /// ([`Error::NoSpace`]).
    pub fn add(&self, future: &Future) -> Result<()> {
        if future.loop_handle() != &self.0.loop_ {
            return Err(Error::Invalid);
        }
        if future.is_attached() {
            return Err(Error::Already);
        }
        if self.0.used.get() == self.0.size {
            return Err(Error::NoSpace);
        }

        let used = self.0.used.get();
        self.0.slots.borrow_mut()[used] = Some(future.clone());
        future.attach(self, used);
        self.0.used.set(used + 1);

        if future.state() == FutureState::Pending {
            let busy = self.0.busy.get();
            self.swap_slots(used, busy);
            self.0.busy.set(busy + 1);
        }
        Ok(())
    }

    /// Removes `future`, preserving the busy/done/free partition. Rejects a
    /// future that is not a member of this poller ([`Error::NoEntry`]).
    pub fn rem(&self, future: &Future) -> Result<()> {
        if !future.poller_is(self) {
            return Err(Error::NoEntry);
        }
        let slot = future.slot().expect("attached future always has a slot");
        let used = self.0.used.get();
        let busy = self.0.busy.get();

        if slot >= busy {
            debug_assert_ne!(future.state(), FutureState::Pending);
            self.swap_slots(slot, used - 1);
        } else {
            debug_assert_eq!(future.state(), FutureState::Pending);
            self.swap_slots(slot, busy - 1);
            self.0.busy.set(busy - 1);
            self.swap_slots(self.0.busy.get(), used - 1);
        }

        self.0.used.set(used - 1);
        self.0.slots.borrow_mut()[used - 1] = None;
        future.detach();
        Ok(())
    }

    /// Pops the first completed future, or `None` if the done region is
    /// empty.
    pub fn pop(&self) -> Option<Future> {
        if self.0.busy.get() == self.0.used.get() {
            return None;
        }
        let popped = self.0.slots.borrow()[self.0.busy.get()].clone();
        let popped = popped?;
        self.rem(&popped)
            .expect("future at the done boundary must still be attached");
        Some(popped)
    }

    pub fn acquire(&self) -> Poller {
        self.clone()
    }

    pub fn release(self) {
        drop(self);
    }

    pub(crate) fn as_ptr(&self) -> *const PollerInner {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<PollerInner> {
        Rc::downgrade(&self.0)
    }

    /// Swaps the members at `i` and `j`, updating both their `slot` fields
    /// to match — the invariant every poller mutation must preserve.
    fn swap_slots(&self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let mut slots = self.0.slots.borrow_mut();
        slots.swap(i, j);
        if let Some(f) = &slots[i] {
            f.set_slot(i);
        }
        if let Some(f) = &slots[j] {
            f.set_slot(j);
        }
    }

    /// Called from `Future::set_result` when a pending, attached future
    /// completes: moves it from the busy region to the done region in
    /// O(1) by swapping it to the busy/done boundary.
    pub(crate) fn promote_to_done(&self, slot: usize) {
        let busy = self.0.busy.get();
        debug_assert!(slot < busy, "promote_to_done called on an already-done future");
        self.swap_slots(slot, busy - 1);
        self.0.busy.set(busy - 1);
    }
}

impl Drop for PollerInner {
    fn drop(&mut self) {
        for slot in self.slots.borrow_mut().iter_mut() {
            if let Some(future) = slot.take() {
                future.detach();
            }
        }
    }
}

impl PartialEq for Poller {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Poller {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_on_empty_poller_returns_none() {
        let rt = EventLoop::init();
        let poller = Poller::init(&rt, 3).unwrap();
        assert!(poller.pop().is_none());

        let f = Future::init(&rt);
        poller.add(&f).unwrap();
        assert!(poller.pop().is_none(), "f is still pending, not done");
    }

    #[test]
    fn dropping_the_poller_detaches_its_members() {
        let rt = EventLoop::init();
        let f = Future::init(&rt);
        {
            let poller = Poller::init(&rt, 1).unwrap();
            poller.add(&f).unwrap();
            assert!(f.is_attached());
        }
        assert!(!f.is_attached());
    }
}
