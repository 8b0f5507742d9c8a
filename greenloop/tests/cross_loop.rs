//! cross-loop rejection: a poller and a future created on different
//! loops must never be allowed to associate.

use greenloop::{Error, EventLoop, Future, Poller};

#[test]
fn cross_loop_add_is_rejected() {
    let l1 = EventLoop::init();
    let l2 = EventLoop::init();

    let poller = Poller::init(&l1, 1).unwrap();
    let future = Future::init(&l2);

    assert_eq!(poller.add(&future), Err(Error::Invalid));
}
