//! poller partition: capacity boundaries, the busy/done split as
//! futures complete, and re-adding a future that previously passed through
//! the same poller.

use greenloop::{Error, EventLoop, Future, Poller};

#[test]
fn poller_partitions_pending_and_done() {
    let rt = EventLoop::init();
    let poller = Poller::init(&rt, 2).expect("capacity 2 is valid");

    let f1 = Future::init(&rt);
    let f2 = Future::init(&rt);
    let f3 = Future::init(&rt);

    assert_eq!(poller.add(&f1), Ok(()));
    assert_eq!(poller.add(&f2), Ok(()));
    assert_eq!(poller.used(), 2);
    assert_eq!(poller.done(), 0);

    assert_eq!(poller.add(&f3), Err(Error::NoSpace));
    assert_eq!(poller.add(&f1), Err(Error::Already));

    f1.set_result(std::ptr::null_mut(), 1).unwrap();
    assert_eq!(poller.used(), 2);
    assert_eq!(poller.done(), 1);

    let popped = poller.pop().expect("one future is already done");
    assert!(popped.done());
    assert_eq!(poller.used(), 1);
    assert_eq!(poller.done(), 0);

    assert_eq!(poller.add(&f1), Ok(()));
    assert_eq!(poller.used(), 2);
    assert_eq!(poller.done(), 1);

    f2.set_result(std::ptr::null_mut(), 2).unwrap();
    assert_eq!(poller.used(), 2);
    assert_eq!(poller.done(), 2);

    let first = poller.pop().expect("done region has two entries");
    let second = poller.pop().expect("done region has one entry left");
    assert!(poller.pop().is_none());
    assert_eq!(poller.used(), 0);

    // Pop order among completed futures is unspecified (DESIGN.md, Design
    // Notes #1); only the unordered set of results is asserted.
    let mut values = [0, 0];
    first.result(None, Some(&mut values[0])).unwrap();
    second.result(None, Some(&mut values[1])).unwrap();
    values.sort_unstable();
    assert_eq!(values, [1, 2]);
}

#[test]
fn zero_capacity_is_rejected() {
    let rt = EventLoop::init();
    assert!(Poller::init(&rt, 0).is_none());
}

#[test]
fn add_then_rem_is_a_no_op_on_counts() {
    let rt = EventLoop::init();
    let poller = Poller::init(&rt, 4).unwrap();
    let f = Future::init(&rt);

    poller.add(&f).unwrap();
    assert_eq!((poller.used(), poller.done()), (1, 0));
    poller.rem(&f).unwrap();
    assert_eq!((poller.used(), poller.done()), (0, 0));

    assert_eq!(poller.rem(&f), Err(Error::NoEntry));
}
