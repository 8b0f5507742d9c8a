//! future lifecycle: pending -> complete and pending -> cancelled,
//! with the state-machine errors each illegal transition should produce.

use greenloop::{Error, EventLoop, Future};

#[test]
fn completion_lifecycle() {
    let rt = EventLoop::init();
    let f = Future::init(&rt);

    assert!(!f.done());
    assert_eq!(f.result(None, None), Err(Error::Busy));

    assert_eq!(f.set_result(std::ptr::null_mut(), 7), Ok(()));
    assert!(f.done());
    assert!(!f.cancelled());

    let mut ptr_out: *mut () = std::ptr::null_mut();
    let mut value_out = 0;
    assert_eq!(f.result(Some(&mut ptr_out), Some(&mut value_out)), Ok(()));
    assert_eq!(value_out, 7);

    assert_eq!(f.set_result(std::ptr::null_mut(), 1), Err(Error::BadState));
}

#[test]
fn cancellation_lifecycle() {
    let rt = EventLoop::init();
    let g = Future::init(&rt);

    assert_eq!(g.cancel(), Ok(()));
    assert!(g.done());
    assert!(g.cancelled());

    assert_eq!(g.result(None, None), Err(Error::BadState));
    assert_eq!(g.set_result(std::ptr::null_mut(), 1), Err(Error::Cancelled));
    assert_eq!(g.cancel(), Err(Error::BadState));
}
