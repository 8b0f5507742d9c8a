use std::fmt;

/// The conceptual error codes from the runtime's external interface.
/// Precondition and state-machine errors are returned through this type;
/// invariant violations are `debug_assert!`/`assert!` panics instead (see
/// DESIGN.md) and are never represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Invalid,
    NoMemory,
    Busy,
    Cancelled,
    Already,
    NoEntry,
    NoSpace,
    BadState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Invalid => "invalid argument",
            Error::NoMemory => "allocation failed",
            Error::Busy => "future is still pending",
            Error::Cancelled => "future was cancelled",
            Error::Already => "already registered with a poller",
            Error::NoEntry => "not a member of this poller",
            Error::NoSpace => "poller is at capacity",
            Error::BadState => "invalid for the current state",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
