//! A single-threaded cooperative runtime: stackful tasks multiplexed by a
//! FIFO-scheduled event loop, plus single-shot futures and a poller that
//! partitions its members into pending/done regions in O(1).
//!
//! No preemption, no multi-threaded scheduling, no work stealing, no
//! cross-loop task migration, no timer wheel — an [`EventLoop`] is driven
//! entirely by repeated calls to [`EventLoop::tick`] from its owning
//! thread, and tasks suspend only by calling [`yield_now`] or returning.
//!
//! See `DESIGN.md` for how each module maps onto its source material.
#![feature(naked_functions)]

mod context;
mod error;
mod event_loop;
mod future;
mod poller;
mod task;

pub use error::{Error, Result};
pub use event_loop::{yield_now, EventLoop};
pub use future::{Future, FutureState};
pub use poller::Poller;
pub use task::{Task, TaskState};

/// Crate major version, analogous to `GREEN_MAJOR`.
pub const VERSION_MAJOR: u32 = 0;
/// Crate minor version, analogous to `GREEN_MINOR`.
pub const VERSION_MINOR: u32 = 1;
/// Crate patch version, analogous to `GREEN_PATCH`.
pub const VERSION_PATCH: u32 = 0;

/// Packed `(major * 10_000) + (minor * 100) + patch`, matching
/// `GREEN_MAKE_VERSION`/`green_version()`.
pub fn version() -> u32 {
    VERSION_MAJOR * 10_000 + VERSION_MINOR * 100 + VERSION_PATCH
}

/// `"major.minor.patch"`, matching `green_version_string()`.
pub fn version_string() -> String {
    format!("{VERSION_MAJOR}.{VERSION_MINOR}.{VERSION_PATCH}")
}

/// Library-level setup check, matching `_green_init`: `major` must match
/// this crate's major version exactly, and `minor` must not exceed this
/// crate's minor version (a caller built against an older minor release is
/// compatible; a newer one is not).
pub fn init(major: u32, minor: u32) -> Result<()> {
    if major != VERSION_MAJOR || minor > VERSION_MINOR {
        return Err(Error::Invalid);
    }
    Ok(())
}

/// No-op teardown hook, kept for interface symmetry with [`init`].
pub fn term() -> Result<()> {
    Ok(())
}
