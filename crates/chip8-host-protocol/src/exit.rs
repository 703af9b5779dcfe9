//! Guest exit codes.
//!
//! The guest reports the end of every run through a single integer. `0` is a clean exit; anything
//! else is a fault. Codes above [`NETWORK_THRESHOLD`] are the HTTP status of a failed program
//! download, passed through verbatim by the guest.

use core::num::NonZeroI32;

/// Clean exit, nothing to report.
pub const CLEAN: i32 = 0;

/// Fatal error outside the VM (bad arguments, failed colour map load, ...).
pub const GENERAL: i32 = 1;

/// VM system error without a more specific code.
pub const SYSTEM_OTHER: i32 = 50;

/// VM accessed memory outside the 4KiB address space.
pub const MEMORY_BOUNDS: i32 = 51;

/// VM decoded an opcode it does not implement.
pub const INVALID_OPCODE: i32 = 52;

/// VM ran out of memory (stack overflow or program too large).
pub const OUT_OF_MEMORY: i32 = 53;

/// Exit codes strictly above this value are HTTP status codes from the program fetch.
pub const NETWORK_THRESHOLD: i32 = 100;

/// Returns true when `code` reports a failed program download.
#[inline]
pub const fn is_network_code(code: i32) -> bool {
    code > NETWORK_THRESHOLD
}

/// The single exit code a guest emits to end its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitSignal {
    pub code: i32,
}

impl ExitSignal {
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    pub const fn is_clean(self) -> bool {
        self.code == CLEAN
    }

    /// The fault code carried by this signal, or `None` for a clean exit.
    pub const fn fault_code(self) -> Option<NonZeroI32> {
        NonZeroI32::new(self.code)
    }
}

impl From<i32> for ExitSignal {
    fn from(code: i32) -> Self {
        Self::new(code)
    }
}
