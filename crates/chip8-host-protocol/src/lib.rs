//! Host/guest contract for the CHIP-8 hosting frame.
//!
//! Three small wire surfaces cross the frame boundary:
//! - the guest's positional startup arguments ([`args`]),
//! - the guest's integer exit code ([`exit`]),
//! - the controller's boot payload, sent either as frame data attributes or as a posted message
//!   ([`message`]).
//!
//! Everything here is a stable ABI shared with the guest module and the controlling page. Changing
//! a code, an argument position or a field name is a breaking change and must bump
//! [`PROTOCOL_VERSION`].

pub mod args;
pub mod exit;
pub mod message;

pub use args::GuestArgs;
pub use exit::ExitSignal;
pub use message::BootMessage;

/// Version of the host/guest contract described by this crate.
pub const PROTOCOL_VERSION: u32 = 1;
