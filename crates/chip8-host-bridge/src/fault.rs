//! Guest exit code → user-facing diagnostic.

use core::fmt;
use core::num::NonZeroI32;

use chip8_host_protocol::exit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCategory {
    Network,
    MemoryBounds,
    InvalidOpcode,
    OutOfMemory,
    General,
}

/// Coarse error class a fault belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// The guest could not download its program.
    TransportFault,
    /// A VM invariant was violated (bad address, bad opcode, out of memory).
    RuntimeFault,
    /// Any other nonzero code.
    UnknownFault,
}

impl FaultCategory {
    pub const fn class(self) -> FaultClass {
        match self {
            FaultCategory::Network => FaultClass::TransportFault,
            FaultCategory::MemoryBounds
            | FaultCategory::InvalidOpcode
            | FaultCategory::OutOfMemory => FaultClass::RuntimeFault,
            FaultCategory::General => FaultClass::UnknownFault,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub code: NonZeroI32,
    pub category: FaultCategory,
    pub message: String,
}

impl FaultRecord {
    pub fn class(&self) -> FaultClass {
        self.category.class()
    }

    /// Multi-line diagnostic block shown in place of the display surface.
    pub fn banner(&self) -> String {
        format!(
            "+++ Guru Meditation!\n+++ CODE: {}\n+++ REASON: {}",
            self.code, self.message
        )
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guest fault {}: {}", self.code, self.message)
    }
}

/// Maps a nonzero guest exit code to a [`FaultRecord`].
///
/// First match wins:
/// - `> 100`: HTTP status from the program download, [`FaultCategory::Network`]
/// - `51`: [`FaultCategory::MemoryBounds`]
/// - `52`: [`FaultCategory::InvalidOpcode`]
/// - `53`: [`FaultCategory::OutOfMemory`]
/// - anything else: [`FaultCategory::General`]
///
/// `program_name` is only used in the network message.
pub fn translate(code: NonZeroI32, program_name: &str) -> FaultRecord {
    let (category, message) = match code.get() {
        c if exit::is_network_code(c) => (
            FaultCategory::Network,
            format!("Failed to download program: {program_name}"),
        ),
        exit::MEMORY_BOUNDS => (
            FaultCategory::MemoryBounds,
            "Memory address out of bounds".to_string(),
        ),
        exit::INVALID_OPCODE => (FaultCategory::InvalidOpcode, "Invalid Opcode".to_string()),
        exit::OUT_OF_MEMORY => (FaultCategory::OutOfMemory, "Out of memory".to_string()),
        _ => (FaultCategory::General, "General error".to_string()),
    };

    FaultRecord {
        code,
        category,
        message,
    }
}
