//! Browser bindings for the CHIP-8 host bridge.
//!
//! The hosting frame calls `bootFromFrameAttributes` or `listenForBootMessages` once its
//! document has loaded; the controlling page drives it through the `PageController` class.

#![forbid(unsafe_code)]

// Everything here talks to the DOM; on other targets the crate is empty.
#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod error;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod go;
#[cfg(target_arch = "wasm32")]
mod page;

#[cfg(target_arch = "wasm32")]
pub use dom::DomSurface;
#[cfg(target_arch = "wasm32")]
pub use error::HostError;
#[cfg(target_arch = "wasm32")]
pub use frame::{boot_from_frame_attributes, listen_for_boot_messages, restart_guest};
#[cfg(target_arch = "wasm32")]
pub use go::GoRuntime;
#[cfg(target_arch = "wasm32")]
pub use page::{IframeHost, PageController};
