//! Host bridge for a sandboxed CHIP-8 guest module.
//!
//! The controlling page sends boot commands ([`controller`]), the hosting frame turns them into a
//! [`BootConfig`] ([`config`]), and the [`ModuleSupervisor`] brings the guest up, waits for its
//! exit code and renders a diagnostic ([`fault`]) on the execution surface ([`surface`]) when the
//! run faulted.
//!
//! This crate is target independent. Browser bindings for the surface, the guest runtime and the
//! controller's frame handle live in `chip8-host-wasm`.

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod fault;
pub mod host;
pub mod options;
pub mod runtime;
pub mod supervisor;
pub mod surface;

pub use config::{
    BootConfig, ConfigError, ConfigSource, DisplayVariant, FrameAttributes, HostGeometry,
};
pub use controller::{Controller, ControllerError, HostFrame, Transport, UserSelectedParams};
pub use fault::{translate, FaultCategory, FaultClass, FaultRecord};
pub use host::{BootOrigin, HostContext};
pub use options::BridgeOptions;
pub use runtime::{ErrorLatch, ExitHook, GuestError, GuestLaunch, GuestRuntime};
pub use supervisor::{BridgeError, ModuleSupervisor, RunOutcome, SupervisorState};
pub use surface::{
    ExecutionSurface, HeadlessSurface, KeyCapturePolicy, KeyModifiers, SurfaceKind,
    SurfaceManager,
};

pub use chip8_host_protocol::{BootMessage, ExitSignal, GuestArgs};
