//! Execution surface: the display the guest draws into, or the diagnostic that replaces it.
//!
//! [`SurfaceManager`] enforces the lifecycle rules (one live surface, teardown before creation,
//! key capture bound once) on top of an [`ExecutionSurface`] backend. The browser backend lives
//! in `chip8-host-wasm`; [`HeadlessSurface`] is an in-memory backend for native hosts and tests.

use crate::config::BootConfig;
use crate::fault::FaultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Canvas the guest renders into.
    Display,
    /// Non-selectable text block describing a fault.
    Diagnostic,
}

/// Modifier state of a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Key interception policy for the hosting document.
///
/// The guest claims function keys (F5 pause, F11 debug, F12 reset), so the host swallows the
/// browser's default handling for every key except combinations carrying the meta modifier,
/// which stay available for browser and OS shortcuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCapturePolicy;

impl KeyCapturePolicy {
    pub fn suppresses_default(&self, modifiers: KeyModifiers) -> bool {
        !modifiers.meta
    }
}

/// Backend operations behind the surface manager.
///
/// Implementations only perform the DOM-level effect; bookkeeping (what is live, what was
/// already bound) is owned by [`SurfaceManager`].
pub trait ExecutionSurface {
    fn mount_display(&mut self, width: u32, height: u32);
    fn mount_diagnostic(&mut self, text: &str);
    fn unmount(&mut self, kind: SurfaceKind);
    fn mount_banner(&mut self, text: &str);
    fn unmount_banner(&mut self);
    fn install_key_capture(&mut self, policy: KeyCapturePolicy);
}

/// Block-art logo heading the boot banner.
const BANNER_LOGO: &str = "
       ██████╗  ██████╗      ██████╗██╗  ██╗██╗██████╗        █████╗
      ██╔════╝ ██╔═══██╗    ██╔════╝██║  ██║██║██╔══██╗      ██╔══██╗
      ██║  ███╗██║   ██║    ██║     ███████║██║██████╔╝█████╗╚█████╔╝
      ██║   ██║██║   ██║    ██║     ██╔══██║██║██╔═══╝ ╚════╝██╔══██╗
      ╚██████╔╝╚██████╔╝    ╚██████╗██║  ██║██║██║           ╚█████╔╝
       ╚═════╝  ╚═════╝      ╚═════╝╚═╝  ╚═╝╚═╝╚═╝            ╚════╝";

/// Splash text shown by a frame that was loaded without a program.
pub fn boot_banner_text(version: &str) -> String {
    format!(
        "{BANNER_LOGO}

    +++ Version {version}
    +++ Enabling WASM data & protocol sync buffers
    +++ Mem check ~ 4096 bytes: OK
    +++ System cold boot completed with 0 warnings
      > \u{2588}"
    )
}

pub struct SurfaceManager<S> {
    backend: S,
    live: Option<SurfaceKind>,
    banner_shown: bool,
    capture_bound: bool,
}

impl<S: ExecutionSurface> SurfaceManager<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            live: None,
            banner_shown: false,
            capture_bound: false,
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// The surface currently mounted, if any.
    pub fn live_surface(&self) -> Option<SurfaceKind> {
        self.live
    }

    pub fn banner_shown(&self) -> bool {
        self.banner_shown
    }

    pub fn input_capture_bound(&self) -> bool {
        self.capture_bound
    }

    /// Removes the live surface if there is one. Returns whether anything was removed.
    pub fn ensure_no_prior_surface(&mut self) -> bool {
        match self.live.take() {
            Some(kind) => {
                tracing::debug!(?kind, "removing prior surface");
                self.backend.unmount(kind);
                true
            }
            None => false,
        }
    }

    /// Installs the key capture policy. Only the first call per context has an effect.
    pub fn bind_input_capture(&mut self) -> bool {
        if self.capture_bound {
            return false;
        }
        self.backend.install_key_capture(KeyCapturePolicy);
        self.capture_bound = true;
        true
    }

    /// Mounts the display surface for `config`, sized `logical * pixel_size` on each axis.
    /// A non-positive pixel size yields a zero-sized display.
    pub fn create_display(&mut self, config: &BootConfig) {
        self.ensure_no_prior_surface();

        let scale = u32::try_from(config.pixel_size()).unwrap_or(0);
        let variant = config.variant();
        let width = variant.logical_width().saturating_mul(scale);
        let height = variant.logical_height().saturating_mul(scale);

        self.backend.mount_display(width, height);
        self.live = Some(SurfaceKind::Display);
    }

    /// Replaces the live surface with the diagnostic block for `record`.
    ///
    /// Does not boot anything; the next boot tears the diagnostic down like any other surface.
    pub fn render_fault(&mut self, record: &FaultRecord) {
        self.ensure_no_prior_surface();
        self.backend.mount_diagnostic(&record.banner());
        self.live = Some(SurfaceKind::Diagnostic);
    }

    pub fn show_boot_banner(&mut self, version: &str) {
        if self.banner_shown {
            return;
        }
        self.backend.mount_banner(&boot_banner_text(version));
        self.banner_shown = true;
    }

    /// Removes the boot banner if it is showing. Returns whether anything was removed.
    pub fn remove_boot_banner(&mut self) -> bool {
        if !self.banner_shown {
            return false;
        }
        self.backend.unmount_banner();
        self.banner_shown = false;
        true
    }
}

/// Backend operation, as recorded by [`HeadlessSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    MountDisplay { width: u32, height: u32 },
    MountDiagnostic(String),
    Unmount(SurfaceKind),
    MountBanner,
    UnmountBanner,
    InstallKeyCapture,
}

/// In-memory surface backend.
///
/// Keeps the mounted elements and a log of every operation, and tracks the highest number of
/// simultaneously mounted surfaces ever observed.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    display: Option<(u32, u32)>,
    diagnostic: Option<String>,
    banner: Option<String>,
    key_capture: Option<KeyCapturePolicy>,
    peak_live: usize,
    ops: Vec<SurfaceOp>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> Option<(u32, u32)> {
        self.display
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn key_capture(&self) -> Option<KeyCapturePolicy> {
        self.key_capture
    }

    pub fn live_count(&self) -> usize {
        usize::from(self.display.is_some()) + usize::from(self.diagnostic.is_some())
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    fn note_mount(&mut self) {
        self.peak_live = self.peak_live.max(self.live_count());
    }
}

impl ExecutionSurface for HeadlessSurface {
    fn mount_display(&mut self, width: u32, height: u32) {
        self.ops.push(SurfaceOp::MountDisplay { width, height });
        self.display = Some((width, height));
        self.note_mount();
    }

    fn mount_diagnostic(&mut self, text: &str) {
        self.ops.push(SurfaceOp::MountDiagnostic(text.to_string()));
        self.diagnostic = Some(text.to_string());
        self.note_mount();
    }

    fn unmount(&mut self, kind: SurfaceKind) {
        self.ops.push(SurfaceOp::Unmount(kind));
        match kind {
            SurfaceKind::Display => self.display = None,
            SurfaceKind::Diagnostic => self.diagnostic = None,
        }
    }

    fn mount_banner(&mut self, text: &str) {
        self.ops.push(SurfaceOp::MountBanner);
        self.banner = Some(text.to_string());
    }

    fn unmount_banner(&mut self) {
        self.ops.push(SurfaceOp::UnmountBanner);
        self.banner = None;
    }

    fn install_key_capture(&mut self, policy: KeyCapturePolicy) {
        self.ops.push(SurfaceOp::InstallKeyCapture);
        self.key_capture = Some(policy);
    }
}
