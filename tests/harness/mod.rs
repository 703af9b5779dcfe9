#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use chip8_host_bridge::surface::SurfaceOp;
use chip8_host_bridge::{
    BridgeOptions, ExecutionSurface, ExitHook, ExitSignal, GuestError, GuestLaunch, GuestRuntime,
    HeadlessSurface, HostContext, KeyCapturePolicy, SurfaceKind,
};

/// Everything the bridge did to the surface and the runtime, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Surface(SurfaceOp),
    Instantiate { argv: Vec<String>, hook_armed: bool },
    Run { live_surfaces: usize },
}

/// Shared view of the event log and the number of mounted surfaces.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    log: Rc<RefCell<Vec<Event>>>,
    live: Rc<Cell<usize>>,
}

impl Probe {
    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn live_surfaces(&self) -> usize {
        self.live.get()
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }
}

/// What the guest does on its next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestScript {
    ExitWith(i32),
    Hang,
    FailInstantiate,
}

pub struct ScriptedRuntime {
    probe: Probe,
    script: VecDeque<GuestScript>,
    hung: Vec<ExitHook>,
}

impl ScriptedRuntime {
    pub fn new(probe: Probe, script: impl IntoIterator<Item = GuestScript>) -> Self {
        Self {
            probe,
            script: script.into_iter().collect(),
            hung: Vec::new(),
        }
    }
}

impl GuestRuntime for ScriptedRuntime {
    type Instance = (ExitHook, GuestScript);

    async fn instantiate(
        &mut self,
        launch: GuestLaunch,
    ) -> Result<(ExitHook, GuestScript), GuestError> {
        self.probe.push(Event::Instantiate {
            argv: launch.args.to_argv(),
            hook_armed: launch.exit.is_armed(),
        });
        match self.script.pop_front().unwrap_or(GuestScript::Hang) {
            GuestScript::FailInstantiate => Err(GuestError::Fetch {
                url: launch.module_url,
                reason: "404 Not Found".to_string(),
            }),
            script => Ok((launch.exit, script)),
        }
    }

    fn run(&mut self, (hook, script): (ExitHook, GuestScript)) -> Result<(), GuestError> {
        self.probe.push(Event::Run {
            live_surfaces: self.probe.live_surfaces(),
        });
        match script {
            GuestScript::ExitWith(code) => {
                hook.signal(ExitSignal::new(code));
            }
            GuestScript::Hang | GuestScript::FailInstantiate => self.hung.push(hook),
        }
        Ok(())
    }
}

/// Headless surface that also reports into a [`Probe`].
pub struct ProbedSurface {
    pub inner: HeadlessSurface,
    probe: Probe,
}

impl ProbedSurface {
    pub fn new(probe: Probe) -> Self {
        Self {
            inner: HeadlessSurface::new(),
            probe,
        }
    }

    fn sync(&self, op: SurfaceOp) {
        self.probe.live.set(self.inner.live_count());
        self.probe.push(Event::Surface(op));
    }
}

impl ExecutionSurface for ProbedSurface {
    fn mount_display(&mut self, width: u32, height: u32) {
        self.inner.mount_display(width, height);
        self.sync(SurfaceOp::MountDisplay { width, height });
    }

    fn mount_diagnostic(&mut self, text: &str) {
        self.inner.mount_diagnostic(text);
        self.sync(SurfaceOp::MountDiagnostic(text.to_string()));
    }

    fn unmount(&mut self, kind: SurfaceKind) {
        self.inner.unmount(kind);
        self.sync(SurfaceOp::Unmount(kind));
    }

    fn mount_banner(&mut self, text: &str) {
        self.inner.mount_banner(text);
        self.sync(SurfaceOp::MountBanner);
    }

    fn unmount_banner(&mut self) {
        self.inner.unmount_banner();
        self.sync(SurfaceOp::UnmountBanner);
    }

    fn install_key_capture(&mut self, policy: KeyCapturePolicy) {
        self.inner.install_key_capture(policy);
        self.sync(SurfaceOp::InstallKeyCapture);
    }
}

pub type TestContext = HostContext<ScriptedRuntime, ProbedSurface>;

pub fn context(script: impl IntoIterator<Item = GuestScript>) -> (TestContext, Probe) {
    init_tracing();
    let probe = Probe::default();
    let ctx = HostContext::new(
        ScriptedRuntime::new(probe.clone(), script),
        ProbedSurface::new(probe.clone()),
        BridgeOptions::default(),
    );
    (ctx, probe)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
