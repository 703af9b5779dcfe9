//! Guest lifecycle state machine.
//!
//! ```text
//!   Idle ──boot──▶ Booting ──instantiated──▶ Running ──exit 0──▶ Idle
//!    ▲                │                         │
//!    └──instantiate───┘                         └──exit != 0──▶ Faulted
//!        failed                                                   │
//!   Faulted ──boot──▶ Booting ◀───────────────────────────────────┘
//! ```
//!
//! There is no stop or cancel transition. A run only ends when the guest fires its exit hook;
//! a guest that never does can only be discarded together with its whole hosting context.

use chip8_host_protocol::ExitSignal;

use crate::config::{BootConfig, ConfigError};
use crate::fault::{translate, FaultRecord};
use crate::options::BridgeOptions;
use crate::runtime::{ErrorLatch, ExitHook, GuestError, GuestLaunch, GuestRuntime};
use crate::surface::{ExecutionSurface, SurfaceManager};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Booting,
    Running,
    /// Last run faulted; the record stays rendered until the next boot.
    Faulted(FaultRecord),
}

impl SupervisorState {
    /// `Idle` and `Faulted` both accept the next boot command.
    pub fn accepts_boot(&self) -> bool {
        matches!(self, SupervisorState::Idle | SupervisorState::Faulted(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Booting => "booting",
            SupervisorState::Running => "running",
            SupervisorState::Faulted(_) => "faulted",
        }
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Clean,
    Faulted(FaultRecord),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("invalid boot configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Guest(#[from] GuestError),
    #[error("cannot boot while {0}; a hard reset is required")]
    Busy(&'static str),
    #[error("guest exit hook was dropped before an exit code was signalled")]
    ExitHookDropped,
    #[error("nothing to restart: no boot has been requested yet")]
    NothingToRestart,
}

/// Owns the guest lifecycle for one hosting context.
pub struct ModuleSupervisor<R, S> {
    runtime: R,
    surfaces: SurfaceManager<S>,
    options: BridgeOptions,
    state: SupervisorState,
    errors: ErrorLatch,
    runs: u64,
}

impl<R: GuestRuntime, S: ExecutionSurface> ModuleSupervisor<R, S> {
    /// Creates the supervisor and binds key capture for the lifetime of the context.
    pub fn new(runtime: R, surface: S, options: BridgeOptions) -> Self {
        let mut surfaces = SurfaceManager::new(surface);
        surfaces.bind_input_capture();
        Self {
            runtime,
            surfaces,
            options,
            state: SupervisorState::Idle,
            errors: ErrorLatch::new(),
            runs: 0,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    pub fn surfaces(&self) -> &SurfaceManager<S> {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut SurfaceManager<S> {
        &mut self.surfaces
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Handle for the hosting context's uncaught-error listener.
    pub fn error_latch(&self) -> ErrorLatch {
        self.errors.clone()
    }

    /// Number of boots that got past the state check.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Boots the guest with `config` and drives it until it exits.
    ///
    /// Prior surfaces and the boot banner are torn down, and the exit hook is installed, strictly
    /// before the entry point runs. The returned future only completes when the guest signals.
    pub async fn boot(&mut self, config: BootConfig) -> Result<RunOutcome, BridgeError> {
        if !self.state.accepts_boot() {
            tracing::warn!(state = self.state.name(), "boot rejected, guest run in flight");
            return Err(BridgeError::Busy(self.state.name()));
        }

        self.runs += 1;
        let run = self.runs;
        tracing::info!(
            run,
            program = config.program_path(),
            speed = config.speed(),
            pixel_size = config.pixel_size(),
            "booting guest"
        );

        self.surfaces.ensure_no_prior_surface();
        self.surfaces.remove_boot_banner();
        self.state = SupervisorState::Booting;

        let (hook, exited) = ExitHook::channel();
        let launch = GuestLaunch {
            module_url: self.options.module_url.clone(),
            args: config.guest_args(),
            exit: hook,
        };

        let instance = match self.runtime.instantiate(launch).await {
            Ok(instance) => instance,
            Err(err) => {
                tracing::error!(run, "guest instantiation failed: {err}");
                self.state = SupervisorState::Idle;
                return Err(err.into());
            }
        };

        self.surfaces.create_display(&config);
        self.state = SupervisorState::Running;
        self.errors.arm();

        if let Err(err) = self.runtime.run(instance) {
            tracing::error!(run, "guest failed to start: {err}");
            self.errors.disarm();
            self.surfaces.ensure_no_prior_surface();
            self.state = SupervisorState::Idle;
            return Err(err.into());
        }

        let signal = exited.wait().await;
        self.errors.disarm();

        match signal {
            Some(signal) => Ok(self.finish(run, &config, signal)),
            None => {
                tracing::error!(run, "guest dropped its exit hook without signalling");
                self.state = SupervisorState::Idle;
                Err(BridgeError::ExitHookDropped)
            }
        }
    }

    fn finish(&mut self, run: u64, config: &BootConfig, signal: ExitSignal) -> RunOutcome {
        match signal.fault_code() {
            None => {
                tracing::info!(run, errored = self.errors.errored(), "guest exited cleanly");
                self.state = SupervisorState::Idle;
                RunOutcome::Clean
            }
            Some(code) => {
                let record = translate(code, config.program_name());
                tracing::warn!(
                    run,
                    code = code.get(),
                    category = ?record.category,
                    "guest faulted: {}",
                    record.message
                );
                self.surfaces.render_fault(&record);
                self.state = SupervisorState::Faulted(record.clone());
                RunOutcome::Faulted(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, HostGeometry};
    use crate::fault::FaultCategory;
    use crate::surface::{HeadlessSurface, SurfaceKind, SurfaceOp};
    use chip8_host_protocol::BootMessage;
    use futures_util::FutureExt;

    /// Runtime whose guest exits with a fixed code as soon as it is started, or never exits
    /// when `code` is `None`.
    #[derive(Default)]
    struct ExitsWith {
        code: Option<i32>,
        fail_instantiate: bool,
        launches: Vec<Vec<String>>,
        hung: Vec<ExitHook>,
    }

    impl GuestRuntime for ExitsWith {
        type Instance = ExitHook;

        async fn instantiate(&mut self, launch: GuestLaunch) -> Result<ExitHook, GuestError> {
            if self.fail_instantiate {
                return Err(GuestError::Instantiate("bad magic".to_string()));
            }
            self.launches.push(launch.args.to_argv());
            Ok(launch.exit)
        }

        fn run(&mut self, hook: ExitHook) -> Result<(), GuestError> {
            match self.code {
                Some(code) => {
                    hook.signal(ExitSignal::new(code));
                }
                None => self.hung.push(hook),
            }
            Ok(())
        }
    }

    fn supervisor(runtime: ExitsWith) -> ModuleSupervisor<ExitsWith, HeadlessSurface> {
        ModuleSupervisor::new(runtime, HeadlessSurface::new(), BridgeOptions::default())
    }

    fn config(name: &str) -> BootConfig {
        BootMessage::new(name, "10", "1", "0")
            .resolve(HostGeometry::new(1024.0), &BridgeOptions::default())
            .unwrap()
    }

    #[test]
    fn clean_exit_returns_to_idle_and_keeps_display() {
        let mut sup = supervisor(ExitsWith {
            code: Some(0),
            ..ExitsWith::default()
        });

        let outcome = pollster::block_on(sup.boot(config("PONG"))).unwrap();
        assert_eq!(outcome, RunOutcome::Clean);
        assert_eq!(sup.state(), &SupervisorState::Idle);
        assert_eq!(sup.surfaces().live_surface(), Some(SurfaceKind::Display));
        assert_eq!(sup.surfaces().backend().diagnostic(), None);
    }

    #[test]
    fn nonzero_exit_renders_fault() {
        let mut sup = supervisor(ExitsWith {
            code: Some(52),
            ..ExitsWith::default()
        });

        let outcome = pollster::block_on(sup.boot(config("PONG"))).unwrap();
        let RunOutcome::Faulted(record) = outcome else {
            panic!("expected a fault");
        };
        assert_eq!(record.category, FaultCategory::InvalidOpcode);
        assert_eq!(sup.state(), &SupervisorState::Faulted(record));
        assert_eq!(sup.surfaces().live_surface(), Some(SurfaceKind::Diagnostic));
        assert_eq!(sup.surfaces().backend().display(), None);
    }

    #[test]
    fn guest_receives_positional_args() {
        let mut sup = supervisor(ExitsWith {
            code: Some(0),
            ..ExitsWith::default()
        });
        pollster::block_on(sup.boot(config("PONG"))).unwrap();
        assert_eq!(
            sup.runtime().launches,
            [vec!["roms/PONG", "false", "10", "16", "1", "0"]]
        );
    }

    #[test]
    fn instantiate_failure_leaves_no_surface() {
        let mut sup = supervisor(ExitsWith {
            fail_instantiate: true,
            ..ExitsWith::default()
        });

        let err = pollster::block_on(sup.boot(config("PONG"))).unwrap_err();
        assert!(matches!(err, BridgeError::Guest(GuestError::Instantiate(_))));
        assert_eq!(sup.state(), &SupervisorState::Idle);
        assert_eq!(sup.surfaces().live_surface(), None);
    }

    #[test]
    fn hung_guest_blocks_further_boots() {
        let mut sup = supervisor(ExitsWith::default());

        assert!(sup.boot(config("PONG")).now_or_never().is_none());
        assert_eq!(sup.state(), &SupervisorState::Running);

        let err = pollster::block_on(sup.boot(config("BRIX"))).unwrap_err();
        assert!(matches!(err, BridgeError::Busy("running")));
        assert_eq!(sup.runs(), 1);
    }

    #[test]
    fn key_capture_is_bound_at_construction() {
        let sup = supervisor(ExitsWith::default());
        assert!(sup.surfaces().input_capture_bound());
        assert_eq!(
            sup.surfaces().backend().ops(),
            [SurfaceOp::InstallKeyCapture]
        );
    }

    #[test]
    fn errors_are_recorded_only_during_a_run() {
        let mut sup = supervisor(ExitsWith::default());
        let latch = sup.error_latch();
        assert!(!latch.record("page script error"));

        assert!(sup.boot(config("PONG")).now_or_never().is_none());
        assert!(latch.record("guest panic"));
        assert!(latch.errored());
        assert_eq!(sup.state(), &SupervisorState::Running);
        assert_eq!(sup.surfaces().backend().diagnostic(), None);
    }
}
