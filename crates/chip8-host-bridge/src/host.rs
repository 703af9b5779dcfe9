//! One hosting context: the supervisor plus whatever booted it last.

use chip8_host_protocol::BootMessage;

use crate::config::{BootConfig, ConfigError, ConfigSource, FrameAttributes, HostGeometry};
use crate::options::BridgeOptions;
use crate::runtime::GuestRuntime;
use crate::supervisor::{BridgeError, ModuleSupervisor, RunOutcome};
use crate::surface::ExecutionSurface;

/// Where a boot request came from. Kept so a restart can re-resolve it against the geometry of
/// the moment instead of reusing a stale pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOrigin {
    Attributes(FrameAttributes),
    Message(BootMessage),
}

impl ConfigSource for BootOrigin {
    fn resolve(
        &self,
        geometry: HostGeometry,
        options: &BridgeOptions,
    ) -> Result<BootConfig, ConfigError> {
        match self {
            BootOrigin::Attributes(attrs) => attrs.resolve(geometry, options),
            BootOrigin::Message(msg) => msg.resolve(geometry, options),
        }
    }
}

pub struct HostContext<R, S> {
    supervisor: ModuleSupervisor<R, S>,
    last_origin: Option<BootOrigin>,
}

impl<R: GuestRuntime, S: ExecutionSurface> HostContext<R, S> {
    pub fn new(runtime: R, surface: S, options: BridgeOptions) -> Self {
        Self {
            supervisor: ModuleSupervisor::new(runtime, surface, options),
            last_origin: None,
        }
    }

    pub fn supervisor(&self) -> &ModuleSupervisor<R, S> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ModuleSupervisor<R, S> {
        &mut self.supervisor
    }

    pub fn last_origin(&self) -> Option<&BootOrigin> {
        self.last_origin.as_ref()
    }

    /// Attribute transport: called once the frame document has loaded.
    ///
    /// A frame without a program attribute shows the boot banner and returns `Ok(None)`.
    pub async fn on_frame_loaded(
        &mut self,
        attrs: FrameAttributes,
        geometry: HostGeometry,
    ) -> Result<Option<RunOutcome>, BridgeError> {
        if !attrs.requests_boot() {
            let version = self.supervisor.options().banner_version.clone();
            tracing::info!("no program requested, showing boot banner");
            self.supervisor.surfaces_mut().show_boot_banner(&version);
            return Ok(None);
        }
        self.boot_from(BootOrigin::Attributes(attrs), geometry)
            .await
            .map(Some)
    }

    /// Message transport: a boot payload posted by the controlling page.
    pub async fn on_message(
        &mut self,
        msg: BootMessage,
        geometry: HostGeometry,
    ) -> Result<RunOutcome, BridgeError> {
        self.boot_from(BootOrigin::Message(msg), geometry).await
    }

    /// Boots again from the last accepted origin, sized for the current geometry.
    pub async fn restart(&mut self, geometry: HostGeometry) -> Result<RunOutcome, BridgeError> {
        let origin = self
            .last_origin
            .clone()
            .ok_or(BridgeError::NothingToRestart)?;
        self.boot_from(origin, geometry).await
    }

    async fn boot_from(
        &mut self,
        origin: BootOrigin,
        geometry: HostGeometry,
    ) -> Result<RunOutcome, BridgeError> {
        let config = match origin.resolve(geometry, self.supervisor.options()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("boot request rejected: {err}");
                return Err(err.into());
            }
        };
        self.last_origin = Some(origin);
        self.supervisor.boot(config).await
    }

    /// Discards this context entirely and builds a fresh one from `rebuild`.
    ///
    /// Nothing survives: not the supervisor state, not the surfaces, not the last boot origin.
    /// This is the only way to get rid of a guest that never exits.
    pub fn hard_reset(self, rebuild: impl FnOnce() -> (R, S)) -> Self {
        let options = self.supervisor.options().clone();
        tracing::info!(
            state = self.supervisor.state().name(),
            "hard reset, discarding hosting context"
        );
        drop(self);
        let (runtime, surface) = rebuild();
        Self::new(runtime, surface, options)
    }
}
