use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::config::DisplayVariant;

/// Deployment knobs for one hosting context.
///
/// The hosting frame has no environment or command line, so these are handed in by the page
/// script as a plain object (camelCase keys). Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeOptions {
    /// Prefix joined onto every program name before it reaches the guest.
    pub resource_root: String,
    /// URL of the guest interpreter binary.
    pub module_url: String,
    /// Hardware variant, selects the logical display width used for the pixel size.
    pub variant: DisplayVariant,
    /// Version line printed on the boot banner.
    pub banner_version: String,
    /// Maximum log level (`trace`, `debug`, `info`, `warn`, `error`, `off`).
    pub log_level: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            resource_root: "roms/".to_string(),
            module_url: "chip8.wasm".to_string(),
            variant: DisplayVariant::Chip8,
            banner_version: "1.0.0".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeOptions {
    /// Joins the resource root and a program name.
    pub fn program_path(&self, program_name: &str) -> String {
        format!("{}{}", self.resource_root, program_name)
    }

    /// Parsed [`Self::log_level`]; unknown values fall back to `info`.
    pub fn max_log_level(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or(LevelFilter::INFO)
    }
}
