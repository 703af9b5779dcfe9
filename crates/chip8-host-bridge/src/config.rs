//! Boot configuration and the two transports it can arrive over.
//!
//! The hosting frame is booted either from data attributes on its own `<iframe>` element or from
//! a message posted by the controlling page. Both are [`ConfigSource`]s, so the supervisor only
//! ever sees a validated [`BootConfig`].

use chip8_host_protocol::message::{ATTR_BG_COLOUR, ATTR_FG_COLOUR, ATTR_PGM_NAME, ATTR_SPEED};
use chip8_host_protocol::{BootMessage, GuestArgs};
use serde::Deserialize;

use crate::options::BridgeOptions;

pub const CHIP8_DISPLAY_WIDTH: u32 = 64;
pub const CHIP8_DISPLAY_HEIGHT: u32 = 32;
pub const SCHIP_DISPLAY_WIDTH: u32 = 128;
pub const SCHIP_DISPLAY_HEIGHT: u32 = 64;

/// Emulated hardware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayVariant {
    #[default]
    Chip8,
    SuperChip,
}

impl DisplayVariant {
    pub const fn logical_width(self) -> u32 {
        match self {
            DisplayVariant::Chip8 => CHIP8_DISPLAY_WIDTH,
            DisplayVariant::SuperChip => SCHIP_DISPLAY_WIDTH,
        }
    }

    pub const fn logical_height(self) -> u32 {
        match self {
            DisplayVariant::Chip8 => CHIP8_DISPLAY_HEIGHT,
            DisplayVariant::SuperChip => SCHIP_DISPLAY_HEIGHT,
        }
    }
}

/// Geometry of the hosting context, sampled at boot time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostGeometry {
    pub available_width: f64,
}

impl HostGeometry {
    pub const fn new(available_width: f64) -> Self {
        Self { available_width }
    }
}

/// `floor(available_width / logical_width)`.
///
/// Not clamped: a frame narrower than the logical display yields 0, and a negative width yields a
/// negative size. The guest decides what to do with those.
pub fn pixel_size_for(available_width: f64, variant: DisplayVariant) -> i32 {
    (available_width / f64::from(variant.logical_width())).floor() as i32
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no program name supplied")]
    MissingProgram,
    #[error("missing boot parameter `{0}`")]
    MissingField(&'static str),
    #[error("invalid speed {0:?}: expected a positive integer")]
    InvalidSpeed(String),
}

/// Validated parameters for a single boot attempt.
///
/// Built fresh by a [`ConfigSource`] for every attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    program_name: String,
    program_path: String,
    speed: u32,
    pixel_size: i32,
    foreground: String,
    background: String,
    variant: DisplayVariant,
}

impl BootConfig {
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Program name prefixed with the resource root.
    pub fn program_path(&self) -> &str {
        &self.program_path
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn pixel_size(&self) -> i32 {
        self.pixel_size
    }

    pub fn foreground(&self) -> &str {
        &self.foreground
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn variant(&self) -> DisplayVariant {
        self.variant
    }

    /// Startup arguments for the guest. Debugging is never enabled from the host.
    pub fn guest_args(&self) -> GuestArgs {
        GuestArgs {
            program_path: self.program_path.clone(),
            debug: false,
            speed: self.speed,
            pixel_size: self.pixel_size,
            foreground: self.foreground.clone(),
            background: self.background.clone(),
        }
    }
}

/// Anything a hosting context can be booted from.
pub trait ConfigSource {
    fn resolve(
        &self,
        geometry: HostGeometry,
        options: &BridgeOptions,
    ) -> Result<BootConfig, ConfigError>;
}

/// Boot parameters read from the hosting `<iframe>` element's data attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAttributes {
    pub pgm_name: Option<String>,
    pub speed: Option<String>,
    pub fg_colour: Option<String>,
    pub bg_colour: Option<String>,
}

impl FrameAttributes {
    /// Reads the boot attributes through `get` (e.g. `Element::get_attribute`).
    pub fn from_lookup(mut get: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            pgm_name: get(ATTR_PGM_NAME),
            speed: get(ATTR_SPEED),
            fg_colour: get(ATTR_FG_COLOUR),
            bg_colour: get(ATTR_BG_COLOUR),
        }
    }

    /// Whether the frame was asked to run anything at all. A frame without a program attribute
    /// shows the boot banner instead.
    pub fn requests_boot(&self) -> bool {
        self.pgm_name.is_some()
    }
}

impl ConfigSource for FrameAttributes {
    fn resolve(
        &self,
        geometry: HostGeometry,
        options: &BridgeOptions,
    ) -> Result<BootConfig, ConfigError> {
        build(
            RawParams {
                program_name: self.pgm_name.as_deref(),
                speed: self.speed.as_deref(),
                foreground: self.fg_colour.as_deref(),
                background: self.bg_colour.as_deref(),
            },
            geometry,
            options,
        )
    }
}

impl ConfigSource for BootMessage {
    fn resolve(
        &self,
        geometry: HostGeometry,
        options: &BridgeOptions,
    ) -> Result<BootConfig, ConfigError> {
        build(
            RawParams {
                program_name: self.program_name.as_deref(),
                speed: self.speed.as_deref(),
                foreground: self.fg_colour.as_deref(),
                background: self.bg_colour.as_deref(),
            },
            geometry,
            options,
        )
    }
}

struct RawParams<'a> {
    program_name: Option<&'a str>,
    speed: Option<&'a str>,
    foreground: Option<&'a str>,
    background: Option<&'a str>,
}

fn build(
    raw: RawParams<'_>,
    geometry: HostGeometry,
    options: &BridgeOptions,
) -> Result<BootConfig, ConfigError> {
    let program_name = raw
        .program_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ConfigError::MissingProgram)?;

    let speed = required(raw.speed, ATTR_SPEED)?;
    let speed = match speed.parse::<u32>() {
        Ok(speed) if speed > 0 => speed,
        _ => return Err(ConfigError::InvalidSpeed(speed.to_string())),
    };

    let foreground = required(raw.foreground, ATTR_FG_COLOUR)?;
    let background = required(raw.background, ATTR_BG_COLOUR)?;

    let variant = options.variant;
    Ok(BootConfig {
        program_name: program_name.to_string(),
        program_path: options.program_path(program_name),
        speed,
        pixel_size: pixel_size_for(geometry.available_width, variant),
        foreground: foreground.to_string(),
        background: background.to_string(),
        variant,
    })
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingField(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: Option<&str>) -> FrameAttributes {
        FrameAttributes {
            pgm_name: name.map(str::to_string),
            speed: Some("12".to_string()),
            fg_colour: Some("1".to_string()),
            bg_colour: Some("0".to_string()),
        }
    }

    #[test]
    fn pixel_size_is_floor_of_width_over_logical_width() {
        assert_eq!(pixel_size_for(1024.0, DisplayVariant::Chip8), 16);
        assert_eq!(pixel_size_for(1023.0, DisplayVariant::Chip8), 15);
        assert_eq!(pixel_size_for(1024.0, DisplayVariant::SuperChip), 8);
    }

    #[test]
    fn pixel_size_is_not_clamped() {
        assert_eq!(pixel_size_for(63.0, DisplayVariant::Chip8), 0);
        assert_eq!(pixel_size_for(0.0, DisplayVariant::Chip8), 0);
        assert_eq!(pixel_size_for(-64.0, DisplayVariant::Chip8), -1);
        assert_eq!(pixel_size_for(-1.0, DisplayVariant::Chip8), -1);
    }

    #[test]
    fn frame_attributes_resolve_to_boot_config() {
        let opts = BridgeOptions::default();
        let config = attrs(Some("PONG"))
            .resolve(HostGeometry::new(1024.0), &opts)
            .unwrap();

        assert_eq!(config.program_name(), "PONG");
        assert_eq!(config.program_path(), "roms/PONG");
        assert_eq!(config.speed(), 12);
        assert_eq!(config.pixel_size(), 16);
        assert_eq!(config.foreground(), "1");
        assert_eq!(config.background(), "0");
    }

    #[test]
    fn pixel_size_follows_current_geometry() {
        let opts = BridgeOptions::default();
        let source = attrs(Some("PONG"));

        let wide = source.resolve(HostGeometry::new(1024.0), &opts).unwrap();
        let narrow = source.resolve(HostGeometry::new(640.0), &opts).unwrap();
        assert_eq!(wide.pixel_size(), 16);
        assert_eq!(narrow.pixel_size(), 10);
    }

    #[test]
    fn missing_or_empty_program_is_rejected() {
        let opts = BridgeOptions::default();
        let geometry = HostGeometry::new(640.0);

        assert_eq!(
            attrs(None).resolve(geometry, &opts),
            Err(ConfigError::MissingProgram)
        );
        assert_eq!(
            attrs(Some("")).resolve(geometry, &opts),
            Err(ConfigError::MissingProgram)
        );
        assert_eq!(
            attrs(Some("   ")).resolve(geometry, &opts),
            Err(ConfigError::MissingProgram)
        );
    }

    #[test]
    fn speed_must_be_a_positive_integer() {
        let opts = BridgeOptions::default();
        let geometry = HostGeometry::new(640.0);

        for bad in ["0", "-3", "fast", "1.5"] {
            let mut source = attrs(Some("PONG"));
            source.speed = Some(bad.to_string());
            assert_eq!(
                source.resolve(geometry, &opts),
                Err(ConfigError::InvalidSpeed(bad.to_string())),
                "speed {bad:?}"
            );
        }

        let mut source = attrs(Some("PONG"));
        source.speed = None;
        assert_eq!(
            source.resolve(geometry, &opts),
            Err(ConfigError::MissingField(ATTR_SPEED))
        );
    }

    #[test]
    fn missing_colour_is_rejected() {
        let opts = BridgeOptions::default();
        let mut source = attrs(Some("PONG"));
        source.bg_colour = None;
        assert_eq!(
            source.resolve(HostGeometry::new(640.0), &opts),
            Err(ConfigError::MissingField(ATTR_BG_COLOUR))
        );
    }

    #[test]
    fn message_and_attributes_resolve_identically() {
        let opts = BridgeOptions::default();
        let geometry = HostGeometry::new(768.0);
        let msg = BootMessage::new("PONG", "12", "1", "0");

        assert_eq!(
            msg.resolve(geometry, &opts),
            attrs(Some("PONG")).resolve(geometry, &opts)
        );
    }

    #[test]
    fn lookup_reads_every_boot_attribute() {
        let source = FrameAttributes::from_lookup(|name| match name {
            ATTR_PGM_NAME => Some("TETRIS".to_string()),
            ATTR_SPEED => Some("8".to_string()),
            _ => None,
        });

        assert!(source.requests_boot());
        assert_eq!(source.speed.as_deref(), Some("8"));
        assert_eq!(source.fg_colour, None);
        assert!(!FrameAttributes::default().requests_boot());
    }

    #[test]
    fn guest_args_never_enable_debug() {
        let opts = BridgeOptions::default();
        let config = attrs(Some("PONG"))
            .resolve(HostGeometry::new(1024.0), &opts)
            .unwrap();
        let args = config.guest_args();
        assert!(!args.debug);
        assert_eq!(args.program_path, "roms/PONG");
        assert_eq!(args.pixel_size, 16);
    }
}
