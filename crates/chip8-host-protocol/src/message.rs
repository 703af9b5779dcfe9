//! Boot payload sent from the controlling page to the hosting frame.

use serde::{Deserialize, Serialize};

/// Frame attribute carrying the program name (attribute transport).
pub const ATTR_PGM_NAME: &str = "data-pgm-name";
/// Frame attribute carrying the speed in instructions per tick.
pub const ATTR_SPEED: &str = "data-speed";
/// Frame attribute carrying the foreground colour token.
pub const ATTR_FG_COLOUR: &str = "data-fgcolour";
/// Frame attribute carrying the background colour token.
pub const ATTR_BG_COLOUR: &str = "data-bgcolour";

/// All boot attributes, in the order the controller writes them.
pub const BOOT_ATTRIBUTES: [&str; 4] = [
    ATTR_PGM_NAME,
    ATTR_SPEED,
    ATTR_FG_COLOUR,
    ATTR_BG_COLOUR,
];

/// Message transport payload: `{ programName, speed, fgColour, bgColour }`.
///
/// Every field is optional on the wire so that a payload with a missing field still decodes and
/// can be rejected with a precise configuration error by the receiving side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootMessage {
    pub program_name: Option<String>,
    pub speed: Option<String>,
    pub fg_colour: Option<String>,
    pub bg_colour: Option<String>,
}

impl BootMessage {
    pub fn new(
        program_name: impl Into<String>,
        speed: impl Into<String>,
        fg_colour: impl Into<String>,
        bg_colour: impl Into<String>,
    ) -> Self {
        Self {
            program_name: Some(program_name.into()),
            speed: Some(speed.into()),
            fg_colour: Some(fg_colour.into()),
            bg_colour: Some(bg_colour.into()),
        }
    }

    /// The payload as `(attribute, value)` pairs for the attribute transport.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        [
            (ATTR_PGM_NAME, self.program_name.as_deref()),
            (ATTR_SPEED, self.speed.as_deref()),
            (ATTR_FG_COLOUR, self.fg_colour.as_deref()),
            (ATTR_BG_COLOUR, self.bg_colour.as_deref()),
        ]
        .into_iter()
    }
}
