//! Controlling-page side of the bridge.

use std::str::FromStr;

use chip8_host_protocol::BootMessage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("theme {0:?} is not a `foreground,background` pair")]
    InvalidTheme(String),
    #[error("nothing to restart: no boot has been sent yet")]
    NothingToRestart,
    #[error("hosting frame rejected the command: {0}")]
    Frame(String),
}

/// How boot parameters reach the hosting frame.
///
/// Attributes is the default: every boot recreates the frame, so a boot sent while a guest is
/// still running is never turned away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// Write data attributes on the frame element, then recreate the frame so it boots from them.
    #[default]
    Attributes,
    /// Post a [`BootMessage`] to the already loaded frame. The frame turns the message away while
    /// a guest is running.
    Message,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attributes" | "attribute" => Ok(Transport::Attributes),
            "message" | "postmessage" => Ok(Transport::Message),
            other => Err(format!("unknown transport {other:?}")),
        }
    }
}

/// The controlling page's handle on the hosting frame.
pub trait HostFrame {
    /// Drops keyboard focus from page controls so keys reach the guest.
    fn blur_active_control(&mut self);
    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ControllerError>;
    fn remove_attribute(&mut self, name: &str) -> Result<(), ControllerError>;
    fn post_message(&mut self, message: &BootMessage) -> Result<(), ControllerError>;
    /// Throws the hosting context away and loads a fresh one.
    fn recreate(&mut self) -> Result<(), ControllerError>;
}

/// Colour pair encoded in a single theme token, `"fg,bg"` or `"fg:bg"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub foreground: String,
    pub background: String,
}

impl FromStr for Theme {
    type Err = ControllerError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || ControllerError::InvalidTheme(token.to_string());
        let (fg, bg) = token
            .split_once(',')
            .or_else(|| token.split_once(':'))
            .ok_or_else(invalid)?;
        let (fg, bg) = (fg.trim(), bg.trim());
        if fg.is_empty() || bg.is_empty() {
            return Err(invalid());
        }
        Ok(Theme {
            foreground: fg.to_string(),
            background: bg.to_string(),
        })
    }
}

/// Values of the page controls at the time the operator hits run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSelectedParams {
    pub program_name: String,
    pub speed: String,
    pub theme: String,
}

impl UserSelectedParams {
    pub fn to_message(&self) -> Result<BootMessage, ControllerError> {
        let theme: Theme = self.theme.parse()?;
        Ok(BootMessage::new(
            self.program_name.as_str(),
            self.speed.as_str(),
            theme.foreground,
            theme.background,
        ))
    }
}

pub struct Controller<F> {
    frame: F,
    transport: Transport,
    last: Option<UserSelectedParams>,
}

impl<F: HostFrame> Controller<F> {
    pub fn new(frame: F, transport: Transport) -> Self {
        Self {
            frame,
            transport,
            last: None,
        }
    }

    pub fn frame(&self) -> &F {
        &self.frame
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn last_sent(&self) -> Option<&UserSelectedParams> {
        self.last.as_ref()
    }

    /// Sends a boot command for `params` over the configured transport.
    pub fn send_boot(&mut self, params: UserSelectedParams) -> Result<(), ControllerError> {
        self.frame.blur_active_control();
        let message = params.to_message()?;

        match self.transport {
            Transport::Attributes => {
                for (name, value) in message.attributes() {
                    match value {
                        Some(value) => self.frame.set_attribute(name, value)?,
                        None => self.frame.remove_attribute(name)?,
                    }
                }
                self.frame.recreate()?;
            }
            Transport::Message => self.frame.post_message(&message)?,
        }

        tracing::info!(
            program = %params.program_name,
            transport = ?self.transport,
            "boot command sent"
        );
        self.last = Some(params);
        Ok(())
    }

    /// Resends the last boot command.
    pub fn restart(&mut self) -> Result<(), ControllerError> {
        let params = self.last.clone().ok_or(ControllerError::NothingToRestart)?;
        self.send_boot(params)
    }

    /// Recreates the hosting frame regardless of what the guest is doing.
    pub fn hard_reset(&mut self) -> Result<(), ControllerError> {
        tracing::info!("hard reset requested");
        self.frame.recreate()
    }
}
