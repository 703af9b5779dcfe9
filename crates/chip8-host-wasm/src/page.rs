//! Controlling page bindings.

use chip8_host_bridge::{
    BootMessage, Controller, ControllerError, HostFrame, Transport, UserSelectedParams,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, HtmlElement, HtmlIFrameElement, HtmlInputElement, HtmlSelectElement, Window,
};

use crate::console;
use crate::error::{describe, HostError};

fn frame_error(err: JsValue) -> ControllerError {
    ControllerError::Frame(describe(&err))
}

/// [`HostFrame`] over an `<iframe>` in the controlling page.
pub struct IframeHost {
    document: Document,
    frame: HtmlIFrameElement,
}

impl IframeHost {
    pub fn new(document: Document, frame: HtmlIFrameElement) -> Self {
        Self { document, frame }
    }

    fn content_window(&self) -> Result<Window, ControllerError> {
        self.frame
            .content_window()
            .ok_or_else(|| ControllerError::Frame("frame has no content window".to_string()))
    }
}

impl HostFrame for IframeHost {
    fn blur_active_control(&mut self) {
        let active = self
            .document
            .active_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        if let Some(active) = active {
            if let Err(err) = active.blur() {
                tracing::debug!(reason = %describe(&err), "could not blur active control");
            }
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ControllerError> {
        self.frame.set_attribute(name, value).map_err(frame_error)
    }

    fn remove_attribute(&mut self, name: &str) -> Result<(), ControllerError> {
        self.frame.remove_attribute(name).map_err(frame_error)
    }

    fn post_message(&mut self, message: &BootMessage) -> Result<(), ControllerError> {
        let payload = serde_wasm_bindgen::to_value(message)
            .map_err(|err| ControllerError::Frame(err.to_string()))?;
        self.content_window()?
            .post_message(&payload, "*")
            .map_err(frame_error)
    }

    fn recreate(&mut self) -> Result<(), ControllerError> {
        self.content_window()?
            .location()
            .reload()
            .map_err(frame_error)
    }
}

/// Selectors for the page controls. Every key is optional; without `transport` boots go through
/// the frame's attributes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PageOptions {
    frame: String,
    program: String,
    speed: String,
    theme: String,
    transport: Option<String>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            frame: "#emulator".to_string(),
            program: "#program".to_string(),
            speed: "#speed".to_string(),
            theme: "#theme".to_string(),
            transport: None,
        }
    }
}

/// Page-side handle exported to JS as `PageController`.
#[wasm_bindgen]
pub struct PageController {
    inner: Controller<IframeHost>,
    document: Document,
    options: PageOptions,
}

impl PageController {
    fn control_value(&self, selector: &str) -> Result<String, HostError> {
        let control = self
            .document
            .query_selector(selector)?
            .ok_or_else(|| HostError::Missing(selector.to_string()))?;
        if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
            return Ok(select.value());
        }
        if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
            return Ok(input.value());
        }
        Err(HostError::NotAControl(selector.to_string()))
    }
}

#[wasm_bindgen]
impl PageController {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<PageController, JsValue> {
        console::init(LevelFilter::INFO);

        let options: PageOptions = if options.is_undefined() || options.is_null() {
            PageOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|err| HostError::Options(err.to_string()))?
        };
        let transport = match options.transport.as_deref() {
            Some(name) => name.parse::<Transport>().map_err(HostError::Options)?,
            None => Transport::default(),
        };

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(HostError::NoWindow)?;
        let frame = document
            .query_selector(&options.frame)?
            .ok_or_else(|| HostError::Missing(options.frame.clone()))?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| HostError::NotAFrame(options.frame.clone()))?;

        Ok(PageController {
            inner: Controller::new(IframeHost::new(document.clone(), frame), transport),
            document,
            options,
        })
    }

    /// Boots the program currently selected on the page.
    pub fn run(&mut self) -> Result<(), JsValue> {
        let params = UserSelectedParams {
            program_name: self.control_value(&self.options.program)?,
            speed: self.control_value(&self.options.speed)?,
            theme: self.control_value(&self.options.theme)?,
        };
        self.inner.send_boot(params).map_err(HostError::from)?;
        Ok(())
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.inner.restart().map_err(HostError::from)?;
        Ok(())
    }

    /// Reloads the hosting frame, whatever the guest is doing.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.inner.hard_reset().map_err(HostError::from)?;
        Ok(())
    }
}
