//! DOM backend for the execution surface.

use chip8_host_bridge::{ExecutionSurface, KeyCapturePolicy, KeyModifiers, SurfaceKind};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, KeyboardEvent};

use crate::error::HostError;

pub const DIAGNOSTIC_ID: &str = "chip8-diagnostic";
pub const BANNER_ID: &str = "chip8-banner";

/// Display, diagnostic and boot banner as children of the hosting document's body.
///
/// The guest creates and sizes its own `<canvas>` from the pixel size in its argv, so the
/// display is only reserved here. Tearing it down removes every canvas the guest added.
pub struct DomSurface {
    document: Document,
    body: HtmlElement,
    display: Option<(u32, u32)>,
    diagnostic: Option<Element>,
    banner: Option<Element>,
    key_listener: Option<Closure<dyn FnMut(KeyboardEvent)>>,
}

impl DomSurface {
    pub fn new(document: Document) -> Result<Self, HostError> {
        let body = document
            .body()
            .ok_or_else(|| HostError::Missing("<body>".to_string()))?;
        Ok(Self {
            document,
            body,
            display: None,
            diagnostic: None,
            banner: None,
            key_listener: None,
        })
    }

    /// Size reserved for the guest's display, if one is live.
    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.display
    }

    fn remove_canvases(&self) -> Result<usize, JsValue> {
        let canvases = self.document.query_selector_all("canvas")?;
        let mut removed = 0;
        for index in 0..canvases.length() {
            let Some(node) = canvases.item(index) else {
                continue;
            };
            if let Ok(canvas) = node.dyn_into::<Element>() {
                canvas.remove();
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Appends a `<pre>` block that cannot be selected.
    fn create_text_block(&self, id: &str, text: &str) -> Result<Element, JsValue> {
        let pre = self.document.create_element("pre")?;
        pre.set_id(id);
        pre.set_text_content(Some(text));
        pre.set_attribute("unselectable", "on")?;
        pre.set_attribute("style", "user-select: none; -webkit-user-select: none")?;
        self.body.append_child(&pre)?;
        Ok(pre)
    }
}

impl ExecutionSurface for DomSurface {
    fn mount_display(&mut self, width: u32, height: u32) {
        tracing::debug!(width, height, "display reserved for the guest canvas");
        self.display = Some((width, height));
    }

    fn mount_diagnostic(&mut self, text: &str) {
        match self.create_text_block(DIAGNOSTIC_ID, text) {
            Ok(pre) => self.diagnostic = Some(pre),
            Err(err) => tracing::error!(?err, "failed to mount diagnostic"),
        }
    }

    fn unmount(&mut self, kind: SurfaceKind) {
        match kind {
            SurfaceKind::Display => {
                self.display = None;
                match self.remove_canvases() {
                    Ok(removed) => tracing::debug!(removed, "guest canvases removed"),
                    Err(err) => tracing::error!(?err, "failed to remove guest canvases"),
                }
            }
            SurfaceKind::Diagnostic => {
                if let Some(diagnostic) = self.diagnostic.take() {
                    diagnostic.remove();
                }
            }
        }
    }

    fn mount_banner(&mut self, text: &str) {
        match self.create_text_block(BANNER_ID, text) {
            Ok(pre) => self.banner = Some(pre),
            Err(err) => tracing::error!(?err, "failed to mount boot banner"),
        }
    }

    fn unmount_banner(&mut self) {
        if let Some(banner) = self.banner.take() {
            banner.remove();
        }
    }

    fn install_key_capture(&mut self, policy: KeyCapturePolicy) {
        let listener = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let modifiers = KeyModifiers {
                meta: event.meta_key(),
                ctrl: event.ctrl_key(),
                alt: event.alt_key(),
                shift: event.shift_key(),
            };
            if policy.suppresses_default(modifiers) {
                event.prevent_default();
            }
        });
        if let Err(err) = self
            .body
            .add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())
        {
            tracing::error!(?err, "failed to install key capture");
            return;
        }
        self.key_listener = Some(listener);
    }
}

impl Drop for DomSurface {
    fn drop(&mut self) {
        if let Some(listener) = self.key_listener.take() {
            let _ = self
                .body
                .remove_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref());
        }
    }
}
