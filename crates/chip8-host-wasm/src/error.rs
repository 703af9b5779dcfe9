use chip8_host_bridge::{BridgeError, ControllerError};
use wasm_bindgen::{JsCast, JsValue};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no window in this context")]
    NoWindow,
    #[error("{0} not found in the document")]
    Missing(String),
    #[error("{0} is not an iframe")]
    NotAFrame(String),
    #[error("{0} is neither a select nor an input control")]
    NotAControl(String),
    #[error("invalid options: {0}")]
    Options(String),
    #[error("hosting context is already running a bridge")]
    AlreadyInstalled,
    #[error("hosting context has no bridge installed")]
    NotInstalled,
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("javascript error: {}", describe(.0))]
    Js(JsValue),
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        HostError::Js(value)
    }
}

impl From<HostError> for JsValue {
    fn from(err: HostError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}
