//! Entry points for the hosting frame.
//!
//! Each frame owns one [`HostContext`]. Commands run as local tasks that take the context's lock
//! for the whole guest run, so a command arriving while a guest is in flight is turned away
//! instead of queued. Reloading the frame is the only way past a guest that never exits.

use std::cell::RefCell;
use std::rc::Rc;

use chip8_host_bridge::{
    BootMessage, BridgeOptions, FrameAttributes, HostContext, HostGeometry, RunOutcome,
};
use futures_util::lock::Mutex;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, ErrorEvent, HtmlIFrameElement, MessageEvent, Window};

use crate::console;
use crate::dom::DomSurface;
use crate::error::HostError;
use crate::go::GoRuntime;

type FrameContext = HostContext<GoRuntime, DomSurface>;
type SharedContext = Rc<Mutex<FrameContext>>;

thread_local! {
    static INSTALLED: RefCell<Option<SharedContext>> = const { RefCell::new(None) };
}

enum Command {
    FrameLoaded(FrameAttributes),
    Message(BootMessage),
    Restart,
}

fn parse_options(options: JsValue) -> Result<BridgeOptions, HostError> {
    if options.is_undefined() || options.is_null() {
        return Ok(BridgeOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|err| HostError::Options(err.to_string()))
}

fn install(options: JsValue) -> Result<(Window, SharedContext), HostError> {
    let options = parse_options(options)?;
    console::init(options.max_log_level());

    if INSTALLED.with(|slot| slot.borrow().is_some()) {
        return Err(HostError::AlreadyInstalled);
    }

    let window = web_sys::window().ok_or(HostError::NoWindow)?;
    let document = window
        .document()
        .ok_or_else(|| HostError::Missing("document".to_string()))?;
    let ctx = HostContext::new(GoRuntime::new(), DomSurface::new(document)?, options);

    // Uncaught errors from the guest land on the window; they are only recorded.
    let latch = ctx.supervisor().error_latch();
    let on_error = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
        latch.record(&event.message());
    });
    window.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
    on_error.forget();

    let ctx = Rc::new(Mutex::new(ctx));
    INSTALLED.with(|slot| *slot.borrow_mut() = Some(ctx.clone()));
    tracing::info!("host bridge installed");
    Ok((window, ctx))
}

/// Width of the frame element as declared by its `width` attribute, falling back to its layout
/// width.
fn frame_geometry(frame: &Element) -> HostGeometry {
    let declared = frame
        .dyn_ref::<HtmlIFrameElement>()
        .and_then(|iframe| iframe.width().trim().parse::<f64>().ok());
    HostGeometry::new(declared.unwrap_or_else(|| f64::from(frame.client_width())))
}

fn window_geometry(window: &Window) -> HostGeometry {
    let width = window
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .unwrap_or_default();
    HostGeometry::new(width)
}

fn current_geometry(window: &Window) -> HostGeometry {
    match window.frame_element() {
        Ok(Some(frame)) => frame_geometry(&frame),
        _ => window_geometry(window),
    }
}

fn dispatch(ctx: SharedContext, geometry: HostGeometry, command: Command) {
    spawn_local(async move {
        let Some(mut host) = ctx.try_lock() else {
            tracing::warn!(
                "command rejected, a guest run is in flight; boot through the frame attributes \
                 or reload the frame"
            );
            return;
        };
        let result = match command {
            Command::FrameLoaded(attrs) => host.on_frame_loaded(attrs, geometry).await,
            Command::Message(msg) => host.on_message(msg, geometry).await.map(Some),
            Command::Restart => host.restart(geometry).await.map(Some),
        };
        match result {
            Ok(Some(RunOutcome::Clean)) => tracing::info!("guest run complete"),
            Ok(Some(RunOutcome::Faulted(record))) => {
                tracing::info!(code = record.code.get(), "guest run ended with a fault")
            }
            Ok(None) => {}
            Err(err) => tracing::error!("boot failed: {err}"),
        }
    });
}

/// Boots from the `data-*` attributes of the frame element hosting this document.
///
/// A frame without `data-pgm-name` shows the boot banner instead.
#[wasm_bindgen(js_name = bootFromFrameAttributes)]
pub fn boot_from_frame_attributes(options: JsValue) -> Result<(), JsValue> {
    let (window, ctx) = install(options)?;
    let frame = window
        .frame_element()?
        .ok_or_else(|| HostError::Missing("frameElement".to_string()))?;
    let attrs = FrameAttributes::from_lookup(|name| frame.get_attribute(name));
    dispatch(ctx, frame_geometry(&frame), Command::FrameLoaded(attrs));
    Ok(())
}

/// Boots whenever the controlling page posts a boot message.
#[wasm_bindgen(js_name = listenForBootMessages)]
pub fn listen_for_boot_messages(options: JsValue) -> Result<(), JsValue> {
    let (window, ctx) = install(options)?;
    let target = window.clone();
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let msg: BootMessage = match serde_wasm_bindgen::from_value(event.data()) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!("ignoring malformed boot message: {err}");
                return;
            }
        };
        dispatch(ctx.clone(), window_geometry(&target), Command::Message(msg));
    });
    window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())?;
    on_message.forget();
    Ok(())
}

/// Boots again from the last accepted request, sized for the frame as it is now.
#[wasm_bindgen(js_name = restartGuest)]
pub fn restart_guest() -> Result<(), JsValue> {
    let ctx = INSTALLED
        .with(|slot| slot.borrow().clone())
        .ok_or(HostError::NotInstalled)?;
    let window = web_sys::window().ok_or(HostError::NoWindow)?;
    dispatch(ctx, current_geometry(&window), Command::Restart);
    Ok(())
}
