//! Guest runtime for interpreters built with Go's `GOOS=js GOARCH=wasm` toolchain.
//!
//! Relies on the `Go` class from the toolchain's `wasm_exec.js` being loaded in the hosting
//! document. Its `exit` method is replaced with a closure that fires the bridge's exit hook.

use chip8_host_bridge::{ExitHook, ExitSignal, GuestError, GuestLaunch, GuestRuntime};
use chip8_host_protocol::exit;
use js_sys::{Array, Function, Object, Promise, Reflect, WebAssembly};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::error::describe;

#[derive(Default)]
pub struct GoRuntime {
    on_exit: Option<Closure<dyn FnMut(JsValue)>>,
}

/// A `Go` runtime object and the module instance it will run.
pub struct GoInstance {
    go: Object,
    instance: JsValue,
}

impl GoRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn exit_handler(hook: ExitHook) -> Closure<dyn FnMut(JsValue)> {
        Closure::new(move |code: JsValue| {
            let code = code.as_f64().map_or(exit::GENERAL, |code| code as i32);
            if !hook.signal(ExitSignal::new(code)) {
                tracing::debug!(code, "guest exited again after its exit was delivered");
            }
        })
    }
}

fn instantiate_error(err: JsValue) -> GuestError {
    GuestError::Instantiate(describe(&err))
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

impl GuestRuntime for GoRuntime {
    type Instance = GoInstance;

    async fn instantiate(&mut self, launch: GuestLaunch) -> Result<GoInstance, GuestError> {
        let window = web_sys::window()
            .ok_or_else(|| GuestError::Instantiate("no window in this context".to_string()))?;

        let ctor: Function = get(&js_sys::global(), "Go")
            .map_err(instantiate_error)?
            .dyn_into()
            .map_err(|_| GuestError::Instantiate("`Go` runtime class is not loaded".to_string()))?;
        let go: Object = Reflect::construct(&ctor, &Array::new())
            .map_err(instantiate_error)?
            .unchecked_into();

        let argv: Array = launch
            .args
            .to_argv()
            .into_iter()
            .map(JsValue::from)
            .collect();
        Reflect::set(&go, &JsValue::from_str("argv"), &argv).map_err(instantiate_error)?;

        let on_exit = Self::exit_handler(launch.exit);
        Reflect::set(&go, &JsValue::from_str("exit"), on_exit.as_ref())
            .map_err(instantiate_error)?;
        self.on_exit = Some(on_exit);

        let imports: Object = get(&go, "importObject")
            .map_err(instantiate_error)?
            .unchecked_into();
        let response = window.fetch_with_str(&launch.module_url);
        let result = JsFuture::from(WebAssembly::instantiate_streaming(&response, &imports))
            .await
            .map_err(|err| GuestError::Fetch {
                url: launch.module_url.clone(),
                reason: describe(&err),
            })?;
        let instance = get(&result, "instance").map_err(instantiate_error)?;

        tracing::debug!(url = %launch.module_url, "guest module instantiated");
        Ok(GoInstance { go, instance })
    }

    fn run(&mut self, guest: GoInstance) -> Result<(), GuestError> {
        let start = |err: JsValue| GuestError::Start(describe(&err));
        let run: Function = get(&guest.go, "run")
            .map_err(start)?
            .dyn_into()
            .map_err(|_| GuestError::Start("`Go.run` is not a function".to_string()))?;
        let pending = run.call1(&guest.go, &guest.instance).map_err(start)?;

        // `run` resolves when the guest's main returns; a rejection is an uncaught guest error.
        if let Ok(pending) = pending.dyn_into::<Promise>() {
            spawn_local(async move {
                if let Err(err) = JsFuture::from(pending).await {
                    tracing::debug!(reason = %describe(&err), "guest run promise rejected");
                }
            });
        }
        Ok(())
    }
}
