// Chrome extension API bindings behind the crate's platform traits.

mod page;

pub use page::{start_content_relay, PageProvider};

use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{Result, WalletError};
use crate::provider::{BridgeEnvelope, PagePort, RuntimeChannel, Sleep};
use crate::router::ChromeMessage;
use crate::storage::chrome::{from_js, to_js};
use crate::window_mode::{PanelOptions, WindowId, WindowPlatform};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = getCurrent)]
    fn windows_get_current() -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "sidePanel"], js_name = open)]
    fn side_panel_open(options: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "sidePanel"], js_name = setOptions)]
    fn side_panel_set_options(options: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = create)]
    fn tabs_create(properties: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = openPopup)]
    fn action_open_popup() -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> String;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    fn runtime_send_message(message: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;
}

fn js_err(err: JsValue) -> WalletError {
    WalletError::Platform(
        err.as_string()
            .or_else(|| {
                js_sys::Reflect::get(&err, &"message".into())
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

async fn settle(promise: std::result::Result<js_sys::Promise, JsValue>) -> Result<JsValue> {
    JsFuture::from(promise.map_err(js_err)?).await.map_err(js_err)
}

/// `chrome.<api>` exists in this browser.
fn has_api(name: &str) -> bool {
    js_sys::Reflect::get(&js_sys::global(), &"chrome".into())
        .ok()
        .filter(|chrome| !chrome.is_undefined())
        .and_then(|chrome| js_sys::Reflect::get(&chrome, &name.into()).ok())
        .is_some_and(|api| !api.is_undefined())
}

#[derive(Clone, Copy, Default)]
pub struct ChromeWindows;

#[async_trait(?Send)]
impl WindowPlatform for ChromeWindows {
    async fn current_window(&self) -> Result<Option<WindowId>> {
        let window = from_js(&settle(windows_get_current()).await?)?;
        Ok(window
            .get("id")
            .and_then(Value::as_u64)
            .map(|id| id as WindowId))
    }

    fn has_side_panel(&self) -> bool {
        has_api("sidePanel")
    }

    async fn open_side_panel(&self, window_id: WindowId) -> Result<()> {
        settle(side_panel_open(to_js(&json!({ "windowId": window_id }))?)).await?;
        Ok(())
    }

    async fn set_side_panel_options(&self, options: PanelOptions) -> Result<()> {
        let mut value = serde_json::Map::new();
        if let Some(enabled) = options.enabled {
            value.insert("enabled".to_string(), Value::Bool(enabled));
        }
        if let Some(path) = options.path {
            value.insert("path".to_string(), Value::String(path));
        }
        settle(side_panel_set_options(to_js(&Value::Object(value))?)).await?;
        Ok(())
    }

    async fn open_surface(&self, window_id: WindowId, page: &str) -> Result<()> {
        let properties = json!({ "url": runtime_get_url(page), "windowId": window_id });
        settle(tabs_create(to_js(&properties)?)).await?;
        Ok(())
    }

    async fn open_action_popup(&self) -> Result<()> {
        settle(action_open_popup()).await?;
        Ok(())
    }
}

/// `chrome.runtime.sendMessage` from UI surfaces and the content script.
#[derive(Clone, Copy, Default)]
pub struct ChromeRuntime;

#[async_trait(?Send)]
impl RuntimeChannel for ChromeRuntime {
    async fn send_message(&self, message: &ChromeMessage) -> Result<Value> {
        let reply = settle(runtime_send_message(to_js(&serde_json::to_value(message)?)?)).await?;
        from_js(&reply)
    }
}

/// `window.postMessage` on the current page.
pub struct WindowPort {
    window: web_sys::Window,
}

impl WindowPort {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| WalletError::Platform("No window".to_string()))?;
        Ok(Self { window })
    }
}

impl PagePort for WindowPort {
    fn post(&self, envelope: &BridgeEnvelope) {
        let message = serde_json::to_value(envelope)
            .map_err(WalletError::from)
            .and_then(|value| to_js(&value));
        match message {
            Ok(message) => {
                if let Err(e) = self.window.post_message(&message, "*") {
                    log::error!("postMessage failed: {:?}", e);
                }
            }
            Err(e) => log::error!("Failed to encode bridge message: {}", e),
        }
    }
}

pub fn sleep() -> Sleep {
    Rc::new(|ms| gloo_timers::future::TimeoutFuture::new(ms).boxed_local())
}
