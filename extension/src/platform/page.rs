// Content-script and page entry points for the provider bridge.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use super::{sleep, ChromeRuntime, WindowPort};
use crate::config::ExtensionConfig;
use crate::provider::{BridgeEnvelope, ContentRelay, EventHandler, ProviderBridge};
use crate::storage::chrome::{from_js, to_js};

/// Decode a `message` event posted by this same window.
fn envelope_of(window: &web_sys::Window, event: &web_sys::MessageEvent) -> Option<BridgeEnvelope> {
    let source = JsValue::from(event.source()?);
    let own: &JsValue = window.as_ref();
    if source != *own {
        return None;
    }
    let data = from_js(&event.data()).ok()?;
    serde_json::from_value(data).ok()
}

fn listen(window: &web_sys::Window, handler: impl FnMut(web_sys::MessageEvent) + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(handler);
    window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())?;
    // Lives as long as the page.
    closure.forget();
    Ok(())
}

/// Content script: forward page requests to the worker.
#[wasm_bindgen]
pub fn start_content_relay() -> Result<(), JsValue> {
    wasm_logger::init(wasm_logger::Config::default());
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let port = Rc::new(WindowPort::new().map_err(|e| JsValue::from_str(&e.to_string()))?);
    let relay = Rc::new(ContentRelay::new(Rc::new(ChromeRuntime), port));

    let page = window.clone();
    listen(&window, move |event| {
        let Some(envelope) = envelope_of(&page, &event) else {
            return;
        };
        let relay = relay.clone();
        spawn_local(async move {
            if let Err(e) = relay.relay(&envelope).await {
                log::error!("Provider relay failed: {}", e);
            }
        });
    })?;
    log::info!("Content relay started");
    Ok(())
}

/// Provider object handed to the page as `window.ethereum`.
#[wasm_bindgen]
pub struct PageProvider {
    bridge: Rc<ProviderBridge>,
    // Page callbacks and the wrappers registered for them, so `removeListener` can find them.
    handlers: RefCell<Vec<(String, js_sys::Function, EventHandler)>>,
}

#[wasm_bindgen]
impl PageProvider {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PageProvider, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let port = Rc::new(WindowPort::new().map_err(|e| JsValue::from_str(&e.to_string()))?);
        let timeout_ms = ExtensionConfig::embedded()
            .map(|c| c.provider.request_timeout_ms)
            .unwrap_or(30_000);
        let bridge = Rc::new(ProviderBridge::new(port, sleep(), timeout_ms));

        let replies = bridge.clone();
        let page = window.clone();
        listen(&window, move |event| {
            if let Some(envelope) = envelope_of(&page, &event) {
                replies.handle_message(&envelope);
            }
        })?;
        Ok(PageProvider {
            bridge,
            handlers: RefCell::new(Vec::new()),
        })
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.bridge.is_connected()
    }

    #[wasm_bindgen(getter, js_name = selectedAddress)]
    pub fn selected_address(&self) -> Option<String> {
        self.bridge.selected_address()
    }

    /// `request({method, params})`
    pub fn request(&self, args: JsValue) -> js_sys::Promise {
        let bridge = self.bridge.clone();
        future_to_promise(async move {
            let args = from_js(&args).map_err(|e| JsValue::from_str(&e.to_string()))?;
            let method = args
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| JsValue::from_str("Missing method"))?
                .to_string();
            let params = match args.get("params") {
                Some(Value::Array(params)) => params.clone(),
                _ => Vec::new(),
            };
            let result = bridge
                .request(&method, params)
                .await
                .map_err(|e| js_sys::Error::new(&e.to_string()))?;
            to_js(&result).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    pub fn enable(&self) -> js_sys::Promise {
        let bridge = self.bridge.clone();
        future_to_promise(async move {
            let accounts = bridge
                .enable()
                .await
                .map_err(|e| js_sys::Error::new(&e.to_string()))?;
            let accounts = serde_json::to_value(accounts).map_err(|e| JsValue::from_str(&e.to_string()))?;
            to_js(&accounts).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Legacy `send(method, params)`.
    pub fn send(&self, method: String, params: JsValue) -> js_sys::Promise {
        let bridge = self.bridge.clone();
        future_to_promise(async move {
            let params = match from_js(&params) {
                Ok(Value::Array(params)) => params,
                _ => Vec::new(),
            };
            let result = bridge
                .send(&method, params)
                .await
                .map_err(|e| js_sys::Error::new(&e.to_string()))?;
            to_js(&result).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    pub fn on(&self, event: &str, handler: js_sys::Function) {
        let target = handler.clone();
        let callback: EventHandler = Rc::new(move |args: &[Value]| {
            let list = js_sys::Array::new();
            for arg in args {
                if let Ok(value) = to_js(arg) {
                    list.push(&value);
                }
            }
            if let Err(e) = target.apply(&JsValue::NULL, &list) {
                log::error!("Error in event handler: {:?}", e);
            }
        });
        self.handlers
            .borrow_mut()
            .push((event.to_string(), handler, callback.clone()));
        self.bridge.on(event, callback);
    }

    #[wasm_bindgen(js_name = removeListener)]
    pub fn remove_listener(&self, event: &str, handler: &js_sys::Function) {
        let wanted: &JsValue = handler.as_ref();
        let mut handlers = self.handlers.borrow_mut();
        let found = handlers.iter().position(|(name, function, _)| {
            let function: &JsValue = function.as_ref();
            name == event && function == wanted
        });
        if let Some(index) = found {
            let (_, _, callback) = handlers.remove(index);
            self.bridge.remove_listener(event, &callback);
        }
    }
}
