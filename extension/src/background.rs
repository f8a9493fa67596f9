// Background service worker for the wallet extension.
// The JavaScript glue only forwards browser events; every decision is made
// by `BackgroundWorker` in the library.

#[cfg(target_arch = "wasm32")]
mod service {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{future_to_promise, spawn_local};

    use wallet_extension::api::ReqwestTransport;
    use wallet_extension::clock::SystemClock;
    use wallet_extension::config::ExtensionConfig;
    use wallet_extension::platform::ChromeWindows;
    use wallet_extension::router::{ChromeMessage, MessageSender};
    use wallet_extension::storage::ChromeStorage;
    use wallet_extension::worker::{BackgroundWorker, InstallReason};

    thread_local! {
        static WORKER: RefCell<Option<Rc<BackgroundWorker>>> = const { RefCell::new(None) };
    }

    fn worker() -> Result<Rc<BackgroundWorker>, JsValue> {
        WORKER
            .with(|w| w.borrow().clone())
            .ok_or_else(|| JsValue::from_str("Background worker not initialized"))
    }

    fn to_json(value: &JsValue) -> Result<serde_json::Value, JsValue> {
        let text = js_sys::JSON::stringify(value)?
            .as_string()
            .ok_or_else(|| JsValue::from_str("Message is not JSON"))?;
        serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    fn to_js(value: &serde_json::Value) -> Result<JsValue, JsValue> {
        js_sys::JSON::parse(&value.to_string())
    }

    /// Initialize background service worker
    #[wasm_bindgen]
    pub fn init_background() -> Result<(), JsValue> {
        wasm_logger::init(wasm_logger::Config::default());
        let config = ExtensionConfig::embedded().map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        let worker = BackgroundWorker::new(
            &config,
            Rc::new(ChromeStorage::new()),
            Rc::new(ChromeWindows),
            Rc::new(ReqwestTransport::new()),
            Rc::new(SystemClock),
        );
        WORKER.with(|w| *w.borrow_mut() = Some(Rc::new(worker)));
        log::info!("Wallet background service initialized");
        Ok(())
    }

    /// Minutes between `refreshData` alarms.
    #[wasm_bindgen]
    pub fn refresh_period_minutes() -> Result<u32, JsValue> {
        Ok(worker()?.refresh_period_minutes())
    }

    #[wasm_bindgen]
    pub fn handle_install(reason: &str) -> Result<(), JsValue> {
        let worker = worker()?;
        let Some(reason) = InstallReason::parse(reason) else {
            log::warn!("Unknown install reason: {}", reason);
            return Ok(());
        };
        spawn_local(async move { worker.on_installed(reason).await });
        Ok(())
    }

    /// Toolbar icon clicked in `window_id`.
    #[wasm_bindgen]
    pub fn handle_icon_click(window_id: Option<u32>) -> Result<(), JsValue> {
        let worker = worker()?;
        spawn_local(async move { worker.on_icon_click(window_id).await });
        Ok(())
    }

    #[wasm_bindgen]
    pub fn handle_alarm(name: String) -> Result<(), JsValue> {
        let worker = worker()?;
        spawn_local(async move { worker.on_alarm(&name).await });
        Ok(())
    }

    /// Resolves to the reply, or to `undefined` when the type is not ours.
    #[wasm_bindgen]
    pub fn handle_message(message: JsValue, sender_window: Option<u32>) -> Result<js_sys::Promise, JsValue> {
        let worker = worker()?;
        let message: ChromeMessage =
            serde_json::from_value(to_json(&message)?).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sender = MessageSender {
            tab_window_id: sender_window,
        };
        Ok(future_to_promise(async move {
            match worker.handle_message(&message, sender).await {
                Some(reply) => {
                    let value = serde_json::to_value(reply).map_err(|e| JsValue::from_str(&e.to_string()))?;
                    to_js(&value)
                }
                None => Ok(JsValue::UNDEFINED),
            }
        }))
    }
}

// Binary target exists for the wasm exports above.
fn main() {}
