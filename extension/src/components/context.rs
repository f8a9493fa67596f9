// Services shared by every screen of a popup or side panel, provided once
// through the Dioxus context API.

use std::rc::Rc;

use dioxus::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::api::{ApiClient, ReqwestTransport};
use crate::auth::AuthStore;
use crate::clock::SystemClock;
use crate::config::ExtensionConfig;
use crate::navigation::{Navigator, Route};
use crate::platform::ChromeRuntime;
use crate::provider::RuntimeChannel;
use crate::router::ChromeMessage;
use crate::session::{SessionTimer, ACTIVITY_EVENTS};
use crate::storage::ChromeStorage;
use crate::wallet::WalletService;
use crate::window_mode::WindowMode;

/// Drives the screen shown by `App`.
#[derive(Clone, Copy)]
pub struct SignalNavigator {
    route: Signal<Route>,
}

impl Navigator for SignalNavigator {
    fn current_route(&self) -> Route {
        self.route.peek().clone()
    }

    fn navigate(&self, route: Route) {
        log::debug!("Navigate to {}", route);
        let mut current = self.route;
        current.set(route);
    }
}

#[derive(Clone)]
pub struct WalletContext {
    pub mode: WindowMode,
    pub config: Rc<ExtensionConfig>,
    pub auth: Rc<AuthStore>,
    pub wallets: Rc<WalletService>,
    pub session: Rc<SessionTimer>,
    pub navigator: Rc<SignalNavigator>,
    pub runtime: ChromeRuntime,
}

// Contexts don't need real equality
impl PartialEq for WalletContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.auth, &other.auth)
    }
}

impl WalletContext {
    pub fn new(route: Signal<Route>, mode: WindowMode, config: ExtensionConfig) -> Self {
        let store = Rc::new(ChromeStorage::new());
        let clock = Rc::new(SystemClock);
        let navigator = Rc::new(SignalNavigator { route });
        let api = Rc::new(ApiClient::new(
            config.api.base_url.clone(),
            Rc::new(ReqwestTransport::new()),
        ));
        let session = Rc::new(SessionTimer::new(
            store.clone(),
            clock.clone(),
            navigator.clone(),
            config.session.password_session_timeout_ms,
        ));
        let auth = Rc::new(AuthStore::new(store.clone(), api.clone(), session.clone()));
        let wallets = Rc::new(WalletService::new(api, store, clock));
        Self {
            mode,
            config: Rc::new(config),
            auth,
            wallets,
            session,
            navigator,
            runtime: ChromeRuntime,
        }
    }

    pub fn go(&self, route: Route) {
        self.navigator.navigate(route);
    }

    /// Send a message to the background worker; its `error` becomes `Err`.
    pub async fn send(&self, message: ChromeMessage) -> Result<serde_json::Value, String> {
        let reply = self
            .runtime
            .send_message(&message)
            .await
            .map_err(|e| e.to_string())?;
        if reply.get("success").and_then(|s| s.as_bool()) == Some(true) {
            Ok(reply.get("data").cloned().unwrap_or_default())
        } else {
            Err(reply
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Request failed")
                .to_string())
        }
    }

    /// Feed qualifying DOM input into the idle timer.
    pub fn watch_activity(&self) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document"))?;
        for event in ACTIVITY_EVENTS {
            let session = self.session.clone();
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| session.record_activity());
            document.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }
}
