// Ethereum-style provider exposed to web pages, and the content-script relay
// that carries its requests to the background worker.
//
// Page and content script talk over `window.postMessage` with a small
// envelope tagged by `source`. Each request gets a numeric id and waits at
// most `request_timeout_ms` for the matching reply; a reply that arrives
// after the timeout finds no pending entry and is dropped.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{self, Either, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WalletError};
use crate::router::ChromeMessage;

pub const SOURCE_INJECTED: &str = "ext-injected";
pub const SOURCE_CONTENT: &str = "ext-content";
pub const PROVIDER_REQUEST: &str = "PROVIDER_REQUEST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub source: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeEnvelope {
    pub fn request(id: u64, method: &str, params: Vec<Value>) -> Self {
        Self {
            source: SOURCE_INJECTED.to_string(),
            id,
            method: Some(method.to_string()),
            params: Some(params),
            response: None,
            error: None,
        }
    }

    pub fn response(id: u64, response: Value) -> Self {
        Self {
            source: SOURCE_CONTENT.to_string(),
            id,
            method: None,
            params: None,
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            source: SOURCE_CONTENT.to_string(),
            id,
            method: None,
            params: None,
            response: None,
            error: Some(error.into()),
        }
    }

    pub fn is_from(&self, source: &str) -> bool {
        self.source == source
    }
}

/// `window.postMessage` to the same page.
pub trait PagePort {
    fn post(&self, envelope: &BridgeEnvelope);
}

/// Timer used for the request timeout.
pub type Sleep = Rc<dyn Fn(u32) -> LocalBoxFuture<'static, ()>>;

pub type EventHandler = Rc<dyn Fn(&[Value])>;

type Pending = Rc<RefCell<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// Page-side half of the bridge.
pub struct ProviderBridge {
    port: Rc<dyn PagePort>,
    sleep: Sleep,
    timeout_ms: u32,
    next_id: Cell<u64>,
    pending: Pending,
    listeners: RefCell<HashMap<String, Vec<EventHandler>>>,
    selected_address: RefCell<Option<String>>,
}

impl ProviderBridge {
    pub fn new(port: Rc<dyn PagePort>, sleep: Sleep, timeout_ms: u32) -> Self {
        Self {
            port,
            sleep,
            timeout_ms,
            next_id: Cell::new(0),
            pending: Rc::new(RefCell::new(HashMap::new())),
            listeners: RefCell::new(HashMap::new()),
            selected_address: RefCell::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.selected_address.borrow().is_some()
    }

    pub fn selected_address(&self) -> Option<String> {
        self.selected_address.borrow().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        log::debug!("Provider request {} #{}", method, id);

        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(id, tx);
        self.port.post(&BridgeEnvelope::request(id, method, params));

        match future::select(rx, (self.sleep)(self.timeout_ms)).await {
            Either::Left((Ok(result), _)) => result,
            Either::Left((Err(_canceled), _)) => Err(WalletError::Provider("Request dropped".to_string())),
            Either::Right(((), _)) => {
                self.pending.borrow_mut().remove(&id);
                log::warn!("Provider request {} #{} timed out", method, id);
                Err(WalletError::RequestTimeout)
            }
        }
    }

    /// Settle the pending request a content-script reply belongs to.
    pub fn handle_message(&self, envelope: &BridgeEnvelope) {
        if !envelope.is_from(SOURCE_CONTENT) {
            return;
        }
        let Some(tx) = self.pending.borrow_mut().remove(&envelope.id) else {
            log::debug!("Dropping reply for unknown request #{}", envelope.id);
            return;
        };
        // The receiver may already be gone if the page dropped the request.
        let _ = tx.send(Self::settle(envelope));
    }

    fn settle(envelope: &BridgeEnvelope) -> Result<Value> {
        if let Some(error) = &envelope.error {
            return Err(WalletError::Provider(error.clone()));
        }
        let response = envelope.response.clone().unwrap_or(Value::Null);
        if response.get("success").and_then(Value::as_bool) == Some(false) {
            let error = response
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Request failed");
            return Err(WalletError::Provider(error.to_string()));
        }
        Ok(response.get("data").cloned().unwrap_or(Value::Null))
    }

    /// `eth_requestAccounts`; remembers the first account as selected.
    pub async fn enable(&self) -> Result<Vec<String>> {
        let accounts: Vec<String> =
            serde_json::from_value(self.request("eth_requestAccounts", Vec::new()).await?)?;
        if let Some(first) = accounts.first() {
            *self.selected_address.borrow_mut() = Some(first.clone());
            self.emit("accountsChanged", &[serde_json::to_value(&accounts)?]);
        }
        Ok(accounts)
    }

    pub async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        self.request(method, params).await
    }

    pub fn on(&self, event: &str, handler: EventHandler) {
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    pub fn remove_listener(&self, event: &str, handler: &EventHandler) {
        if let Some(handlers) = self.listeners.borrow_mut().get_mut(event) {
            if let Some(index) = handlers.iter().position(|h| Rc::ptr_eq(h, handler)) {
                handlers.remove(index);
            }
        }
    }

    pub fn emit(&self, event: &str, args: &[Value]) {
        // Clone out so a handler may register or remove listeners.
        let handlers = self.listeners.borrow().get(event).cloned().unwrap_or_default();
        for handler in handlers {
            handler(args);
        }
    }
}

/// Runtime messaging to the background worker.
#[async_trait(?Send)]
pub trait RuntimeChannel {
    /// The reply, or `Value::Null` when no listener answered.
    async fn send_message(&self, message: &ChromeMessage) -> Result<Value>;
}

/// Content-script half of the bridge.
pub struct ContentRelay {
    runtime: Rc<dyn RuntimeChannel>,
    port: Rc<dyn PagePort>,
}

impl ContentRelay {
    pub fn new(runtime: Rc<dyn RuntimeChannel>, port: Rc<dyn PagePort>) -> Self {
        Self { runtime, port }
    }

    /// Forward one page request and post the outcome back. Envelopes from
    /// any other source are ignored.
    pub async fn relay(&self, envelope: &BridgeEnvelope) -> Result<()> {
        if !envelope.is_from(SOURCE_INJECTED) {
            return Ok(());
        }
        let message = ChromeMessage::new(PROVIDER_REQUEST).with_data(serde_json::to_value(envelope)?);

        let reply = match self.runtime.send_message(&message).await {
            Ok(Value::Null) => {
                let unanswered = WalletError::UnknownMessage(PROVIDER_REQUEST.to_string());
                BridgeEnvelope::failure(envelope.id, unanswered.to_string())
            }
            Ok(response) => BridgeEnvelope::response(envelope.id, response),
            Err(e) => {
                log::error!("Failed to handle provider request: {}", e);
                BridgeEnvelope::failure(envelope.id, e.to_string())
            }
        };
        self.port.post(&reply);
        Ok(())
    }
}
