// Shared fakes for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{json, Value};

use wallet_extension::api::{HttpResponse, HttpTransport};
use wallet_extension::error::Result;
use wallet_extension::window_mode::{PanelOptions, WindowId, WindowPlatform};

pub const BASE_URL: &str = "http://api.test/api/v1";

/// Serves canned responses keyed by `METHOD path`; unknown routes get a 404.
#[derive(Default)]
pub struct FakeApi {
    routes: RefCell<HashMap<String, (u16, Value)>>,
    requests: RefCell<Vec<(String, Option<Value>)>>,
}

impl FakeApi {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn route(&self, method: &str, path: &str, status: u16, body: Value) {
        self.routes
            .borrow_mut()
            .insert(format!("{} {}{}", method, BASE_URL, path), (status, body));
    }

    /// Requests seen so far, as `METHOD path` without the base URL.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|(r, _)| r.replacen(BASE_URL, "", 1))
            .collect()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.requests.borrow().last().and_then(|(_, body)| body.clone())
    }

    fn answer(&self, key: String, body: Option<&Value>) -> Result<HttpResponse> {
        self.requests.borrow_mut().push((key.clone(), body.cloned()));
        let (status, body) = self
            .routes
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or((404, json!({ "detail": "Not found." })));
        Ok(HttpResponse { status, body })
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeApi {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.answer(format!("GET {}", url), None)
    }

    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse> {
        self.answer(format!("POST {}", url), body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCall {
    OpenPanel(WindowId),
    Options(PanelOptions),
    Surface(WindowId, String),
    ActionPopup,
}

/// Browser with a side panel and a focused window `current`.
#[derive(Default)]
pub struct FakeWindows {
    pub current: Option<WindowId>,
    calls: RefCell<Vec<WindowCall>>,
}

impl FakeWindows {
    pub fn focused(id: WindowId) -> Rc<Self> {
        Rc::new(Self {
            current: Some(id),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl WindowPlatform for FakeWindows {
    async fn current_window(&self) -> Result<Option<WindowId>> {
        Ok(self.current)
    }

    fn has_side_panel(&self) -> bool {
        true
    }

    async fn open_side_panel(&self, window_id: WindowId) -> Result<()> {
        self.calls.borrow_mut().push(WindowCall::OpenPanel(window_id));
        Ok(())
    }

    async fn set_side_panel_options(&self, options: PanelOptions) -> Result<()> {
        self.calls.borrow_mut().push(WindowCall::Options(options));
        Ok(())
    }

    async fn open_surface(&self, window_id: WindowId, page: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(WindowCall::Surface(window_id, page.to_string()));
        Ok(())
    }

    async fn open_action_popup(&self) -> Result<()> {
        self.calls.borrow_mut().push(WindowCall::ActionPopup);
        Ok(())
    }
}

pub fn wallet_list() -> Value {
    json!({
        "state": "success",
        "data": [
            { "id": 1, "address": "0xabc", "name": "Main", "chain": "ETH" },
            { "id": 2, "address": "So1ana", "name": "Trading", "chain": "SOL" }
        ]
    })
}
