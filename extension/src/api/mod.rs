// Client for the remote wallet backend.
// All key handling, signing and balance math happen server-side; this only
// marshals requests and unwraps the response envelopes.

mod dto;
mod envelope;

pub use dto::{Chain, ChainType, ImportKind, SwapQuote, Wallet, WalletBalance, WalletToken};
pub use envelope::{
    classify_bad_request, classify_failure, is_success, scrape_message, ApiEnvelope, Convention,
};

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{ApiError, Result};

/// Status code and decoded body. Non-JSON bodies arrive as a JSON string.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse>;
}

/// `fetch`-backed on wasm32, hyper-backed elsewhere.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn decode(resp: reqwest::Response) -> Result<HttpResponse> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(HttpResponse { status, body })
    }
}

#[async_trait(?Send)]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self.client.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse> {
        let mut req = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.body(serde_json::to_string(body)?);
        }
        let resp = req.send().await?;
        Self::decode(resp).await
    }
}

/// Outcome of `set_password` when the server already holds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPasswordOutcome {
    Set,
    AlreadySet,
}

pub struct ApiClient {
    base_url: String,
    transport: Rc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Rc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Require success under `convention`, else classify the failure.
    fn expect(resp: HttpResponse, convention: Convention, fallback: &str) -> Result<Value> {
        if resp.is_ok() && is_success(&resp.body, convention) {
            return Ok(resp.body);
        }
        log::error!("API call failed ({}): {}", resp.status, resp.body);
        Err(classify_failure(resp.status, &resp.body, fallback).into())
    }

    fn data(body: Value) -> Value {
        ApiEnvelope::decode(&body)
            .and_then(ApiEnvelope::into_data)
            .unwrap_or(Value::Null)
    }

    pub async fn list_wallets(&self, device_id: &str) -> Result<Vec<Wallet>> {
        let resp = self
            .transport
            .get(&self.url(&format!("/wallets/?device_id={}", device_id)))
            .await?;
        let body = Self::expect(resp, Convention::State, "Failed to get wallets")?;
        match Self::data(body) {
            Value::Null => Ok(Vec::new()),
            data => Ok(serde_json::from_value(data)?),
        }
    }

    pub async fn create_wallet(&self, request: &Value) -> Result<Value> {
        let resp = self.transport.post(&self.url("/wallets/"), Some(request)).await?;
        let body = Self::expect(resp, Convention::State, "Failed to create wallet")?;
        Ok(Self::data(body))
    }

    pub async fn import_wallet(&self, kind: ImportKind, request: &Value) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/", kind.endpoint()));
        log::info!("Import wallet request via {}", kind.endpoint());
        let resp = self.transport.post(&url, Some(request)).await?;
        let body = Self::expect(resp, Convention::State, "Failed to import wallet")?;
        Ok(Self::data(body))
    }

    pub async fn delete_wallet(&self, wallet_id: u64) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/delete_wallet/", wallet_id));
        let resp = self.transport.post(&url, None).await?;
        let body = Self::expect(resp, Convention::State, "Failed to delete wallet")?;
        Ok(Self::data(body))
    }

    /// Whole `get_all_balances` body; balances are flat fields, not `data`.
    /// The worker passthrough and the wallet screens check different envelopes.
    pub async fn get_all_balances(&self, wallet_id: u64, convention: Convention) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/get_all_balances/", wallet_id));
        let resp = self.transport.get(&url).await?;
        Self::expect(resp, convention, "Failed to get balance")
    }

    pub async fn refresh_balances(&self, wallet_id: u64) -> Result<()> {
        let url = self.url(&format!("/wallets/{}/refresh_balances/", wallet_id));
        let resp = self.transport.post(&url, None).await?;
        if !resp.is_ok() {
            return Err(ApiError::Remote(format!("Failed to refresh balance: {}", resp.status)).into());
        }
        if !is_success(&resp.body, Convention::Status) {
            let message = resp
                .body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Failed to refresh balance");
            return Err(ApiError::Remote(message.to_string()).into());
        }
        Ok(())
    }

    pub async fn get_token_prices(&self, wallet_id: u64) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/get_token_prices/", wallet_id));
        let resp = self.transport.get(&url).await?;
        Self::expect(resp, Convention::Status, "Failed to refresh token prices")
    }

    pub async fn transfer(&self, wallet_id: u64, request: &Value) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/transfer/", wallet_id));
        let resp = self.transport.post(&url, Some(request)).await?;
        let body = Self::expect(resp, Convention::State, "Transfer failed")?;
        Ok(Self::data(body))
    }

    pub async fn swap_quote(&self, wallet_id: u64, request: &Value) -> Result<SwapQuote> {
        let url = self.url(&format!("/wallets/{}/swap/quote/", wallet_id));
        let resp = self.transport.post(&url, Some(request)).await?;
        let body = Self::expect(resp, Convention::State, "Failed to get swap quote")?;
        Ok(serde_json::from_value(Self::data(body))?)
    }

    pub async fn execute_swap(&self, wallet_id: u64, request: &Value) -> Result<Value> {
        let url = self.url(&format!("/wallets/{}/swap/execute/", wallet_id));
        let resp = self.transport.post(&url, Some(request)).await?;
        let body = Self::expect(resp, Convention::State, "Swap failed")?;
        Ok(Self::data(body))
    }

    pub async fn supported_chains(&self) -> Result<Vec<Chain>> {
        let resp = self
            .transport
            .get(&self.url("/wallets/get_supported_chains/"))
            .await?;
        let body = Self::expect(resp, Convention::State, "Failed to get supported chains")?;
        match Self::data(body) {
            Value::Null => Ok(Vec::new()),
            data => Ok(serde_json::from_value(data)?),
        }
    }

    pub async fn set_password(&self, device_id: &str, password: &str) -> Result<SetPasswordOutcome> {
        let request = json!({
            "device_id": device_id,
            "payment_password": password,
            "payment_password_confirm": password,
        });
        let resp = self
            .transport
            .post(&self.url("/wallets/set_password/"), Some(&request))
            .await?;

        if is_success(&resp.body, Convention::State) {
            return Ok(SetPasswordOutcome::Set);
        }
        let already_set = resp.status == 400
            && resp
                .body
                .get("message")
                .and_then(Value::as_str)
                .is_some_and(|m| m.contains("already set"));
        if already_set {
            return Ok(SetPasswordOutcome::AlreadySet);
        }
        Err(ApiError::Remote(
            scrape_message(&resp.body).unwrap_or_else(|| "Failed to set password".to_string()),
        )
        .into())
    }

    pub async fn verify_password(&self, device_id: &str, password: &str) -> Result<()> {
        let request = json!({
            "device_id": device_id,
            "payment_password": password,
        });
        let resp = self
            .transport
            .post(&self.url("/wallets/verify_password/"), Some(&request))
            .await?;
        if is_success(&resp.body, Convention::State) {
            return Ok(());
        }
        Err(ApiError::Remote(
            scrape_message(&resp.body).unwrap_or_else(|| "Invalid password".to_string()),
        )
        .into())
    }

    pub async fn change_password(&self, device_id: &str, old_password: &str, new_password: &str) -> Result<()> {
        let request = json!({
            "device_id": device_id,
            "old_password": old_password,
            "new_password": new_password,
        });
        let resp = self
            .transport
            .post(&self.url("/wallets/change_password/"), Some(&request))
            .await?;
        if is_success(&resp.body, Convention::Status) {
            return Ok(());
        }
        Err(ApiError::Remote(
            scrape_message(&resp.body).unwrap_or_else(|| "Failed to change password".to_string()),
        )
        .into())
    }

    /// `None` when the server answered without a success envelope.
    pub async fn password_status(&self, device_id: &str) -> Result<Option<bool>> {
        let url = self.url(&format!("/wallets/payment_password/status/{}/", device_id));
        let resp = self.transport.get(&url).await?;
        if !is_success(&resp.body, Convention::State) {
            return Ok(None);
        }
        let has_password = Self::data(resp.body)
            .get("has_password")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Some(has_password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalletError;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedTransport {
        fn reply(&self, status: u16, body: Value) {
            self.responses
                .borrow_mut()
                .push_back(HttpResponse { status, body });
        }

        fn next(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), body.cloned()));
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| WalletError::Http("no scripted response".into()))
        }
    }

    #[async_trait(?Send)]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.next(url, None)
        }

        async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse> {
            self.next(url, body)
        }
    }

    fn client() -> (ApiClient, Rc<ScriptedTransport>) {
        let transport = Rc::new(ScriptedTransport::default());
        (ApiClient::new("http://api.test/api/v1/", transport.clone()), transport)
    }

    #[tokio::test]
    async fn list_wallets_uses_state_envelope() {
        let (api, transport) = client();
        transport.reply(
            200,
            json!({ "state": "success", "data": [{ "id": 1, "name": "Main", "chain": "ETH" }] }),
        );

        let wallets = api.list_wallets("dev-1").await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(
            transport.requests.borrow()[0].0,
            "http://api.test/api/v1/wallets/?device_id=dev-1"
        );
    }

    #[tokio::test]
    async fn import_400_maps_to_password_message() {
        let (api, transport) = client();
        transport.reply(400, json!({ "non_field_errors": ["Incorrect password"] }));

        let err = api
            .import_wallet(ImportKind::PrivateKey, &json!({ "private_key": "abc" }))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incorrect password. Please check your payment password."
        );
        assert!(transport.requests.borrow()[0]
            .0
            .ends_with("/wallets/import_private_key/"));
    }

    #[tokio::test]
    async fn token_prices_require_status_envelope() {
        let (api, transport) = client();
        transport.reply(200, json!({ "state": "success" }));
        assert!(api.get_token_prices(4).await.is_err());

        transport.reply(200, json!({ "status": "success", "prices": {} }));
        let body = api.get_token_prices(4).await.unwrap();
        assert!(body.get("prices").is_some());
    }

    #[tokio::test]
    async fn set_password_already_set_is_not_an_error() {
        let (api, transport) = client();
        transport.reply(400, json!({ "state": "error", "message": "Password already set" }));
        assert_eq!(
            api.set_password("dev-1", "hunter22").await.unwrap(),
            SetPasswordOutcome::AlreadySet
        );
    }

    #[tokio::test]
    async fn password_status_reads_flag() {
        let (api, transport) = client();
        transport.reply(200, json!({ "state": "success", "data": { "has_password": true } }));
        assert_eq!(api.password_status("dev-1").await.unwrap(), Some(true));

        transport.reply(404, json!({ "detail": "Not found." }));
        assert_eq!(api.password_status("dev-1").await.unwrap(), None);
    }
}
