// Wallet operations proxied to the remote API, plus the local wallet cache
// and current-wallet selection.
//
// Create and import are not de-duplicated: two identical requests in flight
// produce two server calls.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{ApiClient, Chain, Convention, ImportKind, SwapQuote, Wallet, WalletBalance};
use crate::clock::Clock;
use crate::error::{Result, WalletError};
use crate::settings::{self, Settings};
use crate::storage::{self, keys, KeyValueStore};

/// Selection persisted under `current_wallet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWallet {
    pub wallet_id: u64,
}

pub struct WalletService {
    api: Rc<ApiClient>,
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

/// `walletId` carried by transfer/swap payloads.
pub(crate) fn wallet_id_of(payload: &Value) -> Result<u64> {
    payload
        .get("walletId")
        .and_then(Value::as_u64)
        .ok_or(WalletError::MissingField("walletId"))
}

fn with_device_id(payload: Value, device_id: &str) -> Value {
    let mut body = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("device_id".to_string(), Value::String(device_id.to_string()));
    Value::Object(body)
}

impl WalletService {
    pub fn new(api: Rc<ApiClient>, store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { api, store, clock }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn device_id(&self) -> Result<String> {
        storage::read::<String>(self.store.as_ref(), keys::DEVICE_ID)
            .await?
            .filter(|id| !id.is_empty())
            .ok_or(WalletError::DeviceIdMissing)
    }

    /// Fetch the wallet list and overwrite the local cache with it.
    pub async fn get_wallets(&self) -> Result<Vec<Wallet>> {
        let device_id = self.device_id().await?;
        let wallets = self.api.list_wallets(&device_id).await?;
        storage::write(self.store.as_ref(), keys::WALLETS, &wallets).await?;
        log::debug!("Cached {} wallets", wallets.len());
        Ok(wallets)
    }

    /// Last fetched list without touching the network.
    pub async fn cached_wallets(&self) -> Result<Vec<Wallet>> {
        Ok(storage::read(self.store.as_ref(), keys::WALLETS)
            .await?
            .unwrap_or_default())
    }

    pub async fn create_wallet(&self, payload: Value) -> Result<Value> {
        let device_id = self.device_id().await?;
        let created = self
            .api
            .create_wallet(&with_device_id(payload, &device_id))
            .await?;
        self.get_wallets().await?;
        Ok(created)
    }

    pub async fn import_wallet(&self, payload: Value) -> Result<Value> {
        let device_id = self.device_id().await?;
        let kind = ImportKind::detect(&payload).ok_or(WalletError::InvalidImportData)?;
        let imported = self
            .api
            .import_wallet(kind, &with_device_id(payload, &device_id))
            .await?;
        self.get_wallets().await?;
        Ok(imported)
    }

    pub async fn delete_wallet(&self, wallet_id: u64) -> Result<Value> {
        let deleted = self.api.delete_wallet(wallet_id).await?;
        self.get_wallets().await?;

        if self.current_selection().await?.map(|c| c.wallet_id) == Some(wallet_id) {
            self.store.remove(&[keys::CURRENT_WALLET]).await?;
        }
        Ok(deleted)
    }

    pub async fn current_selection(&self) -> Result<Option<CurrentWallet>> {
        storage::read(self.store.as_ref(), keys::CURRENT_WALLET).await
    }

    /// Selected wallet, resolved against the cached list.
    pub async fn current_wallet(&self) -> Result<Option<Wallet>> {
        let Some(current) = self.current_selection().await? else {
            return Ok(None);
        };
        let wallets = self.cached_wallets().await?;
        Ok(wallets.into_iter().find(|w| w.id == current.wallet_id))
    }

    pub async fn set_current_wallet(&self, wallet_id: u64) -> Result<()> {
        log::info!("Current wallet saved: {}", wallet_id);
        storage::write(self.store.as_ref(), keys::CURRENT_WALLET, &CurrentWallet { wallet_id }).await
    }

    /// Raw `get_all_balances` body for the `GET_BALANCE` message (`state` envelope).
    pub async fn get_balance(&self, wallet_id: u64) -> Result<Value> {
        self.api.get_all_balances(wallet_id, Convention::State).await
    }

    pub async fn balance(&self, wallet_id: u64) -> Result<WalletBalance> {
        let body = self.api.get_all_balances(wallet_id, Convention::Status).await?;
        Ok(WalletBalance::from_response(&body, wallet_id, self.clock.now_ms()))
    }

    /// Ask the server to re-sync on-chain balances, then read them back.
    pub async fn refresh_balance(&self, wallet_id: u64) -> Result<WalletBalance> {
        self.api.refresh_balances(wallet_id).await?;
        self.balance(wallet_id).await
    }

    pub async fn transfer(&self, payload: Value) -> Result<Value> {
        let wallet_id = wallet_id_of(&payload)?;
        self.api.transfer(wallet_id, &payload).await
    }

    pub async fn swap_quote(&self, wallet_id: u64, request: &Value) -> Result<SwapQuote> {
        self.api.swap_quote(wallet_id, request).await
    }

    pub async fn swap(&self, payload: Value) -> Result<Value> {
        let wallet_id = wallet_id_of(&payload)?;
        self.api.execute_swap(wallet_id, &payload).await
    }

    pub async fn get_settings(&self) -> Result<Settings> {
        settings::load(self.store.as_ref()).await
    }

    /// Overwrite the blob; fields missing from `payload` take their defaults.
    pub async fn update_settings(&self, payload: Value) -> Result<Settings> {
        let settings: Settings = serde_json::from_value(payload)?;
        settings::save(self.store.as_ref(), &settings).await?;
        Ok(settings)
    }

    pub async fn supported_chains(&self) -> Result<Vec<Chain>> {
        self.api.supported_chains().await
    }

    pub async fn refresh_token_prices(&self, wallet_id: u64) -> Result<Value> {
        self.api.get_token_prices(wallet_id).await
    }
}
