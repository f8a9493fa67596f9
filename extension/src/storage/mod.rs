// Local key-value store shared by every execution context.
//
// Single-key get/set primitives only: composite updates are not atomic, so
// every reader treats a missing key as "absent/default" rather than corruption.

#[cfg(target_arch = "wasm32")]
pub(crate) mod chrome;

#[cfg(target_arch = "wasm32")]
pub use chrome::ChromeStorage;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Flat keys persisted by the extension, each holding a JSON value.
pub mod keys {
    pub const DEVICE_ID: &str = "device_id";
    pub const WALLETS: &str = "wallets";
    pub const CURRENT_WALLET: &str = "current_wallet";
    pub const SETTINGS: &str = "settings";
    pub const BALANCES: &str = "balances";
    pub const TRANSACTIONS: &str = "transactions";
    pub const PAYMENT_PASSWORD_SET: &str = "payment_password_set";
    pub const LAST_PASSWORD_TIME: &str = "last_password_time";
}

#[async_trait(?Send)]
pub trait KeyValueStore {
    /// Returns only the keys that are present.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, items: Map<String, Value>) -> Result<()>;

    async fn remove(&self, keys: &[&str]) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Read one key and decode it. Missing keys and `null` come back as `None`.
pub async fn read<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let mut found = store.get(&[key]).await?;
    match found.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub async fn write<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let mut items = Map::new();
    items.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(items).await
}

/// In-process store, used by tests and as the development fallback when the
/// extension storage API is not present.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let entries = self.entries.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        log::debug!("Storage set: {:?}", items.keys().collect::<Vec<_>>());
        self.entries.borrow_mut().extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_returns_only_present_keys() {
        let store = MemoryStore::new();
        write(&store, keys::DEVICE_ID, "device-1").await.unwrap();

        let found = store.get(&[keys::DEVICE_ID, keys::WALLETS]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[keys::DEVICE_ID], json!("device-1"));
    }

    #[tokio::test]
    async fn null_and_missing_read_as_absent() {
        let store = MemoryStore::new();
        let mut items = Map::new();
        items.insert(keys::CURRENT_WALLET.to_string(), Value::Null);
        store.set(items).await.unwrap();

        let current: Option<Value> = read(&store, keys::CURRENT_WALLET).await.unwrap();
        assert!(current.is_none());
        let missing: Option<String> = read(&store, keys::DEVICE_ID).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let store = MemoryStore::new();
        write(&store, keys::WALLETS, &Vec::<u32>::new()).await.unwrap();
        write(&store, keys::LAST_PASSWORD_TIME, &1_000u64).await.unwrap();

        store.remove(&[keys::LAST_PASSWORD_TIME]).await.unwrap();
        assert!(!store.contains(keys::LAST_PASSWORD_TIME));
        assert_eq!(store.len(), 1);

        store.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
