// chrome.storage.local bindings

use async_trait::async_trait;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::KeyValueStore;
use crate::error::{Result, WalletError};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_get(keys: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_set(items: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = remove)]
    fn storage_remove(keys: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = clear)]
    fn storage_clear() -> js_sys::Promise;
}

fn js_err(err: JsValue) -> WalletError {
    WalletError::Storage(format!("{:?}", err))
}

fn key_array(keys: &[&str]) -> JsValue {
    let array = js_sys::Array::new();
    for key in keys {
        array.push(&JsValue::from_str(key));
    }
    array.into()
}

pub(crate) fn to_js(value: &Value) -> Result<JsValue> {
    let text = serde_json::to_string(value)?;
    js_sys::JSON::parse(&text).map_err(js_err)
}

pub(crate) fn from_js(value: &JsValue) -> Result<Value> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let text = js_sys::JSON::stringify(value)
        .map_err(js_err)?
        .as_string()
        .ok_or_else(|| WalletError::Storage("Value is not JSON-serializable".to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

#[derive(Clone, Copy, Default)]
pub struct ChromeStorage;

impl ChromeStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl KeyValueStore for ChromeStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let result = JsFuture::from(storage_get(key_array(keys)))
            .await
            .map_err(js_err)?;
        match from_js(&result)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let obj = to_js(&Value::Object(items))?;
        JsFuture::from(storage_set(obj)).await.map_err(js_err)?;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        JsFuture::from(storage_remove(key_array(keys)))
            .await
            .map_err(js_err)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        log::info!("Clearing storage...");
        JsFuture::from(storage_clear()).await.map_err(js_err)?;
        log::info!("Storage cleared");
        Ok(())
    }
}
