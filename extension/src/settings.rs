use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{self, keys, KeyValueStore};

/// `lockTimeout` sentinel: never auto-lock.
pub const LOCK_NEVER: i64 = -1;
/// `lockTimeout` sentinel: lock on every tick.
pub const LOCK_IMMEDIATELY: i64 = 0;

const MS_PER_MINUTE: i64 = 60_000;

/// User settings blob persisted under `settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub language: String,
    pub currency: String,
    pub theme: String,
    pub notifications: bool,
    pub auto_lock: bool,
    /// Minutes, or one of the sentinels. Older builds wrote milliseconds.
    pub lock_timeout: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            currency: "USD".to_string(),
            theme: "light".to_string(),
            notifications: true,
            auto_lock: true,
            lock_timeout: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLockSettings {
    pub enabled: bool,
    pub timeout_minutes: i64,
}

impl AutoLockSettings {
    pub fn new(enabled: bool, timeout_minutes: i64) -> Self {
        Self {
            enabled,
            timeout_minutes,
        }
    }

    /// Idle duration after which a tick locks, `None` when auto-lock can never fire.
    pub fn idle_limit_ms(&self) -> Option<u64> {
        if !self.enabled || self.timeout_minutes < 0 {
            return None;
        }
        Some(self.timeout_minutes as u64 * MS_PER_MINUTE as u64)
    }
}

impl Settings {
    pub fn auto_lock(&self) -> AutoLockSettings {
        let timeout_minutes = if self.lock_timeout >= MS_PER_MINUTE {
            self.lock_timeout / MS_PER_MINUTE
        } else {
            self.lock_timeout
        };
        AutoLockSettings::new(self.auto_lock, timeout_minutes)
    }
}

/// Stored settings, or the defaults when none were ever written.
pub async fn load(store: &dyn KeyValueStore) -> Result<Settings> {
    Ok(storage::read(store, keys::SETTINGS).await?.unwrap_or_default())
}

pub async fn save(store: &dyn KeyValueStore, settings: &Settings) -> Result<()> {
    storage::write(store, keys::SETTINGS, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn legacy_millisecond_timeout_is_normalised() {
        let settings: Settings = serde_json::from_value(json!({
            "language": "en",
            "currency": "USD",
            "theme": "light",
            "notifications": true,
            "autoLock": true,
            "lockTimeout": 300000
        }))
        .unwrap();
        assert_eq!(settings.auto_lock(), AutoLockSettings::new(true, 5));
    }

    #[test]
    fn sentinels_survive_projection() {
        let mut settings = Settings {
            lock_timeout: LOCK_NEVER,
            ..Settings::default()
        };
        assert_eq!(settings.auto_lock().timeout_minutes, LOCK_NEVER);
        assert_eq!(settings.auto_lock().idle_limit_ms(), None);

        settings.lock_timeout = LOCK_IMMEDIATELY;
        assert_eq!(settings.auto_lock().idle_limit_ms(), Some(0));
    }

    #[test]
    fn disabled_auto_lock_has_no_limit() {
        assert_eq!(AutoLockSettings::new(false, 5).idle_limit_ms(), None);
        assert_eq!(AutoLockSettings::new(true, 5).idle_limit_ms(), Some(300_000));
    }

    #[tokio::test]
    async fn partial_blob_fills_defaults() {
        let store = MemoryStore::new();
        storage::write(&store, keys::SETTINGS, &json!({ "autoLock": false }))
            .await
            .unwrap();

        let settings = load(&store).await.unwrap();
        assert!(!settings.auto_lock);
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.lock_timeout, 5);
    }
}
