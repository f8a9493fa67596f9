// Background service worker: owns the window-mode registry and the message
// router for as long as the browser keeps the worker alive.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::api::{ApiClient, HttpTransport};
use crate::clock::Clock;
use crate::config::ExtensionConfig;
use crate::error::Result;
use crate::router::{ChromeMessage, MessageRouter, MessageSender, Reply};
use crate::settings::Settings;
use crate::storage::{keys, KeyValueStore};
use crate::wallet::WalletService;
use crate::window_mode::{WindowCoordinator, WindowId, WindowModeRegistry, WindowPlatform};

/// Alarm that re-fetches the wallet list.
pub const REFRESH_ALARM: &str = "refreshData";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
    BrowserUpdate,
    SharedModuleUpdate,
}

impl InstallReason {
    pub fn parse(reason: &str) -> Option<Self> {
        match reason {
            "install" => Some(InstallReason::Install),
            "update" => Some(InstallReason::Update),
            "chrome_update" => Some(InstallReason::BrowserUpdate),
            "shared_module_update" => Some(InstallReason::SharedModuleUpdate),
            _ => None,
        }
    }
}

pub struct BackgroundWorker {
    store: Rc<dyn KeyValueStore>,
    windows: Rc<WindowCoordinator>,
    wallets: Rc<WalletService>,
    router: MessageRouter,
    refresh_period_minutes: u32,
}

impl BackgroundWorker {
    pub fn new(
        config: &ExtensionConfig,
        store: Rc<dyn KeyValueStore>,
        platform: Rc<dyn WindowPlatform>,
        transport: Rc<dyn HttpTransport>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let api = Rc::new(ApiClient::new(config.api.base_url.clone(), transport));
        let wallets = Rc::new(WalletService::new(api, store.clone(), clock));
        let windows = Rc::new(WindowCoordinator::new(
            WindowModeRegistry::new(),
            platform,
            config.pages.clone(),
        ));
        let router = MessageRouter::new(windows.clone(), wallets.clone());
        Self {
            store,
            windows,
            wallets,
            router,
            refresh_period_minutes: config.background.refresh_period_minutes,
        }
    }

    pub fn refresh_period_minutes(&self) -> u32 {
        self.refresh_period_minutes
    }

    pub fn windows(&self) -> &WindowCoordinator {
        &self.windows
    }

    /// Seed local state on first install only.
    pub async fn on_installed(&self, reason: InstallReason) {
        log::info!("Extension installed: {:?}", reason);
        if reason != InstallReason::Install {
            return;
        }
        if let Err(e) = self.seed().await {
            log::error!("Failed to initialize extension: {}", e);
        }
    }

    async fn seed(&self) -> Result<()> {
        let device_id = uuid::Uuid::new_v4().to_string();
        let mut items = Map::new();
        items.insert(keys::DEVICE_ID.to_string(), Value::String(device_id.clone()));
        items.insert(keys::WALLETS.to_string(), Value::Array(Vec::new()));
        items.insert(keys::SETTINGS.to_string(), serde_json::to_value(Settings::default())?);
        self.store.set(items).await?;
        log::info!("Extension initialized with device ID: {}", device_id);
        Ok(())
    }

    /// Toolbar icon: always opens the popup surface.
    pub async fn on_icon_click(&self, window_id: Option<WindowId>) {
        log::info!("Extension icon clicked, opening popup");
        match window_id {
            Some(id) => self.windows.handle_icon_click(id).await,
            None => log::error!("Failed to handle icon click: no window ID available"),
        }
    }

    pub async fn on_alarm(&self, name: &str) {
        if name == REFRESH_ALARM {
            self.refresh().await;
        }
    }

    /// Periodic wallet-list refresh; failures are only logged.
    pub async fn refresh(&self) {
        match self.wallets.get_wallets().await {
            Ok(wallets) => log::info!("Data refreshed ({} wallets)", wallets.len()),
            Err(e) => log::error!("Failed to refresh data: {}", e),
        }
    }

    pub async fn handle_message(&self, message: &ChromeMessage, sender: MessageSender) -> Option<Reply> {
        let reply = self.router.dispatch(message, sender).await;
        if let Some(reply) = &reply {
            log::debug!("{} -> {}", message.kind, reply);
        }
        reply
    }
}
