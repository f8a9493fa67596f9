// Inter-context message protocol handled by the background worker.
//
// Two families share one channel. Window messages drive the
// `WindowCoordinator`; wallet messages are passthrough to `WalletService`.
// A type neither family recognises gets no reply so another listener can
// answer it.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WalletError};
use crate::wallet::{wallet_id_of, WalletService};
use crate::window_mode::{WindowCoordinator, WindowId};

/// `{type, data?, requestId?, windowId?}` as sent over the runtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

impl ChromeMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            request_id: None,
            window_id: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_window(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }

    fn data_or_null(&self) -> Value {
        self.data.clone().unwrap_or(Value::Null)
    }
}

/// Who sent the message. Only the sender tab's window is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageSender {
    pub tab_window_id: Option<WindowId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    ToggleSidePanel,
    SwitchToSidePanel,
    SwitchToPopup,
    GetWindowMode,
    CloseSidePanel,
    ReopenWallet,
    CloseSidePanelPhantomStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletCommand {
    GetWallets,
    GetCurrentWallet,
    SetCurrentWallet,
    CreateWallet,
    ImportWallet,
    DeleteWallet,
    GetBalance,
    Transfer,
    Swap,
    GetSettings,
    UpdateSettings,
    GetSupportedChains,
    RefreshTokenPrices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Window(WindowCommand),
    Wallet(WalletCommand),
}

impl MessageKind {
    pub fn parse(kind: &str) -> Option<Self> {
        use WalletCommand as W;
        use WindowCommand as Win;

        let parsed = match kind {
            "TOGGLE_SIDEPANEL" => MessageKind::Window(Win::ToggleSidePanel),
            "SWITCH_TO_SIDEPANEL" => MessageKind::Window(Win::SwitchToSidePanel),
            "SWITCH_TO_POPUP" => MessageKind::Window(Win::SwitchToPopup),
            "GET_WINDOW_MODE" => MessageKind::Window(Win::GetWindowMode),
            "CLOSE_SIDEPANEL" => MessageKind::Window(Win::CloseSidePanel),
            "REOPEN_WALLET" => MessageKind::Window(Win::ReopenWallet),
            "CLOSE_SIDEPANEL_PHANTOM_STYLE" => MessageKind::Window(Win::CloseSidePanelPhantomStyle),
            "GET_WALLETS" => MessageKind::Wallet(W::GetWallets),
            "GET_CURRENT_WALLET" => MessageKind::Wallet(W::GetCurrentWallet),
            "SET_CURRENT_WALLET" => MessageKind::Wallet(W::SetCurrentWallet),
            "CREATE_WALLET" => MessageKind::Wallet(W::CreateWallet),
            "IMPORT_WALLET" => MessageKind::Wallet(W::ImportWallet),
            "DELETE_WALLET" => MessageKind::Wallet(W::DeleteWallet),
            "GET_BALANCE" => MessageKind::Wallet(W::GetBalance),
            "TRANSFER" => MessageKind::Wallet(W::Transfer),
            "SWAP" => MessageKind::Wallet(W::Swap),
            "GET_SETTINGS" => MessageKind::Wallet(W::GetSettings),
            "UPDATE_SETTINGS" => MessageKind::Wallet(W::UpdateSettings),
            "GET_SUPPORTED_CHAINS" => MessageKind::Wallet(W::GetSupportedChains),
            "REFRESH_TOKEN_PRICES" => MessageKind::Wallet(W::RefreshTokenPrices),
            _ => return None,
        };
        Some(parsed)
    }
}

/// `{success, data?, error?}` sent back for every recognised message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &WalletError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, self.success) {
            (Some(error), _) => write!(f, "error: {}", error),
            (None, true) => f.write_str("success"),
            (None, false) => f.write_str("failure"),
        }
    }
}

pub struct MessageRouter {
    windows: Rc<WindowCoordinator>,
    wallets: Rc<WalletService>,
}

impl MessageRouter {
    pub fn new(windows: Rc<WindowCoordinator>, wallets: Rc<WalletService>) -> Self {
        Self { windows, wallets }
    }

    /// `None` when the message type belongs to neither family.
    pub async fn dispatch(&self, message: &ChromeMessage, sender: MessageSender) -> Option<Reply> {
        let Some(kind) = MessageKind::parse(&message.kind) else {
            log::debug!("Ignoring message type {}", message.kind);
            return None;
        };
        log::info!("Received message: {}", message.kind);

        let outcome = match kind {
            MessageKind::Window(command) => self.window(command, message, sender).await,
            MessageKind::Wallet(command) => self.wallet(command, message).await,
        };
        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("{} failed: {}", message.kind, e);
                Reply::failure(&e)
            }
        };
        Some(reply)
    }

    async fn window(&self, command: WindowCommand, message: &ChromeMessage, sender: MessageSender) -> Result<Reply> {
        let window_id = message.window_id;
        match command {
            // The toggle targets the tab that asked, not an explicit id.
            WindowCommand::ToggleSidePanel => {
                self.windows.toggle_side_panel(sender.tab_window_id).await?;
                Ok(Reply::ok())
            }
            WindowCommand::SwitchToSidePanel => {
                self.windows.switch_to_side_panel(window_id).await?;
                Ok(Reply::ok())
            }
            WindowCommand::SwitchToPopup => {
                self.windows.switch_to_popup(window_id).await?;
                Ok(Reply::ok())
            }
            WindowCommand::GetWindowMode => {
                let mode = self.windows.get_mode(window_id).await?;
                Ok(Reply::with_data(serde_json::to_value(mode)?))
            }
            WindowCommand::CloseSidePanel => {
                self.windows.close_side_panel(window_id).await?;
                Ok(Reply::ok())
            }
            WindowCommand::ReopenWallet => {
                self.windows.reopen_wallet(window_id).await?;
                Ok(Reply::ok())
            }
            WindowCommand::CloseSidePanelPhantomStyle => {
                let signal = self.windows.close_phantom_style(window_id).await?;
                Ok(Reply::with_data(serde_json::to_value(signal)?))
            }
        }
    }

    async fn wallet(&self, command: WalletCommand, message: &ChromeMessage) -> Result<Reply> {
        let data = message.data_or_null();
        let wallets = &self.wallets;
        let value = match command {
            WalletCommand::GetWallets => serde_json::to_value(wallets.get_wallets().await?)?,
            WalletCommand::GetCurrentWallet => serde_json::to_value(wallets.current_selection().await?)?,
            WalletCommand::SetCurrentWallet => {
                wallets.set_current_wallet(wallet_id_of(&data)?).await?;
                serde_json::json!({ "success": true })
            }
            WalletCommand::CreateWallet => wallets.create_wallet(data).await?,
            WalletCommand::ImportWallet => wallets.import_wallet(data).await?,
            WalletCommand::DeleteWallet => wallets.delete_wallet(wallet_id_of(&data)?).await?,
            WalletCommand::GetBalance => wallets.get_balance(wallet_id_of(&data)?).await?,
            WalletCommand::Transfer => wallets.transfer(data).await?,
            WalletCommand::Swap => wallets.swap(data).await?,
            WalletCommand::GetSettings => serde_json::to_value(wallets.get_settings().await?)?,
            WalletCommand::UpdateSettings => serde_json::to_value(wallets.update_settings(data).await?)?,
            WalletCommand::GetSupportedChains => serde_json::to_value(wallets.supported_chains().await?)?,
            WalletCommand::RefreshTokenPrices => wallets.refresh_token_prices(wallet_id_of(&data)?).await?,
        };
        Ok(Reply::with_data(value))
    }
}
