// Per-window presentation mode (popup / side panel / closed) and the
// commands that switch between them.
//
// The registry lives in the background worker's memory only. The worker can
// be unloaded between messages, after which every window reads as `Popup`
// again.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PagesConfig;
use crate::error::{Result, WalletError};

pub type WindowId = u32;

/// Panel page shown after a non-cooperative close attempt.
const BLANK_PAGE: &str = "about:blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    Popup,
    SidePanel,
    Closed,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowMode::Popup => "popup",
            WindowMode::SidePanel => "sidepanel",
            WindowMode::Closed => "closed",
        })
    }
}

/// Advisory request for a docked panel to hide itself.
///
/// There is no platform primitive to force a panel closed from the worker;
/// the panel UI unmounts on receipt. If it does not cooperate it stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSignal {
    pub window_id: WindowId,
    pub mode: WindowMode,
}

/// Side panel options accepted by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelOptions {
    pub enabled: Option<bool>,
    pub path: Option<String>,
}

/// Browser window/tab/panel commands used by the coordinator.
#[async_trait(?Send)]
pub trait WindowPlatform {
    /// The focused window, if the platform can resolve one.
    async fn current_window(&self) -> Result<Option<WindowId>>;

    /// Whether the side panel API exists in this browser.
    fn has_side_panel(&self) -> bool;

    async fn open_side_panel(&self, window_id: WindowId) -> Result<()>;

    async fn set_side_panel_options(&self, options: PanelOptions) -> Result<()>;

    /// Open an extension page as a detached surface (a new tab) in `window_id`.
    async fn open_surface(&self, window_id: WindowId, page: &str) -> Result<()>;

    async fn open_action_popup(&self) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct WindowModeRegistry {
    modes: Rc<RefCell<HashMap<WindowId, WindowMode>>>,
}

impl WindowModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins, no check that the window still exists.
    pub fn set_mode(&self, window_id: WindowId, mode: WindowMode) {
        self.modes.borrow_mut().insert(window_id, mode);
    }

    /// Unknown windows behave as never switched: `Popup`.
    pub fn get_mode(&self, window_id: WindowId) -> WindowMode {
        self.modes
            .borrow()
            .get(&window_id)
            .copied()
            .unwrap_or(WindowMode::Popup)
    }

    pub fn is_tracked(&self, window_id: WindowId) -> bool {
        self.modes.borrow().contains_key(&window_id)
    }
}

pub struct WindowCoordinator {
    registry: WindowModeRegistry,
    platform: Rc<dyn WindowPlatform>,
    pages: PagesConfig,
}

impl WindowCoordinator {
    pub fn new(registry: WindowModeRegistry, platform: Rc<dyn WindowPlatform>, pages: PagesConfig) -> Self {
        Self {
            registry,
            platform,
            pages,
        }
    }

    pub fn registry(&self) -> &WindowModeRegistry {
        &self.registry
    }

    async fn resolve(&self, window_id: Option<WindowId>) -> Result<WindowId> {
        if let Some(id) = window_id {
            return Ok(id);
        }
        let current = self.platform.current_window().await?;
        log::debug!("No windowId provided, using current window {:?}", current);
        current.ok_or(WalletError::NoActiveWindow)
    }

    /// Open the panel without touching the registry.
    pub async fn toggle_side_panel(&self, window_id: Option<WindowId>) -> Result<()> {
        if !self.platform.has_side_panel() {
            return Err(WalletError::SidePanelUnavailable);
        }
        let target = self.resolve(window_id).await?;
        log::info!("Opening side panel for window {}", target);
        self.platform.open_side_panel(target).await
    }

    pub async fn switch_to_side_panel(&self, window_id: Option<WindowId>) -> Result<()> {
        if !self.platform.has_side_panel() {
            return Err(WalletError::SidePanelUnavailable);
        }
        let target = self.resolve(window_id).await?;
        self.registry.set_mode(target, WindowMode::SidePanel);
        self.platform.open_side_panel(target).await?;
        log::info!("Switched window {} to side panel mode", target);
        Ok(())
    }

    /// Records `Popup` and opens a detached popup surface. A docked panel
    /// cannot be closed from here, so this does not close it.
    pub async fn switch_to_popup(&self, window_id: Option<WindowId>) -> Result<()> {
        let target = self.resolve(window_id).await?;
        self.registry.set_mode(target, WindowMode::Popup);
        self.platform.open_surface(target, &self.pages.popup).await?;
        log::info!("Switched window {} to popup mode", target);
        Ok(())
    }

    pub async fn get_mode(&self, window_id: Option<WindowId>) -> Result<WindowMode> {
        let target = self.resolve(window_id).await?;
        let mode = self.registry.get_mode(target);
        log::debug!("Current window mode for {}: {}", target, mode);
        Ok(mode)
    }

    /// Records `Popup`, then best-effort disables the panel and blanks its page.
    pub async fn close_side_panel(&self, window_id: Option<WindowId>) -> Result<()> {
        let target = self.resolve(window_id).await?;
        self.registry.set_mode(target, WindowMode::Popup);

        if !self.platform.has_side_panel() {
            return Ok(());
        }
        let disable = PanelOptions {
            enabled: Some(false),
            path: None,
        };
        if let Err(e) = self.platform.set_side_panel_options(disable).await {
            log::warn!("Could not disable side panel: {}", e);
        }
        let blank = PanelOptions {
            enabled: None,
            path: Some(BLANK_PAGE.to_string()),
        };
        if let Err(e) = self.platform.set_side_panel_options(blank).await {
            log::warn!("Could not set blank side panel path: {}", e);
        }
        log::info!("Side panel close attempt completed for window {}", target);
        Ok(())
    }

    /// Reopen as a panel, degrading to a popup surface when the panel API is
    /// missing or refuses.
    pub async fn reopen_wallet(&self, window_id: Option<WindowId>) -> Result<()> {
        let target = self.resolve(window_id).await?;

        if self.platform.has_side_panel() {
            match self.reopen_panel(target).await {
                Ok(()) => {
                    self.registry.set_mode(target, WindowMode::SidePanel);
                    log::info!("Reopened side panel for window {}", target);
                    return Ok(());
                }
                Err(e) => log::warn!("Could not reopen side panel, opening popup instead: {}", e),
            }
        }

        self.platform.open_surface(target, &self.pages.popup).await?;
        self.registry.set_mode(target, WindowMode::Popup);
        Ok(())
    }

    async fn reopen_panel(&self, target: WindowId) -> Result<()> {
        self.platform
            .set_side_panel_options(PanelOptions {
                enabled: Some(true),
                path: Some(self.pages.sidepanel.clone()),
            })
            .await?;
        self.platform.open_side_panel(target).await
    }

    /// Mark the window closed and hand back the advisory signal for the panel.
    pub async fn close_phantom_style(&self, window_id: Option<WindowId>) -> Result<CloseSignal> {
        let target = self.resolve(window_id).await?;
        self.registry.set_mode(target, WindowMode::Closed);
        log::info!("Side panel close signal sent for window {}", target);
        Ok(CloseSignal {
            window_id: target,
            mode: WindowMode::Closed,
        })
    }

    /// Toolbar icon: always a popup. Falls back to a popup tab, and logs if
    /// even that fails.
    pub async fn handle_icon_click(&self, window_id: WindowId) {
        let opened = match self.platform.open_action_popup().await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::info!("Action popup unavailable, using tab fallback: {}", e);
                self.platform.open_surface(window_id, &self.pages.popup).await
            }
        };

        match opened {
            Ok(()) => self.registry.set_mode(window_id, WindowMode::Popup),
            Err(e) => {
                log::error!("Failed to handle icon click: {}", e);
                if let Err(e) = self.platform.open_surface(window_id, &self.pages.popup).await {
                    log::error!("All methods to open the wallet failed: {}", e);
                }
            }
        }
    }
}
