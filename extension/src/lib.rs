//! Browser-extension wallet core: window-mode coordination, the background
//! message router, payment-password sessions and the in-page provider bridge.
//!
//! Everything outside `platform` and the UI is target-independent and runs
//! under native tests against in-memory fakes.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod navigation;
pub mod provider;
pub mod router;
pub mod session;
pub mod settings;
pub mod storage;
pub mod wallet;
pub mod window_mode;
pub mod worker;

#[cfg(target_arch = "wasm32")]
pub mod platform;

#[cfg(all(target_arch = "wasm32", feature = "ui"))]
mod components;
#[cfg(all(target_arch = "wasm32", feature = "ui"))]
pub mod icons;

pub use error::{Result, WalletError};

/// Entry point for the popup and side panel pages.
#[cfg(all(target_arch = "wasm32", feature = "ui"))]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn launch_ui() {
    wasm_logger::init(wasm_logger::Config::default());
    components::launch();
}
