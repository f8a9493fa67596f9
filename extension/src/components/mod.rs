mod context;
mod send;
mod unlock;
mod wallet_choice;
mod wallet_view;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use context::WalletContext;
use send::SendForm;
use unlock::{SetupPassword, VerifyPassword};
use wallet_choice::WalletChoice;
use wallet_view::WalletView;

use crate::config::ExtensionConfig;
use crate::navigation::Route;
use crate::window_mode::WindowMode;

#[component]
fn App() -> Element {
    let mode = use_hook(detect_mode);
    let route = use_signal(|| Route::Other("/loading".to_string()));

    let ctx = use_context_provider(|| {
        let config = ExtensionConfig::embedded().unwrap_or_else(|e| {
            log::error!("{:#}", e);
            ExtensionConfig::default()
        });
        WalletContext::new(route, mode, config)
    });

    // Startup routing, idle auto-lock and activity tracking run once per page.
    use_hook(|| {
        if let Err(e) = ctx.watch_activity() {
            log::error!("Failed to watch user activity: {:?}", e);
        }

        let startup = ctx.clone();
        spawn(async move {
            let route = startup
                .auth
                .start(&startup.wallets, startup.navigator.as_ref())
                .await;
            log::info!("Initial route: {}", route);
        });

        let session = ctx.session.clone();
        let interval = ctx.config.session.tick_interval_ms;
        spawn(async move {
            session.run(|| TimeoutFuture::new(interval)).await;
        });
    });

    rsx! {
        div { class: "min-h-screen bg-gray-50 p-4",
            match route() {
                Route::Home => rsx! { WalletView {} },
                Route::SetupPassword => rsx! { SetupPassword {} },
                Route::VerifyPassword => rsx! { VerifyPassword {} },
                Route::WalletChoice => rsx! { WalletChoice {} },
                Route::Send => rsx! { SendForm {} },
                Route::Other(_) => rsx! {
                    div { class: "flex items-center justify-center mt-20 text-gray-400", "Loading..." }
                },
            }
        }
    }
}

/// Side panel when served from the side panel page, popup otherwise.
fn detect_mode() -> WindowMode {
    let path = web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default();
    if path.contains("sidepanel") {
        WindowMode::SidePanel
    } else {
        WindowMode::Popup
    }
}

pub fn launch() {
    log::info!("Wallet UI starting...");
    dioxus::launch(App);
}
