use dioxus::prelude::*;
use serde_json::json;

use super::context::WalletContext;
use crate::api::{Wallet, WalletBalance};
use crate::icons;
use crate::navigation::Route;
use crate::router::ChromeMessage;
use crate::session::format_remaining;
use crate::window_mode::WindowMode;

fn short(address: &str) -> String {
    if address.len() <= 12 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[component]
pub fn WalletView() -> Element {
    let ctx = use_context::<WalletContext>();
    let mut wallets = use_signal(Vec::<Wallet>::new);
    let mut selected = use_signal(|| None::<u64>);
    let mut balance = use_signal(|| None::<WalletBalance>);
    let mut remaining = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);

    let loader = ctx.clone();
    use_effect(move || {
        let ctx = loader.clone();
        spawn(async move {
            match ctx.wallets.get_wallets().await {
                Ok(list) => {
                    let current = ctx.wallets.current_selection().await.ok().flatten().map(|c| c.wallet_id);
                    let id = current
                        .filter(|id| list.iter().any(|w| w.id == *id))
                        .or_else(|| list.first().map(|w| w.id));
                    wallets.set(list);
                    selected.set(id);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            remaining.set(format_remaining(ctx.session.remaining_ms().await));
        });
    });

    let fetcher = ctx.clone();
    use_effect(move || {
        let Some(id) = selected() else {
            return;
        };
        let ctx = fetcher.clone();
        spawn(async move {
            match ctx.wallets.balance(id).await {
                Ok(b) => balance.set(Some(b)),
                Err(e) => log::error!("Failed to get balance: {}", e),
            }
        });
    });

    let current = selected()
        .and_then(|id| wallets.read().iter().find(|w| w.id == id).cloned())
        .map(|w| (w.chain, short(&w.address)));
    let total = balance
        .read()
        .as_ref()
        .map(|b| b.total_value_usd.clone())
        .unwrap_or_else(|| "0".to_string());

    let switch_ctx = ctx.clone();
    let lock_ctx = ctx.clone();
    let send_ctx = ctx.clone();
    let choice_ctx = ctx.clone();
    let close_ctx = ctx.clone();
    let hide_ctx = ctx.clone();
    let is_panel = ctx.mode == WindowMode::SidePanel;

    rsx! {
        div { class: "max-w-md mx-auto mt-4 p-6 bg-white rounded-lg shadow-lg",
            // Header
            div { class: "flex items-center justify-between mb-6",
                select {
                    class: "text-lg font-bold text-gray-900 bg-transparent",
                    onchange: move |e| {
                        let Ok(id) = e.value().parse::<u64>() else { return };
                        selected.set(Some(id));
                        let ctx = switch_ctx.clone();
                        spawn(async move {
                            if let Err(e) = ctx.wallets.set_current_wallet(id).await {
                                log::error!("Failed to save current wallet: {}", e);
                            }
                        });
                    },
                    for w in wallets.read().iter() {
                        option { key: "{w.id}", value: "{w.id}", selected: Some(w.id) == selected(), "{w.name}" }
                    }
                }
                div { class: "flex items-center space-x-3",
                    button {
                        class: "text-gray-400 hover:text-gray-600",
                        title: if is_panel { "Open as popup" } else { "Open in side panel" },
                        onclick: move |_| {
                            let ctx = close_ctx.clone();
                            spawn(async move {
                                let kind = if is_panel { "SWITCH_TO_POPUP" } else { "SWITCH_TO_SIDEPANEL" };
                                if let Err(e) = ctx.send(ChromeMessage::new(kind)).await {
                                    log::error!("{} failed: {}", kind, e);
                                } else if is_panel {
                                    // The popup now owns this window; only our page goes away.
                                    close_page();
                                }
                            });
                        },
                        icons::PanelRight { class: Some("w-5 h-5".to_string()) }
                    }
                    button {
                        class: "text-gray-400 hover:text-gray-600",
                        title: "Lock",
                        onclick: move |_| {
                            let ctx = lock_ctx.clone();
                            spawn(async move {
                                ctx.session.lock().await;
                            });
                        },
                        icons::Lock { class: Some("w-5 h-5".to_string()) }
                    }
                    if is_panel {
                        button {
                            class: "text-gray-400 hover:text-gray-600",
                            title: "Close",
                            onclick: move |_| {
                                let ctx = hide_ctx.clone();
                                spawn(async move { close_surface(&ctx).await });
                            },
                            icons::X { class: Some("w-5 h-5".to_string()) }
                        }
                    }
                }
            }

            // Balance card
            div { class: "bg-gradient-to-br from-blue-500 to-blue-700 rounded-lg p-6 text-white mb-6",
                p { class: "text-sm opacity-80 mb-2", "Total Balance" }
                h2 { class: "text-4xl font-bold mb-4", "${total}" }
                if let Some((chain, address)) = current {
                    div { class: "flex items-center space-x-2 text-sm",
                        span { class: "opacity-80", "{chain}" }
                        span { class: "font-mono", "{address}" }
                        icons::Copy { class: Some("w-3 h-3 opacity-80".to_string()) }
                    }
                }
            }

            // Actions
            div { class: "grid grid-cols-2 gap-4 mb-6",
                button {
                    class: "bg-blue-600 text-white py-3 px-4 rounded-lg hover:bg-blue-700 transition",
                    onclick: move |_| send_ctx.go(Route::Send),
                    "Send"
                }
                button {
                    class: "bg-gray-100 text-gray-700 py-3 px-4 rounded-lg hover:bg-gray-200 transition",
                    onclick: move |_| choice_ctx.go(Route::WalletChoice),
                    "Add Wallet"
                }
            }

            // Tokens
            div { class: "space-y-2",
                h3 { class: "text-sm font-medium text-gray-500 uppercase", "Tokens" }
                match balance.read().as_ref() {
                    Some(b) if !b.tokens.is_empty() => rsx! {
                        for token in b.tokens.iter().filter(|t| t.is_visible) {
                            div { key: "{token.symbol}", class: "flex items-center justify-between py-2",
                                span { class: "font-medium text-gray-900", "{token.symbol}" }
                                div { class: "text-right",
                                    p { class: "text-gray-900", "{token.balance}" }
                                    p { class: "text-xs text-gray-500", "${token.balance_usd}" }
                                }
                            }
                        }
                    },
                    _ => rsx! {
                        div { class: "text-center py-8 text-gray-400", p { "No tokens yet" } }
                    },
                }
            }

            if let Some(message) = error() {
                div { class: "mt-4 flex items-center text-sm text-red-700",
                    icons::AlertCircle { class: Some("w-4 h-4 mr-2".to_string()) }
                    "{message}"
                }
            }

            // Status
            div { class: "mt-6 pt-6 border-t border-gray-200",
                div { class: "flex items-center justify-between text-sm",
                    span { class: "text-gray-500", "Session" }
                    span { class: "text-green-600 flex items-center",
                        span { class: "w-2 h-2 bg-green-600 rounded-full mr-2" }
                        "{remaining}"
                    }
                }
            }
        }
    }
}

fn close_page() {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.close() {
        log::error!("Failed to close wallet page: {:?}", e);
    }
}

/// A side panel cannot be closed by the worker; ask, then close our own page.
async fn close_surface(ctx: &WalletContext) {
    let message = ChromeMessage::new("CLOSE_SIDEPANEL_PHANTOM_STYLE");
    match ctx.send(message).await {
        Ok(signal) if signal.get("mode") == Some(&json!("closed")) => close_page(),
        Ok(_) => {}
        Err(e) => log::error!("Failed to close side panel: {}", e),
    }
}
