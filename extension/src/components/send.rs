use dioxus::prelude::*;
use serde_json::json;

use super::context::WalletContext;
use crate::icons;
use crate::navigation::Route;
use crate::router::ChromeMessage;

const INPUT_CLASS: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-transparent";

#[component]
pub fn SendForm() -> Element {
    let ctx = use_context::<WalletContext>();
    let mut to_address = use_signal(String::new);
    let mut amount = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut sending = use_signal(|| false);
    let mut sent = use_signal(|| None::<String>);
    let mut error = use_signal(|| None::<String>);

    let back = ctx.clone();
    let submit = move |_| {
        let ctx = ctx.clone();
        spawn(async move {
            sending.set(true);
            error.set(None);
            let wallet_id = match ctx.wallets.current_wallet().await {
                Ok(Some(wallet)) => wallet.id,
                Ok(None) => {
                    error.set(Some("No wallet selected".to_string()));
                    sending.set(false);
                    return;
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                    sending.set(false);
                    return;
                }
            };
            let data = json!({
                "walletId": wallet_id,
                "to_address": to_address(),
                "amount": amount(),
                "payment_password": password(),
            });
            match ctx.send(ChromeMessage::new("TRANSFER").with_data(data)).await {
                Ok(result) => {
                    let hash = result
                        .get("tx_hash")
                        .and_then(|h| h.as_str())
                        .unwrap_or_default()
                        .to_string();
                    sent.set(Some(hash));
                }
                Err(e) => error.set(Some(e)),
            }
            password.set(String::new());
            sending.set(false);
        });
    };

    rsx! {
        div { class: "max-w-md mx-auto mt-10 p-6 bg-white rounded-lg shadow-lg",
            h2 { class: "text-2xl font-bold text-gray-900 mb-6", "Send" }

            if let Some(hash) = sent() {
                div { class: "text-center py-6",
                    icons::CheckCircle { class: Some("w-12 h-12 text-green-600 mx-auto mb-4".to_string()) }
                    p { class: "text-gray-900 font-medium mb-2", "Transfer submitted" }
                    p { class: "text-xs font-mono text-gray-500 break-all", "{hash}" }
                }
            } else {
                div { class: "space-y-4",
                    div {
                        label { class: "block text-sm font-medium text-gray-700 mb-2", "To Address" }
                        input {
                            class: INPUT_CLASS,
                            r#type: "text",
                            placeholder: "0x...",
                            value: "{to_address}",
                            oninput: move |e| to_address.set(e.value())
                        }
                    }
                    div {
                        label { class: "block text-sm font-medium text-gray-700 mb-2", "Amount" }
                        input {
                            class: INPUT_CLASS,
                            r#type: "text",
                            placeholder: "0.0",
                            value: "{amount}",
                            oninput: move |e| amount.set(e.value())
                        }
                    }
                    div {
                        label { class: "block text-sm font-medium text-gray-700 mb-2", "Payment Password" }
                        input {
                            class: INPUT_CLASS,
                            r#type: "password",
                            value: "{password}",
                            oninput: move |e| password.set(e.value())
                        }
                    }
                    button {
                        class: "w-full bg-blue-600 text-white py-3 px-4 rounded-lg hover:bg-blue-700 transition disabled:opacity-50",
                        disabled: sending() || to_address().is_empty() || amount().is_empty() || password().is_empty(),
                        onclick: submit,
                        if sending() { "Sending..." } else { "Send" }
                    }
                }
            }

            if let Some(message) = error() {
                div { class: "mt-4 bg-red-50 border border-red-200 rounded-lg p-3 flex items-start",
                    icons::AlertCircle { class: Some("w-4 h-4 text-red-600 mr-2 mt-0.5".to_string()) }
                    p { class: "text-sm text-red-800", "{message}" }
                }
            }

            button {
                class: "w-full mt-4 text-gray-600 py-2 hover:text-gray-900",
                onclick: move |_| back.go(Route::Home),
                "Back"
            }
        }
    }
}
