use dioxus::prelude::*;
use serde_json::{json, Value};

use super::context::WalletContext;
use crate::api::Chain;
use crate::icons;
use crate::navigation::Route;
use crate::router::ChromeMessage;

const INPUT_CLASS: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-transparent";

#[derive(Clone, Copy, PartialEq)]
enum Choice {
    Create,
    Import,
}

#[derive(Clone, Copy, PartialEq)]
enum Secret {
    PrivateKey,
    Mnemonic,
    WatchOnly,
}

impl Secret {
    fn field(&self) -> &'static str {
        match self {
            Secret::PrivateKey => "private_key",
            Secret::Mnemonic => "mnemonic",
            Secret::WatchOnly => "address",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Secret::PrivateKey => "Private Key",
            Secret::Mnemonic => "Recovery Phrase",
            Secret::WatchOnly => "Address",
        }
    }
}

#[component]
pub fn WalletChoice() -> Element {
    let ctx = use_context::<WalletContext>();
    let mut choice = use_signal(|| Choice::Create);
    let mut chains = use_signal(Vec::<Chain>::new);
    let chain = use_signal(|| String::from("ETH"));

    let loader = ctx.clone();
    use_effect(move || {
        let ctx = loader.clone();
        spawn(async move {
            match ctx.wallets.supported_chains().await {
                Ok(list) => chains.set(list),
                Err(e) => log::error!("Failed to load supported chains: {}", e),
            }
        });
    });

    let tab = |active: bool| {
        if active {
            "flex-1 py-2 text-sm font-medium border-b-2 border-blue-600 text-blue-600"
        } else {
            "flex-1 py-2 text-sm font-medium border-b-2 border-transparent text-gray-500"
        }
    };

    rsx! {
        div { class: "max-w-md mx-auto mt-10 p-6 bg-white rounded-lg shadow-lg",
            h2 { class: "text-2xl font-bold text-gray-900 mb-6", "Add a Wallet" }

            div { class: "flex mb-6",
                button { class: tab(choice() == Choice::Create), onclick: move |_| choice.set(Choice::Create), "Create" }
                button { class: tab(choice() == Choice::Import), onclick: move |_| choice.set(Choice::Import), "Import" }
            }

            ChainPicker { chains, chain }

            match choice() {
                Choice::Create => rsx! { CreateForm { chain } },
                Choice::Import => rsx! { ImportForm { chain } },
            }
        }
    }
}

#[component]
fn ChainPicker(chains: Signal<Vec<Chain>>, mut chain: Signal<String>) -> Element {
    rsx! {
        div { class: "mb-4",
            label { class: "block text-sm font-medium text-gray-700 mb-2", "Network" }
            select {
                class: INPUT_CLASS,
                value: "{chain}",
                onchange: move |e| chain.set(e.value()),
                if chains.read().is_empty() {
                    option { value: "ETH", "Ethereum" }
                }
                for c in chains.read().iter() {
                    option { key: "{c.chain}", value: "{c.chain}",
                        if c.is_testnet { "{c.name} (testnet)" } else { "{c.name}" }
                    }
                }
            }
        }
    }
}

async fn submit(ctx: &WalletContext, message: ChromeMessage, mut error: Signal<Option<String>>) {
    error.set(None);
    match ctx.send(message).await {
        Ok(_) => ctx.go(Route::Home),
        Err(e) => error.set(Some(e)),
    }
}

#[component]
fn CreateForm(chain: Signal<String>) -> Element {
    let ctx = use_context::<WalletContext>();
    let mut name = use_signal(String::new);
    let error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    rsx! {
        div { class: "space-y-4",
            input {
                class: INPUT_CLASS,
                r#type: "text",
                placeholder: "Wallet name (optional)",
                value: "{name}",
                oninput: move |e| name.set(e.value())
            }
            button {
                class: "w-full bg-blue-600 text-white py-3 px-4 rounded-lg hover:bg-blue-700 transition disabled:opacity-50",
                disabled: busy(),
                onclick: move |_| {
                    let ctx = ctx.clone();
                    spawn(async move {
                        busy.set(true);
                        let mut data = json!({ "chain": chain() });
                        if !name().trim().is_empty() {
                            data["name"] = Value::String(name().trim().to_string());
                        }
                        submit(&ctx, ChromeMessage::new("CREATE_WALLET").with_data(data), error).await;
                        busy.set(false);
                    });
                },
                "Create Wallet"
            }
            FormError { error }
        }
    }
}

#[component]
fn ImportForm(chain: Signal<String>) -> Element {
    let ctx = use_context::<WalletContext>();
    let mut secret = use_signal(|| Secret::PrivateKey);
    let mut value = use_signal(String::new);
    let mut password = use_signal(String::new);
    let error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    rsx! {
        div { class: "space-y-4",
            div { class: "grid grid-cols-3 gap-2",
                for kind in [Secret::PrivateKey, Secret::Mnemonic, Secret::WatchOnly] {
                    button {
                        class: if secret() == kind { "py-2 text-xs rounded bg-blue-600 text-white" } else { "py-2 text-xs rounded bg-gray-100 text-gray-700" },
                        onclick: move |_| secret.set(kind),
                        "{kind.label()}"
                    }
                }
            }
            textarea {
                class: INPUT_CLASS,
                rows: "3",
                placeholder: "{secret().label()}",
                value: "{value}",
                oninput: move |e| value.set(e.value())
            }
            if secret() != Secret::WatchOnly {
                input {
                    class: INPUT_CLASS,
                    r#type: "password",
                    placeholder: "Payment password",
                    value: "{password}",
                    oninput: move |e| password.set(e.value())
                }
            }
            button {
                class: "w-full bg-green-600 text-white py-3 px-4 rounded-lg hover:bg-green-700 transition disabled:opacity-50",
                disabled: busy() || value().trim().is_empty(),
                onclick: move |_| {
                    let ctx = ctx.clone();
                    spawn(async move {
                        busy.set(true);
                        let mut data = json!({
                            "chain": chain(),
                            "kadena_chain_id": "0",
                        });
                        data[secret().field()] = Value::String(value().trim().to_string());
                        if secret() != Secret::WatchOnly {
                            data["payment_password"] = Value::String(password());
                        }
                        submit(&ctx, ChromeMessage::new("IMPORT_WALLET").with_data(data), error).await;
                        busy.set(false);
                    });
                },
                "Import Wallet"
            }
            FormError { error }
        }
    }
}

#[component]
fn FormError(error: Signal<Option<String>>) -> Element {
    rsx! {
        if let Some(message) = error() {
            div { class: "bg-red-50 border border-red-200 rounded-lg p-3 flex items-start",
                icons::AlertCircle { class: Some("w-4 h-4 text-red-600 mr-2 mt-0.5".to_string()) }
                p { class: "text-sm text-red-800", "{message}" }
            }
        }
    }
}
