use dioxus::prelude::*;

use super::context::WalletContext;
use crate::auth::AuthStore;
use crate::icons;

const INPUT_CLASS: &str = "w-full px-4 py-3 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-transparent";

#[component]
fn ErrorBanner(message: String) -> Element {
    rsx! {
        div { class: "mt-4 bg-red-50 border border-red-200 rounded-lg p-3 flex items-start",
            icons::AlertCircle { class: Some("w-4 h-4 text-red-600 mr-2 mt-0.5".to_string()) }
            p { class: "text-sm text-red-800", "{message}" }
        }
    }
}

#[component]
pub fn SetupPassword() -> Element {
    let ctx = use_context::<WalletContext>();
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let mismatch = !confirm().is_empty() && password() != confirm();
    let can_submit = password().len() >= 6 && password() == confirm() && !busy();

    let submit = move |_| {
        let ctx = ctx.clone();
        spawn(async move {
            busy.set(true);
            error.set(None);
            let result = async {
                ctx.auth.set_payment_password(&password()).await?;
                let wallets = ctx.wallets.get_wallets().await?;
                Ok::<_, crate::error::WalletError>(AuthStore::landing(wallets.len()))
            }
            .await;
            match result {
                Ok(route) => ctx.go(route),
                Err(e) => error.set(Some(e.to_string())),
            }
            busy.set(false);
        });
    };

    rsx! {
        div { class: "max-w-md mx-auto mt-10 p-8 bg-white rounded-lg shadow-lg",
            h2 { class: "text-2xl font-bold text-gray-900 mb-2", "Set Payment Password" }
            p { class: "text-gray-600 mb-6",
                "This password protects transfers and wallet imports on this device."
            }

            div { class: "space-y-4",
                input {
                    class: INPUT_CLASS,
                    r#type: "password",
                    placeholder: "Password (at least 6 characters)",
                    value: "{password}",
                    oninput: move |e| password.set(e.value())
                }
                input {
                    class: INPUT_CLASS,
                    r#type: "password",
                    placeholder: "Confirm password",
                    value: "{confirm}",
                    oninput: move |e| confirm.set(e.value())
                }
                if mismatch {
                    p { class: "text-xs text-red-600", "Passwords do not match" }
                }
                button {
                    class: "w-full bg-blue-600 text-white py-3 px-4 rounded-lg hover:bg-blue-700 transition disabled:opacity-50 disabled:cursor-not-allowed",
                    disabled: !can_submit,
                    onclick: submit,
                    if busy() { "Saving..." } else { "Set Password" }
                }
            }

            if let Some(message) = error() {
                ErrorBanner { message }
            }
        }
    }
}

#[component]
pub fn VerifyPassword() -> Element {
    let ctx = use_context::<WalletContext>();
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let submit = move |_| {
        let ctx = ctx.clone();
        spawn(async move {
            busy.set(true);
            error.set(None);
            if let Err(e) = ctx.auth.unlock(&password(), &ctx.wallets, ctx.navigator.as_ref()).await {
                error.set(Some(e.to_string()));
            }
            password.set(String::new());
            busy.set(false);
        });
    };

    rsx! {
        div { class: "max-w-md mx-auto mt-20 p-8 bg-white rounded-lg shadow-lg",
            div { class: "text-center mb-8",
                icons::Wallet { class: Some("w-12 h-12 text-blue-600 mx-auto mb-4".to_string()) }
                h1 { class: "text-3xl font-bold text-gray-900 mb-2", "Welcome Back" }
                p { class: "text-gray-600", "Enter your payment password to unlock" }
            }

            div { class: "space-y-4",
                input {
                    class: INPUT_CLASS,
                    r#type: "password",
                    placeholder: "Payment password",
                    value: "{password}",
                    oninput: move |e| password.set(e.value())
                }
                button {
                    class: "w-full bg-blue-600 text-white py-3 px-4 rounded-lg hover:bg-blue-700 transition disabled:opacity-50 disabled:cursor-not-allowed",
                    disabled: password().is_empty() || busy(),
                    onclick: submit,
                    if busy() { "Unlocking..." } else { "Unlock" }
                }
            }

            if let Some(message) = error() {
                ErrorBanner { message }
            }
        }
    }
}
