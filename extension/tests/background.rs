mod common;

use std::rc::Rc;

use serde_json::{json, Value};

use common::{wallet_list, FakeApi, FakeWindows, WindowCall, BASE_URL};
use wallet_extension::clock::ManualClock;
use wallet_extension::config::ExtensionConfig;
use wallet_extension::router::{ChromeMessage, MessageSender, Reply};
use wallet_extension::settings::Settings;
use wallet_extension::storage::{self, keys, KeyValueStore, MemoryStore};
use wallet_extension::worker::{BackgroundWorker, InstallReason, REFRESH_ALARM};

struct Harness {
    worker: BackgroundWorker,
    store: MemoryStore,
    api: Rc<FakeApi>,
    windows: Rc<FakeWindows>,
}

fn harness() -> Harness {
    let config = ExtensionConfig::from_toml(&format!("[api]\nbase_url = \"{}\"\n", BASE_URL)).unwrap();
    let store = MemoryStore::new();
    let api = FakeApi::new();
    let windows = FakeWindows::focused(9);
    let worker = BackgroundWorker::new(
        &config,
        Rc::new(store.clone()),
        windows.clone(),
        api.clone(),
        Rc::new(ManualClock::new(1_000)),
    );
    Harness {
        worker,
        store,
        api,
        windows,
    }
}

async fn installed() -> Harness {
    let h = harness();
    h.worker.on_installed(InstallReason::Install).await;
    h
}

async fn send(h: &Harness, message: ChromeMessage) -> Reply {
    h.worker
        .handle_message(&message, MessageSender::default())
        .await
        .expect("message should be answered")
}

#[tokio::test]
async fn install_seeds_device_wallets_and_settings() {
    let h = installed().await;

    let device_id: Option<String> = storage::read(&h.store, keys::DEVICE_ID).await.unwrap();
    assert_eq!(device_id.map(|id| id.len()), Some(36));
    let wallets: Option<Vec<Value>> = storage::read(&h.store, keys::WALLETS).await.unwrap();
    assert_eq!(wallets, Some(Vec::new()));
    let settings: Option<Settings> = storage::read(&h.store, keys::SETTINGS).await.unwrap();
    assert_eq!(settings, Some(Settings::default()));
}

#[tokio::test]
async fn update_does_not_reseed() {
    let h = harness();
    h.worker.on_installed(InstallReason::Update).await;
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn unknown_message_gets_no_reply() {
    let h = installed().await;
    let reply = h
        .worker
        .handle_message(&ChromeMessage::new("PROVIDER_REQUEST"), MessageSender::default())
        .await;
    assert!(reply.is_none());
    assert!(h.api.requests().is_empty());
}

#[tokio::test]
async fn failures_become_error_replies() {
    let h = harness();
    let reply = send(&h, ChromeMessage::new("GET_WALLETS")).await;
    assert_eq!(
        serde_json::to_value(reply).unwrap(),
        json!({ "success": false, "error": "Device ID not found" })
    );
}

#[tokio::test]
async fn wallet_list_is_fetched_and_cached() {
    let h = installed().await;
    let device_id: String = storage::read(&h.store, keys::DEVICE_ID).await.unwrap().unwrap();
    h.api
        .route("GET", &format!("/wallets/?device_id={}", device_id), 200, wallet_list());

    let reply = send(&h, ChromeMessage::new("GET_WALLETS")).await;
    assert!(reply.success);
    let data = reply.data.unwrap();
    assert_eq!(data.as_array().map(Vec::len), Some(2));
    assert_eq!(data[1]["chain"], "SOL");

    let cached = h.store.get(&[keys::WALLETS]).await.unwrap();
    assert_eq!(cached[keys::WALLETS].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn current_wallet_round_trips_through_messages() {
    let h = installed().await;

    let reply = send(&h, ChromeMessage::new("GET_CURRENT_WALLET")).await;
    assert_eq!(reply.data, Some(Value::Null));

    let set = ChromeMessage::new("SET_CURRENT_WALLET").with_data(json!({ "walletId": 2 }));
    assert_eq!(send(&h, set).await.data, Some(json!({ "success": true })));

    let reply = send(&h, ChromeMessage::new("GET_CURRENT_WALLET")).await;
    assert_eq!(reply.data, Some(json!({ "walletId": 2 })));
}

#[tokio::test]
async fn remote_failure_message_is_surfaced() {
    let h = installed().await;
    h.api.route(
        "POST",
        "/wallets/3/transfer/",
        400,
        json!({ "state": "error", "message": "Insufficient balance" }),
    );

    let transfer = ChromeMessage::new("TRANSFER").with_data(json!({
        "walletId": 3,
        "to_address": "0xdef",
        "amount": "1.5"
    }));
    let reply = send(&h, transfer).await;
    assert!(!reply.success);
    assert_eq!(reply.error.as_deref(), Some("Insufficient balance"));
    assert_eq!(h.api.last_body().unwrap()["amount"], "1.5");
}

#[tokio::test]
async fn import_picks_endpoint_from_secret() {
    let h = installed().await;
    h.api.route(
        "POST",
        "/wallets/import_by_mnemonic/",
        200,
        json!({ "state": "success", "data": { "id": 5 } }),
    );
    let device_id: String = storage::read(&h.store, keys::DEVICE_ID).await.unwrap().unwrap();
    h.api
        .route("GET", &format!("/wallets/?device_id={}", device_id), 200, wallet_list());

    let import = ChromeMessage::new("IMPORT_WALLET").with_data(json!({
        "chain": "ETH",
        "mnemonic": "abandon abandon abandon"
    }));
    let reply = send(&h, import).await;
    assert_eq!(reply.data, Some(json!({ "id": 5 })));

    let requests = h.api.requests();
    assert_eq!(requests[0], "POST /wallets/import_by_mnemonic/");
    assert!(requests[1].starts_with("GET /wallets/?device_id="));
}

#[tokio::test]
async fn window_mode_follows_switches() {
    let h = harness();
    let switch = ChromeMessage::new("SWITCH_TO_SIDEPANEL").with_window(4);
    assert!(send(&h, switch).await.success);

    let mode = send(&h, ChromeMessage::new("GET_WINDOW_MODE").with_window(4)).await;
    assert_eq!(mode.data, Some(json!("sidepanel")));

    // Without an explicit id the focused window is used.
    let mode = send(&h, ChromeMessage::new("GET_WINDOW_MODE")).await;
    assert_eq!(mode.data, Some(json!("popup")));

    let close = send(&h, ChromeMessage::new("CLOSE_SIDEPANEL_PHANTOM_STYLE").with_window(4)).await;
    assert_eq!(close.data, Some(json!({ "windowId": 4, "mode": "closed" })));
    assert_eq!(h.windows.calls(), vec![WindowCall::OpenPanel(4)]);
}

#[tokio::test]
async fn popup_switch_keeps_popup_mode_until_explicit_close() {
    let h = harness();
    assert!(send(&h, ChromeMessage::new("SWITCH_TO_SIDEPANEL").with_window(4)).await.success);
    assert!(send(&h, ChromeMessage::new("SWITCH_TO_POPUP").with_window(4)).await.success);

    let mode = send(&h, ChromeMessage::new("GET_WINDOW_MODE").with_window(4)).await;
    assert_eq!(mode.data, Some(json!("popup")));
    assert!(!h
        .windows
        .calls()
        .iter()
        .any(|call| matches!(call, WindowCall::Options(_))));

    let close = send(&h, ChromeMessage::new("CLOSE_SIDEPANEL_PHANTOM_STYLE").with_window(4)).await;
    assert_eq!(close.data, Some(json!({ "windowId": 4, "mode": "closed" })));
    let mode = send(&h, ChromeMessage::new("GET_WINDOW_MODE").with_window(4)).await;
    assert_eq!(mode.data, Some(json!("closed")));
}

#[tokio::test]
async fn toggle_uses_sender_window() {
    let h = harness();
    let sender = MessageSender {
        tab_window_id: Some(21),
    };
    let reply = h
        .worker
        .handle_message(&ChromeMessage::new("TOGGLE_SIDEPANEL").with_window(4), sender)
        .await
        .unwrap();
    assert!(reply.success);
    assert_eq!(h.windows.calls(), vec![WindowCall::OpenPanel(21)]);
    assert!(!h.worker.windows().registry().is_tracked(21));
}

#[tokio::test]
async fn icon_click_opens_popup() {
    let h = harness();
    h.worker.on_icon_click(Some(6)).await;
    assert_eq!(h.windows.calls(), vec![WindowCall::ActionPopup]);
    assert!(h.worker.windows().registry().is_tracked(6));
}

#[tokio::test]
async fn refresh_alarm_updates_cache_and_survives_failure() {
    let h = installed().await;

    h.worker.on_alarm("somethingElse").await;
    assert!(h.api.requests().is_empty());

    // 404: logged, cache untouched
    h.worker.on_alarm(REFRESH_ALARM).await;
    let wallets: Option<Vec<Value>> = storage::read(&h.store, keys::WALLETS).await.unwrap();
    assert_eq!(wallets, Some(Vec::new()));

    let device_id: String = storage::read(&h.store, keys::DEVICE_ID).await.unwrap().unwrap();
    h.api
        .route("GET", &format!("/wallets/?device_id={}", device_id), 200, wallet_list());
    h.worker.on_alarm(REFRESH_ALARM).await;
    let wallets: Option<Vec<Value>> = storage::read(&h.store, keys::WALLETS).await.unwrap();
    assert_eq!(wallets.map(|w| w.len()), Some(2));
}

#[tokio::test]
async fn balance_message_passes_state_body_through() {
    let h = installed().await;
    h.api.route(
        "GET",
        "/wallets/1/get_all_balances/",
        200,
        json!({ "state": "success", "total_value_usd": "42.00", "tokens": [] }),
    );

    let reply = send(&h, ChromeMessage::new("GET_BALANCE").with_data(json!({ "walletId": 1 }))).await;
    assert!(reply.success);
    assert_eq!(reply.data.unwrap()["total_value_usd"], "42.00");
}
