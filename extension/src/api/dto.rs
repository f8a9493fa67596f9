// Records mirrored from the remote API. Unknown fields are kept in `extra`
// so passthrough replies stay verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: u64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kadena_chain_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletToken {
    pub token_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub balance: String,
    pub balance_usd: String,
    pub price_usd: String,
    pub price_change_24h: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub wallet_id: u64,
    pub chain: String,
    pub total_value_usd: String,
    pub total_value_change_24h: String,
    pub total_change_percentage: String,
    pub tokens: Vec<WalletToken>,
    pub timestamp: u64,
}

/// Numbers and strings both appear in balance payloads.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl WalletToken {
    fn from_response(token: &Value) -> Self {
        Self {
            token_address: text(token.get("token_address")).unwrap_or_default(),
            symbol: text(token.get("symbol")).unwrap_or_default(),
            name: text(token.get("name")).unwrap_or_default(),
            decimals: token
                .get("decimals")
                .and_then(Value::as_u64)
                .filter(|d| *d > 0)
                .unwrap_or(18) as u32,
            balance: text(token.get("balance_formatted"))
                .or_else(|| text(token.get("balance")))
                .unwrap_or_else(|| "0".to_string()),
            balance_usd: text(token.get("value_usd")).unwrap_or_else(|| "0".to_string()),
            price_usd: text(token.get("current_price_usd")).unwrap_or_else(|| "0".to_string()),
            price_change_24h: text(token.get("price_change_percentage_24h"))
                .unwrap_or_else(|| "0".to_string()),
            logo_url: text(token.get("logo")),
            is_visible: token.get("is_visible").and_then(Value::as_bool) != Some(false),
        }
    }
}

impl WalletBalance {
    /// Build from a `get_all_balances` body (`status` convention, flat fields).
    pub fn from_response(body: &Value, wallet_id: u64, timestamp: u64) -> Self {
        let tokens = body
            .get("tokens")
            .and_then(Value::as_array)
            .map(|tokens| tokens.iter().map(WalletToken::from_response).collect())
            .unwrap_or_default();
        Self {
            wallet_id: body
                .get("wallet_id")
                .and_then(Value::as_u64)
                .unwrap_or(wallet_id),
            chain: text(body.get("chain")).unwrap_or_default(),
            total_value_usd: text(body.get("total_value_usd")).unwrap_or_else(|| "0".to_string()),
            total_value_change_24h: text(body.get("total_value_change_24h"))
                .unwrap_or_else(|| "0".to_string()),
            total_change_percentage: text(body.get("total_change_percentage"))
                .unwrap_or_else(|| "0".to_string()),
            tokens,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub quote_id: String,
    pub from_token: String,
    pub to_token: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default)]
    pub price_impact: String,
    #[serde(default)]
    pub slippage: String,
    #[serde(default)]
    pub route_plan: Vec<Value>,
    #[serde(default)]
    pub other_amount_threshold: String,
    #[serde(default)]
    pub swap_mode: String,
    #[serde(default)]
    pub fees: Map<String, Value>,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainType {
    #[serde(rename = "EVM")]
    Evm,
    #[serde(rename = "NON_EVM")]
    NonEvm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub chain: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "type")]
    pub chain_type: ChainType,
    #[serde(default)]
    pub is_testnet: bool,
}

/// Which import endpoint a payload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    PrivateKey,
    Mnemonic,
    WatchOnly,
}

impl ImportKind {
    /// Chosen by the first secret present: private key, then mnemonic, then address.
    pub fn detect(payload: &Value) -> Option<Self> {
        let present = |field: &str| {
            payload
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        };
        if present("private_key") {
            Some(ImportKind::PrivateKey)
        } else if present("mnemonic") {
            Some(ImportKind::Mnemonic)
        } else if present("address") {
            Some(ImportKind::WatchOnly)
        } else {
            None
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            ImportKind::PrivateKey => "import_private_key",
            ImportKind::Mnemonic => "import_by_mnemonic",
            ImportKind::WatchOnly => "import_watch_only",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wallet_keeps_unknown_fields() {
        let raw = json!({
            "id": 3,
            "address": "0xabc",
            "name": "Main",
            "chain": "ETH",
            "is_active": true,
            "created_at": "2024-01-01",
            "updated_at": "2024-01-02",
            "is_watch_only": false
        });
        let wallet: Wallet = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(wallet.extra.get("is_watch_only"), Some(&json!(false)));
        assert_eq!(serde_json::to_value(&wallet).unwrap(), raw);
    }

    #[test]
    fn balance_maps_api_fields() {
        let body = json!({
            "status": "success",
            "chain": "SOL",
            "total_value_usd": "12.5",
            "tokens": [{
                "symbol": "SOL",
                "balance_formatted": "0.1",
                "value_usd": 12.5,
                "current_price_usd": 125,
                "logo": "https://img/sol.png",
                "decimals": 9
            }, {
                "symbol": "BONK",
                "balance": 1000,
                "is_visible": false
            }]
        });
        let balance = WalletBalance::from_response(&body, 8, 1);
        assert_eq!(balance.wallet_id, 8);
        assert_eq!(balance.total_value_change_24h, "0");
        assert_eq!(balance.tokens[0].balance, "0.1");
        assert_eq!(balance.tokens[0].balance_usd, "12.5");
        assert_eq!(balance.tokens[0].decimals, 9);
        assert_eq!(balance.tokens[0].logo_url.as_deref(), Some("https://img/sol.png"));
        assert!(balance.tokens[0].is_visible);
        assert_eq!(balance.tokens[1].balance, "1000");
        assert_eq!(balance.tokens[1].decimals, 18);
        assert!(!balance.tokens[1].is_visible);
    }

    #[test]
    fn import_kind_precedence() {
        let both = json!({ "private_key": "abc", "mnemonic": "one two" });
        assert_eq!(ImportKind::detect(&both), Some(ImportKind::PrivateKey));
        assert_eq!(
            ImportKind::detect(&json!({ "address": "0x1" })).map(|k| k.endpoint()),
            Some("import_watch_only")
        );
        assert_eq!(ImportKind::detect(&json!({ "chain": "ETH" })), None);
    }

    #[test]
    fn chain_type_wire_names() {
        let chain: Chain = serde_json::from_value(json!({
            "chain": "KDA",
            "name": "Kadena",
            "type": "NON_EVM",
            "is_testnet": false
        }))
        .unwrap();
        assert_eq!(chain.chain_type, ChainType::NonEvm);
    }
}
