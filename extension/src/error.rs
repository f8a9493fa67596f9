// Error taxonomy shared by every execution context.
// Everything is recovered at the message-router boundary and turned into a
// `{success: false, error}` reply, so Display strings are user-facing.

use thiserror::Error;

pub type Result<T, E = WalletError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Unable to determine target window")]
    NoActiveWindow,

    #[error("Device ID not found")]
    DeviceIdMissing,

    #[error("Side Panel API not available")]
    SidePanelUnavailable,

    #[error("Invalid import data")]
    InvalidImportData,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Password is required")]
    PasswordRequired,

    #[error("Invalid password. Please try again.")]
    InvalidPassword,

    #[error("Unknown message type: {0}")]
    UnknownMessage(String),

    #[error("Request timeout")]
    RequestTimeout,

    #[error("{0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Remote API failure after classification.
///
/// 400 responses are scraped for a field-level message and mapped onto a small
/// set of categories; the other statuses collapse to fixed messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Incorrect password. Please check your payment password.")]
    IncorrectPassword,

    #[error("Invalid private key. Please check your private key format.")]
    InvalidPrivateKey,

    #[error("Invalid recovery phrase. Please check your 12-word phrase.")]
    InvalidMnemonic,

    #[error("Invalid input. Please check your private key and password.")]
    InvalidInput,

    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication failed. Please try again.")]
    Unauthorized,

    #[error("Server error. Please try again later.")]
    ServerError,

    #[error("{0}")]
    Remote(String),
}

impl From<anyhow::Error> for WalletError {
    fn from(err: anyhow::Error) -> Self {
        WalletError::Config(format!("{:#}", err))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_render_user_messages() {
        let err: WalletError = ApiError::IncorrectPassword.into();
        assert_eq!(
            err.to_string(),
            "Incorrect password. Please check your payment password."
        );
        assert_eq!(
            ApiError::BadRequest("Wallet name taken".into()).to_string(),
            "Wallet name taken"
        );
    }

    #[test]
    fn config_errors_keep_context_chain() {
        let err = anyhow::anyhow!("missing field").context("Failed to parse config");
        let wallet_err = WalletError::from(err);
        assert_eq!(
            wallet_err.to_string(),
            "Configuration error: Failed to parse config: missing field"
        );
    }
}
