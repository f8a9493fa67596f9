// Auth state for a UI context: device identity, payment-password status and
// the verified session, plus the guard that maps them onto a screen.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::{ApiClient, SetPasswordOutcome};
use crate::error::{Result, WalletError};
use crate::navigation::{Navigator, Route};
use crate::session::SessionTimer;
use crate::storage::{self, keys, KeyValueStore};
use crate::wallet::WalletService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Uninitialized,
    NeedsPasswordSetup,
    NeedsVerification,
    Unlocked,
}

impl AuthState {
    /// State after initialisation, from the server-side password flag and
    /// the local session validity.
    pub fn derive(has_payment_password: bool, session_valid: bool) -> Self {
        match (has_payment_password, session_valid) {
            (false, _) => AuthState::NeedsPasswordSetup,
            (true, false) => AuthState::NeedsVerification,
            (true, true) => AuthState::Unlocked,
        }
    }
}

/// Redirect for `target` given the auth state, or `None` to stay.
///
/// `Uninitialized` never redirects; callers initialise first. While a
/// verification is in flight the lock screen is not re-issued.
pub fn route_guard(state: AuthState, target: &Route, wallet_count: usize, verifying: bool) -> Option<Route> {
    let redirect = match state {
        AuthState::Uninitialized => return None,
        AuthState::NeedsPasswordSetup => Route::SetupPassword,
        AuthState::NeedsVerification if verifying => return None,
        AuthState::NeedsVerification => Route::VerifyPassword,
        AuthState::Unlocked if *target == Route::Home && wallet_count == 0 => Route::WalletChoice,
        AuthState::Unlocked => return None,
    };
    (redirect != *target).then_some(redirect)
}

/// Single in-flight password verification per context.
#[derive(Clone, Default)]
pub struct VerificationGate {
    verifying: Rc<Cell<bool>>,
}

/// Holds the gate closed until dropped.
pub struct VerificationGuard {
    verifying: Rc<Cell<bool>>,
}

impl Drop for VerificationGuard {
    fn drop(&mut self) {
        self.verifying.set(false);
    }
}

impl VerificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying.get()
    }

    /// `None` when another verification already holds the gate.
    pub fn try_begin(&self) -> Option<VerificationGuard> {
        if self.verifying.replace(true) {
            return None;
        }
        Some(VerificationGuard {
            verifying: self.verifying.clone(),
        })
    }
}

pub struct AuthStore {
    store: Rc<dyn KeyValueStore>,
    api: Rc<ApiClient>,
    session: Rc<SessionTimer>,
    state: Rc<Cell<AuthState>>,
    device_id: RefCell<Option<String>>,
    has_payment_password: Cell<bool>,
    gate: VerificationGate,
}

impl AuthStore {
    pub fn new(store: Rc<dyn KeyValueStore>, api: Rc<ApiClient>, session: Rc<SessionTimer>) -> Self {
        let state = Rc::new(Cell::new(AuthState::Uninitialized));
        let on_lock = state.clone();
        session.on_lock(move || {
            if on_lock.get() == AuthState::Unlocked {
                log::info!("Session locked, verification required");
                on_lock.set(AuthState::NeedsVerification);
            }
        });
        Self {
            store,
            api,
            session,
            state,
            device_id: RefCell::new(None),
            has_payment_password: Cell::new(false),
            gate: VerificationGate::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    pub fn device_id(&self) -> Option<String> {
        self.device_id.borrow().clone()
    }

    pub fn has_payment_password(&self) -> bool {
        self.has_payment_password.get()
    }

    pub fn session(&self) -> &SessionTimer {
        &self.session
    }

    pub fn gate(&self) -> &VerificationGate {
        &self.gate
    }

    fn require_device_id(&self) -> Result<String> {
        self.device_id().ok_or(WalletError::DeviceIdMissing)
    }

    /// Load (or create) the device id, then settle the state from the
    /// password status and session validity.
    pub async fn initialize(&self) -> Result<AuthState> {
        let stored: Option<String> = storage::read(self.store.as_ref(), keys::DEVICE_ID).await?;
        let (device_id, fresh) = match stored.filter(|id| !id.is_empty()) {
            Some(id) => (id, false),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                storage::write(self.store.as_ref(), keys::DEVICE_ID, &id).await?;
                log::info!("Generated device id {}", id);
                (id, true)
            }
        };
        *self.device_id.borrow_mut() = Some(device_id);

        let has_password = self.check_password_status().await?;
        // A freshly generated device has never verified a password.
        let session_valid = !fresh && has_password && self.session.check_session_valid().await;

        let state = AuthState::derive(has_password, session_valid);
        log::info!("Auth initialized: {:?}", state);
        self.state.set(state);
        Ok(state)
    }

    /// Server-side password flag, cached locally. Falls back to the cached
    /// flag when the server cannot be reached or answers without success.
    pub async fn check_password_status(&self) -> Result<bool> {
        let device_id = self.require_device_id()?;
        let has_password = match self.api.password_status(&device_id).await {
            Ok(Some(flag)) => {
                storage::write(self.store.as_ref(), keys::PAYMENT_PASSWORD_SET, &flag).await?;
                flag
            }
            Ok(None) => self.cached_password_flag().await?,
            Err(e) => {
                log::error!("Failed to check password status: {}", e);
                self.cached_password_flag().await?
            }
        };
        self.has_payment_password.set(has_password);
        Ok(has_password)
    }

    async fn cached_password_flag(&self) -> Result<bool> {
        Ok(storage::read(self.store.as_ref(), keys::PAYMENT_PASSWORD_SET)
            .await?
            .unwrap_or(false))
    }

    async fn mark_password_set(&self) -> Result<()> {
        self.has_payment_password.set(true);
        storage::write(self.store.as_ref(), keys::PAYMENT_PASSWORD_SET, &true).await
    }

    /// Set the payment password. An "already set" answer is accepted if the
    /// same password then verifies.
    pub async fn set_payment_password(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(WalletError::PasswordRequired);
        }
        let device_id = self.require_device_id()?;
        match self.api.set_password(&device_id, password).await? {
            SetPasswordOutcome::Set => {
                self.mark_password_set().await?;
                self.session.set_password_session().await?;
                self.state.set(AuthState::Unlocked);
                Ok(())
            }
            SetPasswordOutcome::AlreadySet => {
                log::info!("Password already set, verifying instead");
                self.mark_password_set().await?;
                self.verify_password(password).await
            }
        }
    }

    /// Check the password with the server and start a verified session.
    pub async fn verify_password(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(WalletError::PasswordRequired);
        }
        let device_id = self.require_device_id()?;
        match self.api.verify_password(&device_id, password).await {
            Ok(()) => {}
            Err(WalletError::Api(e)) => {
                log::warn!("Password verification rejected: {}", e);
                return Err(WalletError::InvalidPassword);
            }
            Err(e) => return Err(e),
        }
        self.session.set_password_session().await?;
        self.state.set(AuthState::Unlocked);
        Ok(())
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        let device_id = self.require_device_id()?;
        self.api
            .change_password(&device_id, old_password, new_password)
            .await
    }

    /// Verify, then send the UI to `Home` or `WalletChoice` depending on
    /// whether any wallet exists. `Ok(None)` when a verification was already
    /// running in this context.
    pub async fn unlock(
        &self,
        password: &str,
        wallets: &WalletService,
        navigator: &dyn Navigator,
    ) -> Result<Option<Route>> {
        if password.is_empty() {
            return Err(WalletError::PasswordRequired);
        }
        let Some(_guard) = self.gate.try_begin() else {
            log::info!("Password verification already in progress");
            return Ok(None);
        };

        self.verify_password(password).await?;
        let route = Self::landing(wallets.get_wallets().await?.len());
        navigator.navigate(route.clone());
        Ok(Some(route))
    }

    /// Screen shown after unlocking.
    pub fn landing(wallet_count: usize) -> Route {
        if wallet_count > 0 {
            Route::Home
        } else {
            Route::WalletChoice
        }
    }

    /// Evaluate the guard for `target`, initialising first if needed. The
    /// wallet list is only fetched when an unlocked context heads `Home`.
    pub async fn guard(&self, target: &Route, wallets: &WalletService) -> Result<Option<Route>> {
        if self.state() == AuthState::Uninitialized {
            self.initialize().await?;
        }
        let state = self.state();
        let wallet_count = if state == AuthState::Unlocked && *target == Route::Home {
            wallets.get_wallets().await?.len()
        } else {
            0
        };
        Ok(route_guard(state, target, wallet_count, self.gate.is_verifying()))
    }

    /// Startup routing for a freshly opened popup or side panel. Any failure
    /// lands on the lock screen.
    pub async fn start(&self, wallets: &WalletService, navigator: &dyn Navigator) -> Route {
        let route = match self.guard(&Route::Home, wallets).await {
            Ok(redirect) => redirect.unwrap_or(Route::Home),
            Err(e) => {
                log::error!("App initialization failed: {}", e);
                Route::VerifyPassword
            }
        };
        navigator.navigate(route.clone());
        route
    }

    /// Drop the verified session and cached wallet data; the device id stays.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear_password_session().await;
        self.store
            .remove(&[
                keys::WALLETS,
                keys::CURRENT_WALLET,
                keys::BALANCES,
                keys::TRANSACTIONS,
            ])
            .await?;
        self.state.set(if self.has_payment_password() {
            AuthState::NeedsVerification
        } else {
            AuthState::NeedsPasswordSetup
        });
        log::info!("Logged out");
        Ok(())
    }

    /// Wipe everything, including the device id.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear().await?;
        *self.device_id.borrow_mut() = None;
        self.has_payment_password.set(false);
        self.state.set(AuthState::Uninitialized);
        log::warn!("Extension state reset");
        Ok(())
    }
}
