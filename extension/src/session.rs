// Payment-password session and idle auto-lock.
//
// Two independent expiries coexist:
// - hard expiry: `now - last_password_time < password_session_timeout_ms`
// - idle auto-lock: evaluated by `tick()` from the last observed user input
//   and the user's auto-lock settings.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::clock::{Clock, Millis};
use crate::error::Result;
use crate::navigation::{Navigator, Route};
use crate::settings;
use crate::storage::{self, keys, KeyValueStore};

/// DOM events that count as user activity.
pub const ACTIVITY_EVENTS: [&str; 5] = ["mousedown", "mousemove", "keypress", "scroll", "touchstart"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Auto-lock disabled or set to never.
    Disabled,
    /// Idle time still below the limit.
    Active,
    /// Session cleared. `redirected` is false when the lock screen was already showing.
    Locked { redirected: bool },
    /// Settings could not be read; treated as not locked.
    ReadFailed,
    /// No payment password exists yet, so there is nothing to lock.
    NoPassword,
}

impl LockOutcome {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockOutcome::Locked { .. })
    }
}

/// Snapshot of the session timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub last_password_verified_at: Option<Millis>,
    pub last_activity_at: Millis,
}

type LockListener = Rc<dyn Fn()>;

pub struct SessionTimer {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    navigator: Rc<dyn Navigator>,
    password_session_timeout_ms: u64,
    last_activity_at: Cell<Millis>,
    lock_listeners: RefCell<Vec<LockListener>>,
}

impl SessionTimer {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        navigator: Rc<dyn Navigator>,
        password_session_timeout_ms: u64,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            store,
            clock,
            navigator,
            password_session_timeout_ms,
            last_activity_at: Cell::new(now),
            lock_listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn password_session_timeout_ms(&self) -> u64 {
        self.password_session_timeout_ms
    }

    /// Called for every qualifying input event.
    pub fn record_activity(&self) {
        self.last_activity_at.set(self.clock.now_ms());
    }

    pub fn last_activity_at(&self) -> Millis {
        self.last_activity_at.get()
    }

    pub async fn state(&self) -> Result<SessionState> {
        Ok(SessionState {
            last_password_verified_at: storage::read(self.store.as_ref(), keys::LAST_PASSWORD_TIME)
                .await?,
            last_activity_at: self.last_activity_at.get(),
        })
    }

    /// Register a callback fired after every lock.
    pub fn on_lock(&self, listener: impl Fn() + 'static) {
        self.lock_listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Evaluate auto-lock once.
    pub async fn tick(&self) -> LockOutcome {
        let auto_lock = match settings::load(self.store.as_ref()).await {
            Ok(settings) => settings.auto_lock(),
            Err(e) => {
                log::error!("Auto-lock check skipped, failed to read settings: {}", e);
                return LockOutcome::ReadFailed;
            }
        };

        let Some(limit_ms) = auto_lock.idle_limit_ms() else {
            return LockOutcome::Disabled;
        };

        let idle = self.clock.now_ms().saturating_sub(self.last_activity_at.get());
        if limit_ms > 0 && idle < limit_ms {
            return LockOutcome::Active;
        }

        log::info!(
            "Auto-lock: idle {}ms reached limit of {} minute(s)",
            idle,
            auto_lock.timeout_minutes
        );
        self.lock().await
    }

    /// Clear the verified session and show the lock screen unless it is
    /// already showing. A device without a payment password stays where it is.
    pub async fn lock(&self) -> LockOutcome {
        match storage::read::<bool>(self.store.as_ref(), keys::PAYMENT_PASSWORD_SET).await {
            Ok(Some(true)) => {}
            Ok(_) => return LockOutcome::NoPassword,
            Err(e) => {
                log::error!("Lock skipped, failed to read password flag: {}", e);
                return LockOutcome::ReadFailed;
            }
        }
        self.clear_password_session().await;

        let redirected = if self.navigator.current_route() == Route::VerifyPassword {
            false
        } else {
            self.navigator.navigate(Route::VerifyPassword);
            true
        };

        let listeners: Vec<LockListener> = self.lock_listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
        LockOutcome::Locked { redirected }
    }

    /// Hard-expiry check against the last successful verification.
    pub async fn check_session_valid(&self) -> bool {
        match storage::read::<Millis>(self.store.as_ref(), keys::LAST_PASSWORD_TIME).await {
            Ok(last) => self.is_valid_at(last, self.clock.now_ms()),
            Err(e) => {
                log::error!("Failed to check password session: {}", e);
                false
            }
        }
    }

    pub fn is_valid_at(&self, last_password_verified_at: Option<Millis>, now: Millis) -> bool {
        match last_password_verified_at {
            Some(at) => now.saturating_sub(at) < self.password_session_timeout_ms,
            None => false,
        }
    }

    /// Start (or extend) the verified session from now.
    pub async fn set_password_session(&self) -> Result<()> {
        let now = self.clock.now_ms();
        storage::write(self.store.as_ref(), keys::LAST_PASSWORD_TIME, &now).await?;
        log::info!(
            "Password session set, expires at {}",
            now + self.password_session_timeout_ms
        );
        Ok(())
    }

    pub async fn refresh_session(&self) -> Result<()> {
        self.set_password_session().await?;
        log::info!("Session refreshed");
        Ok(())
    }

    pub async fn clear_password_session(&self) {
        if let Err(e) = self.store.remove(&[keys::LAST_PASSWORD_TIME]).await {
            log::error!("Failed to clear password session: {}", e);
        }
    }

    /// Milliseconds left before the hard expiry, zero when expired or absent.
    pub async fn remaining_ms(&self) -> u64 {
        match storage::read::<Millis>(self.store.as_ref(), keys::LAST_PASSWORD_TIME).await {
            Ok(Some(at)) => {
                let elapsed = self.clock.now_ms().saturating_sub(at);
                self.password_session_timeout_ms.saturating_sub(elapsed)
            }
            Ok(None) => 0,
            Err(e) => {
                log::error!("Failed to get session remaining time: {}", e);
                0
            }
        }
    }

    /// Tick forever, sleeping with `sleep` between evaluations.
    pub async fn run<S, F>(&self, mut sleep: S)
    where
        S: FnMut() -> F,
        F: Future<Output = ()>,
    {
        log::info!("Session check started");
        loop {
            sleep().await;
            self.tick().await;
        }
    }
}

pub fn format_remaining(ms: u64) -> String {
    if ms == 0 {
        return "Expired".to_string();
    }
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::WalletError;
    use crate::navigation::MemoryNavigator;
    use crate::settings::Settings;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    const MINUTE: u64 = 60_000;
    const START: Millis = 1_700_000_000_000;

    struct Fixture {
        store: MemoryStore,
        clock: ManualClock,
        navigator: MemoryNavigator,
        timer: SessionTimer,
    }

    async fn fixture(auto_lock: bool, lock_timeout: i64) -> Fixture {
        let store = MemoryStore::new();
        let clock = ManualClock::new(START);
        let navigator = MemoryNavigator::new(Route::Home);
        let settings = Settings {
            auto_lock,
            lock_timeout,
            ..Settings::default()
        };
        settings::save(&store, &settings).await.unwrap();
        storage::write(&store, keys::PAYMENT_PASSWORD_SET, &true).await.unwrap();
        let timer = SessionTimer::new(
            Rc::new(store.clone()),
            Rc::new(clock.clone()),
            Rc::new(navigator.clone()),
            30 * MINUTE,
        );
        Fixture {
            store,
            clock,
            navigator,
            timer,
        }
    }

    #[tokio::test]
    async fn locks_at_boundary_but_not_before() {
        let f = fixture(true, 5).await;
        f.clock.advance(5 * MINUTE - 1);
        assert_eq!(f.timer.tick().await, LockOutcome::Active);

        f.clock.advance(1);
        assert!(f.timer.tick().await.is_locked());
    }

    #[tokio::test]
    async fn four_minutes_idle_stays_unlocked_six_locks() {
        let f = fixture(true, 5).await;
        f.timer.set_password_session().await.unwrap();

        f.clock.advance(4 * MINUTE);
        assert_eq!(f.timer.tick().await, LockOutcome::Active);
        assert!(f.store.contains(keys::LAST_PASSWORD_TIME));

        f.clock.advance(2 * MINUTE);
        assert_eq!(f.timer.tick().await, LockOutcome::Locked { redirected: true });
        assert!(!f.store.contains(keys::LAST_PASSWORD_TIME));
        assert_eq!(f.navigator.current_route(), Route::VerifyPassword);
    }

    #[tokio::test]
    async fn zero_timeout_locks_every_tick() {
        let f = fixture(true, 0).await;
        f.timer.record_activity();
        assert!(f.timer.tick().await.is_locked());
        f.timer.record_activity();
        assert!(f.timer.tick().await.is_locked());
    }

    #[tokio::test]
    async fn never_and_disabled_do_not_lock() {
        let f = fixture(true, -1).await;
        f.clock.advance(365 * 24 * 60 * MINUTE);
        assert_eq!(f.timer.tick().await, LockOutcome::Disabled);

        let f = fixture(false, 5).await;
        f.clock.advance(365 * 24 * 60 * MINUTE);
        assert_eq!(f.timer.tick().await, LockOutcome::Disabled);
        assert!(f.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn activity_resets_idle_time() {
        let f = fixture(true, 1).await;
        f.clock.advance(10 * MINUTE);
        f.timer.record_activity();
        assert_eq!(f.timer.tick().await, LockOutcome::Active);
    }

    #[tokio::test]
    async fn repeated_lock_does_not_thrash_navigation() {
        let f = fixture(true, 1).await;
        f.clock.advance(2 * MINUTE);
        assert_eq!(f.timer.tick().await, LockOutcome::Locked { redirected: true });
        assert_eq!(f.timer.tick().await, LockOutcome::Locked { redirected: false });
        assert_eq!(f.navigator.history(), vec![Route::VerifyPassword]);
    }

    #[tokio::test]
    async fn lock_listeners_fire() {
        let f = fixture(true, 0).await;
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        f.timer.on_lock(move || counter.set(counter.get() + 1));
        f.timer.tick().await;
        assert_eq!(fired.get(), 1);
    }

    #[tokio::test]
    async fn device_without_password_is_never_locked() {
        let f = fixture(true, 0).await;
        f.store.remove(&[keys::PAYMENT_PASSWORD_SET]).await.unwrap();
        f.navigator.navigate(Route::SetupPassword);

        assert_eq!(f.timer.tick().await, LockOutcome::NoPassword);
        assert_eq!(f.timer.lock().await, LockOutcome::NoPassword);
        assert_eq!(f.navigator.current_route(), Route::SetupPassword);
    }

    #[tokio::test]
    async fn listener_may_register_another_listener() {
        let f = fixture(true, 0).await;
        let timer = Rc::new(f.timer);
        let fired = Rc::new(Cell::new(0));

        let inner_count = fired.clone();
        let registrar = Rc::downgrade(&timer);
        timer.on_lock(move || {
            let counter = inner_count.clone();
            if let Some(timer) = registrar.upgrade() {
                timer.on_lock(move || counter.set(counter.get() + 10));
            }
        });

        assert!(timer.lock().await.is_locked());
        assert_eq!(fired.get(), 0);
        timer.lock().await;
        assert_eq!(fired.get(), 10);
    }

    struct BrokenStore;

    #[async_trait(?Send)]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _keys: &[&str]) -> Result<Map<String, Value>> {
            Err(WalletError::Storage("quota exceeded".into()))
        }
        async fn set(&self, _items: Map<String, Value>) -> Result<()> {
            Err(WalletError::Storage("quota exceeded".into()))
        }
        async fn remove(&self, _keys: &[&str]) -> Result<()> {
            Err(WalletError::Storage("quota exceeded".into()))
        }
        async fn clear(&self) -> Result<()> {
            Err(WalletError::Storage("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn storage_failure_does_not_lock() {
        let clock = ManualClock::new(START);
        let navigator = MemoryNavigator::new(Route::Home);
        let timer = SessionTimer::new(
            Rc::new(BrokenStore),
            Rc::new(clock.clone()),
            Rc::new(navigator.clone()),
            30 * MINUTE,
        );
        clock.advance(24 * 60 * MINUTE);
        assert_eq!(timer.tick().await, LockOutcome::ReadFailed);
        assert!(navigator.history().is_empty());
        assert!(!timer.check_session_valid().await);
    }

    #[tokio::test]
    async fn hard_expiry_is_independent_of_activity() {
        let f = fixture(true, -1).await;
        f.timer.set_password_session().await.unwrap();
        assert!(f.timer.check_session_valid().await);

        f.clock.advance(29 * MINUTE);
        f.timer.record_activity();
        assert!(f.timer.check_session_valid().await);
        assert_eq!(f.timer.remaining_ms().await, MINUTE);

        f.clock.advance(MINUTE);
        assert!(!f.timer.check_session_valid().await);
        assert_eq!(f.timer.remaining_ms().await, 0);
    }

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(format_remaining(0), "Expired");
        assert_eq!(format_remaining(45_000), "45s");
        assert_eq!(format_remaining(3 * 60_000 + 7_000), "3m 7s");
    }
}
