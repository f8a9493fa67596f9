// Screens the UI can be redirected to, and the seam the session logic uses
// to request a redirect inside the current UI context.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    SetupPassword,
    VerifyPassword,
    WalletChoice,
    Send,
    /// Any other screen; carries its path.
    Other(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::SetupPassword => "/setup-password",
            Route::VerifyPassword => "/verify-password",
            Route::WalletChoice => "/wallet-choice",
            Route::Send => "/send",
            Route::Other(path) => path,
        }
    }

    pub fn from_path(path: &str) -> Self {
        match path {
            "/" | "" => Route::Home,
            "/setup-password" => Route::SetupPassword,
            "/verify-password" => Route::VerifyPassword,
            "/wallet-choice" => Route::WalletChoice,
            "/send" => Route::Send,
            other => Route::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator {
    fn current_route(&self) -> Route;

    /// Replace the current screen (no history entry for the old one).
    fn navigate(&self, route: Route);
}

/// Navigator that only remembers where it was sent.
#[derive(Clone)]
pub struct MemoryNavigator {
    current: Rc<RefCell<Route>>,
    history: Rc<RefCell<Vec<Route>>>,
}

impl MemoryNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Rc::new(RefCell::new(start)),
            history: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Every redirect issued so far, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.history.borrow().clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> Route {
        self.current.borrow().clone()
    }

    fn navigate(&self, route: Route) {
        log::debug!("Navigate: {} -> {}", self.current.borrow(), route);
        self.history.borrow_mut().push(route.clone());
        *self.current.borrow_mut() = route;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_known_routes() {
        for route in [
            Route::Home,
            Route::SetupPassword,
            Route::VerifyPassword,
            Route::WalletChoice,
            Route::Send,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
        assert_eq!(Route::from_path("/swap"), Route::Other("/swap".into()));
    }
}
