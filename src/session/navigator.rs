//! Where the user currently "is" and where the client sends them when a session
//! ends. The CLI sets the current route before running a command so a failed
//! refresh can tell whether the user is already on an unauthenticated page.

use std::sync::RwLock;
use tracing::{debug, warn};

use super::guard::paths;

pub trait Navigator: Send + Sync {
    /// Path of the page the user is on.
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);

    /// Sends the user to the login page unless they are already on it or on
    /// the registration page.
    fn redirect_to_login(&self) {
        let current = self.current_path();
        let path = current.split('?').next().unwrap_or_default();
        if path == paths::LOGIN || path == paths::REGISTER {
            debug!("already on {path}, not redirecting");
            return;
        }
        self.navigate(paths::LOGIN);
    }
}

/// Navigator that records the current location and every redirect.
#[derive(Debug)]
pub struct SessionNavigator {
    state: RwLock<NavigatorState>,
}

#[derive(Debug, Default)]
struct NavigatorState {
    current: String,
    history: Vec<String>,
}

impl SessionNavigator {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self {
            state: RwLock::new(NavigatorState {
                current: initial.to_string(),
                history: Vec::new(),
            }),
        }
    }

    /// Redirects issued so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }
}

impl Default for SessionNavigator {
    fn default() -> Self {
        Self::new(paths::HOME)
    }
}

impl Navigator for SessionNavigator {
    fn current_path(&self) -> String {
        self.state
            .read()
            .map(|state| state.current.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        if path.starts_with(paths::LOGIN) {
            warn!("session ended, sign in again with `optika login`");
        } else {
            debug!("navigating to {path}");
        }

        if let Ok(mut state) = self.state.write() {
            state.current = path.to_string();
            state.history.push(path.to_string());
        }
    }
}
