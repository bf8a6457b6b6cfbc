//! Signed-in user state. `AuthContext` owns the current user and a loading
//! flag, publishes every change over a watch channel, and is the only place
//! that stores tokens after login or the Google callback.

use crate::api::{
    auth,
    types::{LoginRequest, Role, User},
    ApiClient, ApiError,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// True until the first session check finishes.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Admins count as staff.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role().is_some_and(Role::is_staff)
    }
}

#[derive(Clone)]
pub struct AuthContext {
    client: ApiClient,
    state: Arc<watch::Sender<AuthState>>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            client,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Waits for the first session check to finish and returns the state.
    pub async fn ready(&self) -> AuthState {
        let mut receiver = self.subscribe();
        let state = match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        state
    }

    fn publish(&self, user: Option<User>) {
        self.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    /// Restores the session from stored tokens.
    ///
    /// A 401/403 (or a refresh that could not be completed) means the stored
    /// session is gone: tokens are cleared and the user is signed out without
    /// an error. Without an access token no request is made.
    #[instrument(skip_all)]
    pub async fn check_auth(&self) -> Option<User> {
        if self.client.tokens().access_token().is_none() {
            debug!("no access token stored, skipping session check");
            self.publish(None);
            return None;
        }

        let user = match auth::me(&self.client).await {
            Ok(user) => {
                debug!(username = %user.username, "session restored");
                Some(user)
            }
            Err(err) if err.is_unauthorized() => {
                info!("stored session is no longer valid");
                if let Err(err) = self.client.tokens().clear() {
                    error!("Failed to clear tokens: {err}");
                }
                None
            }
            Err(err) => {
                error!("session check failed: {err}");
                None
            }
        };

        self.publish(user.clone());
        user
    }

    /// Signs in and stores the session. The user comes from the login
    /// response; `/auth/me` is not called.
    ///
    /// # Errors
    /// Returns the backend error (see [`ApiError::is_two_factor_required`]), or
    /// [`ApiError::IncompleteLogin`] if the response lacks a token or the user,
    /// in which case nothing is stored.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        totp_token: Option<&str>,
    ) -> Result<User, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.expose_secret().to_string(),
            totp_token: totp_token
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        };

        let response = auth::login(&self.client, &request).await?;
        debug!(
            has_access_token = response.access_token.is_some(),
            has_refresh_token = response.refresh_token.is_some(),
            has_user = response.user.is_some(),
            "login response received"
        );

        let non_empty = |token: Option<String>| token.filter(|token| !token.is_empty());
        let (Some(user), Some(access), Some(refresh)) = (
            response.user,
            non_empty(response.access_token),
            non_empty(response.refresh_token),
        ) else {
            warn!("login response did not include a complete session");
            self.client.tokens().clear()?;
            self.publish(None);
            return Err(ApiError::IncompleteLogin);
        };

        self.client
            .tokens()
            .set_tokens(SecretString::from(access), SecretString::from(refresh))?;
        info!(role = %user.role, "signed in");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// Signs out. Local tokens and the user are cleared even when the backend
    /// call fails.
    ///
    /// # Errors
    /// Returns the backend error after the local session has been cleared.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = auth::logout(&self.client).await;
        self.publish(None);
        result.map(|_| ())
    }

    /// Re-fetches the current user, e.g. after enabling or disabling 2FA.
    ///
    /// # Errors
    /// Returns the backend error; the stored user is left unchanged.
    #[instrument(skip_all)]
    pub async fn refresh_user(&self) -> Result<User, ApiError> {
        let user = auth::me(&self.client).await?;
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// Stores tokens obtained outside the login form (Google sign-in) and
    /// loads the user they belong to.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be stored.
    #[instrument(skip_all)]
    pub async fn set_tokens(
        &self,
        access: SecretString,
        refresh: SecretString,
    ) -> Result<Option<User>, ApiError> {
        self.client.tokens().set_tokens(access, refresh)?;
        Ok(self.check_auth().await)
    }
}
