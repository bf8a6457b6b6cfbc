//! Single-flight access token refresh.
//!
//! A rejected request joins the refresh slot. The first caller installs a
//! shared refresh future; callers arriving while it runs await the same future
//! and replay (or fail) together once it resolves. The future empties the slot
//! when it completes, so at most one `POST /auth/refresh` is ever in flight.

use super::{
    errors::{error_message, ApiError},
    types::{RefreshRequest, RefreshResponse},
    ApiClient, ApiRequest,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

type PendingRefresh = Shared<BoxFuture<'static, Result<(), ApiError>>>;

#[derive(Default)]
pub(crate) struct RefreshGate {
    slot: Arc<Mutex<Option<PendingRefresh>>>,
}

impl RefreshGate {
    /// Recovers from a 401/403 received while sending `rejected`.
    ///
    /// Returns `Ok` once the caller may replay its request.
    pub(crate) async fn recover(
        &self,
        client: &ApiClient,
        rejected: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let pending = {
            let mut slot = self.lock_slot()?;

            if let Some(current) = client.tokens().access_token() {
                let unchanged =
                    rejected.is_some_and(|token| token.expose_secret() == current.expose_secret());
                if !unchanged {
                    debug!("access token changed since the request was sent, replaying");
                    return Ok(());
                }
            }

            self.join_or_start(&mut slot, client)
        };

        pending.await
    }

    /// Refreshes unconditionally, joining a refresh already in flight.
    pub(crate) async fn refresh(&self, client: &ApiClient) -> Result<(), ApiError> {
        let pending = {
            let mut slot = self.lock_slot()?;
            self.join_or_start(&mut slot, client)
        };

        pending.await
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn lock_slot(&self) -> Result<std::sync::MutexGuard<'_, Option<PendingRefresh>>, ApiError> {
        self.slot
            .lock()
            .map_err(|_| ApiError::Config("refresh state is poisoned".to_string()))
    }

    fn join_or_start(
        &self,
        slot: &mut Option<PendingRefresh>,
        client: &ApiClient,
    ) -> PendingRefresh {
        if let Some(pending) = slot.as_ref() {
            debug!("refresh already in flight, waiting for it");
            return pending.clone();
        }

        let client = client.clone();
        let slot_handle = Arc::clone(&self.slot);
        let pending = async move {
            let result = refresh_session(&client).await;
            if let Ok(mut slot) = slot_handle.lock() {
                slot.take();
            }
            result
        }
        .boxed()
        .shared();

        *slot = Some(pending.clone());
        pending
    }
}

/// Exchanges the stored refresh token for a new access token. Any failure ends
/// the session: tokens are cleared and the user is sent to the login page.
async fn refresh_session(client: &ApiClient) -> Result<(), ApiError> {
    let Some(refresh_token) = client.tokens().refresh_token() else {
        warn!("no refresh token available, ending session");
        client.end_session();
        return Err(ApiError::SessionExpired(
            "no refresh token available".to_string(),
        ));
    };

    match exchange(client, &refresh_token).await {
        Ok(()) => {
            info!("access token refreshed");
            Ok(())
        }
        Err(err) => {
            warn!("token refresh failed: {err}");
            client.end_session();
            Err(ApiError::SessionExpired(err.to_string()))
        }
    }
}

async fn exchange(client: &ApiClient, refresh_token: &SecretString) -> Result<(), ApiError> {
    let request = ApiRequest::post("/auth/refresh").json(&RefreshRequest {
        refresh_token: refresh_token.expose_secret(),
    })?;

    // Sent directly: the refresh endpoint must never re-enter the refresh flow.
    let response = client.dispatch(&request, None).await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let refreshed: RefreshResponse = response
        .json()
        .await
        .map_err(|err| ApiError::Parse(format!("Failed to decode refresh response: {err}")))?;

    let access = refreshed
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Parse("refresh response did not include an access token".to_string()))?;

    match refreshed.refresh_token.filter(|token| !token.is_empty()) {
        Some(rotated) => client
            .tokens()
            .set_tokens(SecretString::from(access), SecretString::from(rotated))?,
        None => client.tokens().set_access_token(SecretString::from(access))?,
    }

    Ok(())
}
