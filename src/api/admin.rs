//! User management for admins and staff, and the dashboard summary.

use super::{
    logs,
    types::{CreateUserRequest, LogStats, Message, Role, RoleUpdateRequest, UpdateUserRequest, User},
    ApiClient, ApiError, ApiRequest,
};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn list_users(client: &ApiClient) -> Result<Vec<User>, ApiError> {
    client.json(ApiRequest::get("/admin/users")).await
}

#[instrument(skip(client))]
pub async fn get_user(client: &ApiClient, id: i64) -> Result<User, ApiError> {
    client.json(ApiRequest::get(format!("/admin/users/{id}"))).await
}

#[instrument(skip_all, fields(username = %request.username, role = %request.role))]
pub async fn create_user(client: &ApiClient, request: &CreateUserRequest) -> Result<User, ApiError> {
    client
        .json(ApiRequest::post("/admin/users").json(request)?)
        .await
}

/// Applies a partial update; fields left as `None` are not sent.
#[instrument(skip(client))]
pub async fn update_user(
    client: &ApiClient,
    id: i64,
    update: &UpdateUserRequest,
) -> Result<User, ApiError> {
    client
        .json(ApiRequest::put(format!("/admin/users/{id}")).json(update)?)
        .await
}

#[instrument(skip(client))]
pub async fn delete_user(client: &ApiClient, id: i64) -> Result<Message, ApiError> {
    client
        .json(ApiRequest::delete(format!("/admin/users/{id}")))
        .await
}

#[instrument(skip(client))]
pub async fn set_role(client: &ApiClient, id: i64, role: Role) -> Result<User, ApiError> {
    client
        .json(ApiRequest::put(format!("/admin/users/{id}/role")).json(&RoleUpdateRequest { role })?)
        .await
}

/// Blocks or unblocks an account through the regular update endpoint.
#[instrument(skip(client))]
pub async fn set_blocked(client: &ApiClient, id: i64, blocked: bool) -> Result<User, ApiError> {
    let update = UpdateUserRequest {
        is_blocked: Some(blocked),
        ..UpdateUserRequest::default()
    };
    update_user(client, id, &update).await
}

/// Removes the user's TOTP secret so they can enroll again.
#[instrument(skip(client))]
pub async fn reset_two_factor(client: &ApiClient, id: i64) -> Result<Message, ApiError> {
    client
        .json(ApiRequest::post(format!("/admin/users/{id}/reset-2fa")))
        .await
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub admins: usize,
    pub staff: usize,
    pub regular_users: usize,
    pub active_users: usize,
    pub with_two_factor: usize,
    pub logs: LogStats,
}

impl DashboardStats {
    #[must_use]
    pub fn from_users(users: &[User], logs: LogStats) -> Self {
        let count = |predicate: fn(&User) -> bool| users.iter().filter(|u| predicate(u)).count();

        Self {
            total_users: users.len(),
            admins: count(|u| u.role == Role::Admin),
            staff: count(|u| u.role == Role::Staff),
            regular_users: count(|u| u.role == Role::User),
            active_users: count(|u| u.is_active),
            with_two_factor: count(|u| u.is_2fa_enabled),
            logs,
        }
    }
}

/// Loads the user list and the log summary concurrently.
#[instrument(skip_all)]
pub async fn dashboard(client: &ApiClient) -> Result<DashboardStats, ApiError> {
    let (users, stats) = tokio::try_join!(list_users(client), logs::stats(client, None, None))?;
    Ok(DashboardStats::from_users(&users, stats))
}
