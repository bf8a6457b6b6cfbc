//! # Optika (shop client)
//!
//! `optika` talks to the Optika shop backend: account registration, login with
//! optional TOTP, Google sign-in, two-factor enrollment, the product catalog and
//! the admin console (users, audit log, statistics).
//!
//! ## Sessions
//!
//! The backend issues a short-lived **access token** (sent as `Authorization:
//! Bearer`) and a longer-lived **refresh token**. Both live in a [`TokenStore`];
//! the CLI persists them in a JSON file so a session survives between runs.
//!
//! When a protected call comes back `401`/`403`, the [`ApiClient`] refreshes the
//! access token once and replays the call. Concurrent callers share that single
//! refresh instead of each starting their own. A failed refresh ends the
//! session: tokens are cleared and the [`Navigator`] is sent to `/login`.
//!
//! ## Authorization
//!
//! Roles are `admin`, `staff` and `user`. The client only uses them to decide
//! which routes to offer (see [`session::guard`]); enforcement lives on the API.
//!
//! [`TokenStore`]: session::store::TokenStore
//! [`ApiClient`]: api::ApiClient
//! [`Navigator`]: session::navigator::Navigator

pub mod api;
pub mod cli;
pub mod session;
pub mod validation;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
