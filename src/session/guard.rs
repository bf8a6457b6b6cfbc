//! Route access rules. The guard is a UX aid only: it decides whether a page
//! is shown or where the user is sent, while the API enforces the real checks.

use super::context::AuthState;

pub mod paths {
    pub const HOME: &str = "/";
    pub const PRODUCTS: &str = "/products";
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const PROFILE: &str = "/profile";
    pub const GOOGLE_SUCCESS: &str = "/auth/google/success";
    pub const ADMIN: &str = "/admin";
    pub const ADMIN_USERS: &str = "/admin/users";
    pub const ADMIN_LOGS: &str = "/admin/logs";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Only for signed-out users; signed-in users go to their profile.
    GuestOnly,
    Authenticated,
    /// Admins and staff.
    Staff,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    Login,
    Register,
    GoogleSuccess,
    Profile,
    Admin,
    AdminUsers,
    AdminLogs,
}

impl Route {
    pub const ALL: [Self; 9] = [
        Self::Home,
        Self::Products,
        Self::Login,
        Self::Register,
        Self::GoogleSuccess,
        Self::Profile,
        Self::Admin,
        Self::AdminUsers,
        Self::AdminLogs,
    ];

    /// Matches a path, ignoring the query string and a trailing slash.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => paths::HOME,
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => paths::HOME,
            Self::Products => paths::PRODUCTS,
            Self::Login => paths::LOGIN,
            Self::Register => paths::REGISTER,
            Self::GoogleSuccess => paths::GOOGLE_SUCCESS,
            Self::Profile => paths::PROFILE,
            Self::Admin => paths::ADMIN,
            Self::AdminUsers => paths::ADMIN_USERS,
            Self::AdminLogs => paths::ADMIN_LOGS,
        }
    }

    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Home | Self::Products | Self::GoogleSuccess => Access::Public,
            Self::Login | Self::Register => Access::GuestOnly,
            Self::Profile => Access::Authenticated,
            Self::Admin | Self::AdminUsers | Self::AdminLogs => Access::Staff,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    /// The initial session check has not finished yet.
    Loading,
    Render,
    Redirect(&'static str),
}

#[must_use]
pub fn evaluate(route: Route, state: &AuthState) -> Guard {
    match route.access() {
        Access::Public => Guard::Render,
        Access::GuestOnly => {
            if state.is_authenticated() {
                Guard::Redirect(paths::PROFILE)
            } else {
                Guard::Render
            }
        }
        Access::Authenticated | Access::Staff if state.loading => Guard::Loading,
        Access::Authenticated | Access::Staff if !state.is_authenticated() => {
            Guard::Redirect(paths::LOGIN)
        }
        Access::Staff if !state.is_staff() => Guard::Redirect(paths::HOME),
        Access::Authenticated | Access::Staff => Guard::Render,
    }
}

/// Like [`evaluate`], for a raw path; unknown paths redirect home.
#[must_use]
pub fn evaluate_path(path: &str, state: &AuthState) -> Guard {
    Route::from_path(path).map_or(Guard::Redirect(paths::HOME), |route| evaluate(route, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Role, User};

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role,
            is_2fa_enabled: false,
            is_active: true,
            is_blocked: false,
            created_at: "2024-05-01T10:00:00".to_string(),
            last_login: None,
        }
    }

    fn signed_in(role: Role) -> AuthState {
        AuthState {
            user: Some(user(role)),
            loading: false,
        }
    }

    fn signed_out() -> AuthState {
        AuthState {
            user: None,
            loading: false,
        }
    }

    #[test]
    fn from_path_matches_known_routes() {
        assert_eq!(Route::from_path("/"), Some(Route::Home));
        assert_eq!(Route::from_path(""), Some(Route::Home));
        assert_eq!(Route::from_path("/admin/logs/"), Some(Route::AdminLogs));
        assert_eq!(
            Route::from_path("/auth/google/success?access_token=a&refresh_token=b"),
            Some(Route::GoogleSuccess)
        );
        assert_eq!(Route::from_path("/nope"), None);

        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn loading_state_waits_on_protected_routes() {
        let state = AuthState::default();
        assert!(state.loading);

        assert_eq!(evaluate(Route::Profile, &state), Guard::Loading);
        assert_eq!(evaluate(Route::Admin, &state), Guard::Loading);
        assert_eq!(evaluate(Route::Home, &state), Guard::Render);
        assert_eq!(evaluate(Route::Login, &state), Guard::Render);
    }

    #[test]
    fn signed_out_users_are_sent_to_login() {
        let state = signed_out();
        assert_eq!(evaluate(Route::Profile, &state), Guard::Redirect(paths::LOGIN));
        assert_eq!(evaluate(Route::AdminUsers, &state), Guard::Redirect(paths::LOGIN));
        assert_eq!(evaluate(Route::Products, &state), Guard::Render);
        assert_eq!(evaluate(Route::Register, &state), Guard::Render);
    }

    #[test]
    fn staff_routes_require_admin_or_staff() {
        for route in [Route::Admin, Route::AdminUsers, Route::AdminLogs] {
            assert_eq!(evaluate(route, &signed_in(Role::User)), Guard::Redirect(paths::HOME));
            assert_eq!(evaluate(route, &signed_in(Role::Staff)), Guard::Render);
            assert_eq!(evaluate(route, &signed_in(Role::Admin)), Guard::Render);
        }
        assert_eq!(evaluate(Route::Profile, &signed_in(Role::User)), Guard::Render);
    }

    #[test]
    fn guest_pages_redirect_signed_in_users() {
        let state = signed_in(Role::User);
        assert_eq!(evaluate(Route::Login, &state), Guard::Redirect(paths::PROFILE));
        assert_eq!(evaluate(Route::Register, &state), Guard::Redirect(paths::PROFILE));
    }

    #[test]
    fn unknown_paths_redirect_home() {
        assert_eq!(evaluate_path("/missing", &signed_out()), Guard::Redirect(paths::HOME));
        assert_eq!(evaluate_path("/admin?tab=x", &signed_out()), Guard::Redirect(paths::LOGIN));
    }

    #[test]
    fn guard_outcome_for_every_route_and_state() {
        let states = [
            AuthState::default(),
            signed_out(),
            signed_in(Role::User),
            signed_in(Role::Staff),
            signed_in(Role::Admin),
        ];

        for route in Route::ALL {
            for state in &states {
                let guard = evaluate(route, state);
                match route.access() {
                    Access::Public => assert_eq!(guard, Guard::Render),
                    Access::Authenticated | Access::Staff if state.loading => {
                        assert_eq!(guard, Guard::Loading);
                    }
                    Access::Authenticated | Access::Staff if state.user.is_none() => {
                        assert_eq!(guard, Guard::Redirect(paths::LOGIN));
                    }
                    _ => assert!(matches!(guard, Guard::Render | Guard::Redirect(_))),
                }
            }
        }
    }
}
