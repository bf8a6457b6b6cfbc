//! Client-side session: token storage, the signed-in user, route guards and
//! navigation after a session ends.

pub mod context;
pub mod guard;
pub mod navigator;
pub mod store;

pub use context::{AuthContext, AuthState};
pub use guard::{Guard, Route};
pub use navigator::{Navigator, SessionNavigator};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
