use crate::{
    cli::{
        actions::{admin, auth, products, twofa, Action},
        globals::{GlobalArgs, Session},
    },
    session::{
        guard::{self, paths, Access},
        Guard, Navigator, Route,
    },
};
use anyhow::{bail, Result};
use tracing::debug;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::TwoFactor(args) => twofa::execute(args).await,
        Action::Products(args) => products::execute(args).await,
        Action::Admin(args) => admin::execute(args).await,
    }
}

/// Opens a session on `route` and runs the route guard against it.
///
/// Public routes skip the session check. Everything else restores the user
/// from the stored tokens first.
///
/// # Errors
/// Returns an error when the guard redirects away from `route`.
pub(super) async fn enter(globals: &GlobalArgs, route: Route) -> Result<Session> {
    let session = globals.session(route)?;
    if route.access() == Access::Public {
        return Ok(session);
    }

    session.auth.check_auth().await;
    let state = session.auth.ready().await;
    let outcome = guard::evaluate(route, &state);
    debug!(route = route.path(), ?outcome, "guard evaluated");

    match outcome {
        Guard::Render => Ok(session),
        Guard::Loading => bail!("session check did not finish"),
        Guard::Redirect(paths::LOGIN) => {
            session.navigator.redirect_to_login();
            bail!("not signed in, run `optika login` first")
        }
        Guard::Redirect(paths::PROFILE) => {
            let username = state.user.map(|user| user.username).unwrap_or_default();
            bail!("already signed in as {username}, run `optika logout` first")
        }
        Guard::Redirect(path) => {
            session.navigator.navigate(path);
            bail!("this command requires the admin or staff role")
        }
    }
}
