use super::{render, run::enter};
use crate::{
    api::{
        auth::{self, parse_oauth_callback},
        types::RegisterRequest,
    },
    cli::{commands::auth::Options, globals::GlobalArgs},
    session::{guard::paths, Navigator, Route},
    validation,
};
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

/// Login page path the Google callback falls back to.
const OAUTH_FAILED: &str = "/login?error=oauth_failed";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub options: Options,
}

/// Execute an account command.
/// # Errors
/// Returns an error if validation, the route guard or the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, options } = args;

    match options {
        Options::Register {
            username,
            email,
            password,
            confirm_password,
        } => register(&globals, username, &email, &password, &confirm_password).await,
        Options::Login {
            username,
            password,
            totp,
        } => login(&globals, &username, &password, totp.as_deref()).await,
        Options::Logout => logout(&globals).await,
        Options::WhoAmI => {
            let session = enter(&globals, Route::Profile).await?;
            if let Some(user) = session.auth.snapshot().user {
                println!("{}", render::user(&user));
            }
            Ok(())
        }
        Options::Refresh => {
            let session = enter(&globals, Route::Home).await?;
            auth::refresh(session.auth.client())
                .await
                .context("could not refresh the session")?;
            println!("Access token refreshed");
            Ok(())
        }
        Options::GoogleLogin => {
            let session = enter(&globals, Route::Login).await?;
            println!(
                "Open this URL in a browser to sign in with Google:\n\n  {}\n\nThen run `optika oauth-callback <URL>` with the address you were redirected to.",
                auth::google_login_url(session.auth.client())
            );
            Ok(())
        }
        Options::OAuthCallback { url } => oauth_callback(&globals, &url).await,
    }
}

async fn register(
    globals: &GlobalArgs,
    username: String,
    email: &str,
    password: &SecretString,
    confirm_password: &SecretString,
) -> Result<()> {
    let email = validation::validate_registration(
        &username,
        email,
        password.expose_secret(),
        confirm_password.expose_secret(),
    )?;

    let session = enter(globals, Route::Register).await?;
    let request = RegisterRequest {
        username: username.trim().to_string(),
        email,
        password: password.expose_secret().to_string(),
    };
    let user = auth::register(session.auth.client(), &request)
        .await
        .context("registration failed")?;

    info!(username = %user.username, "account created");
    session.navigator.navigate(paths::LOGIN);
    println!(
        "Account {} created. Sign in with `optika login -u {}`.",
        user.username, user.username
    );
    Ok(())
}

async fn login(
    globals: &GlobalArgs,
    username: &str,
    password: &SecretString,
    totp: Option<&str>,
) -> Result<()> {
    let totp = totp.map(validation::normalize_totp_code).transpose()?;

    let session = enter(globals, Route::Login).await?;
    match session.auth.login(username, password, totp.as_deref()).await {
        Ok(user) => {
            session.navigator.navigate(paths::PROFILE);
            println!("Signed in as {} ({})", user.username, user.role);
            Ok(())
        }
        Err(err) if err.is_two_factor_required() => {
            bail!("two-factor code required, run again with --totp <CODE>")
        }
        Err(err) => Err(err).context("login failed"),
    }
}

async fn logout(globals: &GlobalArgs) -> Result<()> {
    let session = enter(globals, Route::Home).await?;
    if session.auth.client().tokens().access_token().is_none() {
        println!("Not signed in");
        return Ok(());
    }

    if let Err(err) = session.auth.logout().await {
        warn!("backend logout failed: {err}");
    }
    session.navigator.navigate(paths::LOGIN);
    println!("Signed out");
    Ok(())
}

async fn oauth_callback(globals: &GlobalArgs, url: &str) -> Result<()> {
    let session = enter(globals, Route::GoogleSuccess).await?;

    let tokens = match parse_oauth_callback(url) {
        Ok(tokens) => tokens,
        Err(err) => {
            session.navigator.navigate(OAUTH_FAILED);
            return Err(err).context("Google sign-in failed");
        }
    };

    match session.auth.set_tokens(tokens.access, tokens.refresh).await? {
        Some(user) => {
            session.navigator.navigate(paths::PROFILE);
            println!("Signed in with Google as {} ({})", user.username, user.role);
            Ok(())
        }
        None => {
            session.navigator.navigate(OAUTH_FAILED);
            bail!("Google sign-in returned tokens the backend did not accept")
        }
    }
}
