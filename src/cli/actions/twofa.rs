use super::{render, run::enter};
use crate::{
    api::twofa,
    cli::{commands::twofa::Options, globals::GlobalArgs},
    session::Route,
    validation,
};
use anyhow::{Context, Result};
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub options: Options,
}

/// Execute a two-factor command. Runs on the profile page, so a session is
/// required.
/// # Errors
/// Returns an error if the code is malformed, the guard rejects the command
/// or the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, options } = args;

    let code = match &options {
        Options::Verify { code } => Some(validation::normalize_totp_code(code)?),
        _ => None,
    };

    let session = enter(&globals, Route::Profile).await?;
    let client = session.auth.client();

    let message = match options {
        Options::Enable => {
            let enrollment = twofa::enable(client)
                .await
                .context("could not start 2FA enrollment")?;
            println!("{}", render::enrollment(&enrollment));
            return Ok(());
        }
        Options::Verify { .. } => twofa::verify(client, code.as_deref().unwrap_or_default())
            .await
            .context("code rejected")?,
        Options::Disable { password } => twofa::disable(client, &password)
            .await
            .context("could not disable 2FA")?,
    };

    match session.auth.refresh_user().await {
        Ok(user) => println!(
            "{}\n2FA is now {}",
            message.message,
            if user.is_2fa_enabled { "on" } else { "off" }
        ),
        Err(err) => {
            warn!("could not reload the user: {err}");
            println!("{}", message.message);
        }
    }
    Ok(())
}
