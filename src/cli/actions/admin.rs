use super::{render, run::enter};
use crate::{
    api::{admin, logs, types::CreateUserRequest, ApiClient},
    cli::{
        commands::admin::{LogOptions, Options, UserOptions},
        globals::GlobalArgs,
    },
    session::Route,
    validation,
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub options: Options,
}

const fn route(options: &Options) -> Route {
    match options {
        Options::Dashboard => Route::Admin,
        Options::Users(_) => Route::AdminUsers,
        Options::Logs(_) => Route::AdminLogs,
    }
}

/// Execute an admin console command; requires the admin or staff role.
/// # Errors
/// Returns an error if the guard rejects the command or the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, options } = args;

    let session = enter(&globals, route(&options)).await?;
    let client = session.auth.client();

    let output = match options {
        Options::Dashboard => {
            let stats = admin::dashboard(client)
                .await
                .context("could not load the dashboard")?;
            render::dashboard(&stats)
        }
        Options::Users(options) => users(client, options).await?,
        Options::Logs(options) => audit_logs(client, options).await?,
    };

    println!("{output}");
    Ok(())
}

async fn users(client: &ApiClient, options: UserOptions) -> Result<String> {
    let output = match options {
        UserOptions::List => render::users(&admin::list_users(client).await?),
        UserOptions::Show(id) => render::user(
            &admin::get_user(client, id)
                .await
                .with_context(|| format!("could not load user {id}"))?,
        ),
        UserOptions::Create {
            username,
            email,
            password,
            role,
        } => {
            validation::validate_username(&username)?;
            let request = CreateUserRequest {
                username,
                email: validation::normalize_email(&email)?,
                password: password.expose_secret().to_string(),
                role,
            };
            let user = admin::create_user(client, &request)
                .await
                .context("could not create the user")?;
            format!("Created user\n{}", render::user(&user))
        }
        UserOptions::Update(id, mut update) => {
            if let Some(email) = update.email.take() {
                update.email = Some(validation::normalize_email(&email)?);
            }
            let user = admin::update_user(client, id, &update)
                .await
                .with_context(|| format!("could not update user {id}"))?;
            format!("Updated user\n{}", render::user(&user))
        }
        UserOptions::Delete(id) => {
            admin::delete_user(client, id)
                .await
                .with_context(|| format!("could not delete user {id}"))?
                .message
        }
        UserOptions::SetRole(id, role) => {
            let user = admin::set_role(client, id, role)
                .await
                .with_context(|| format!("could not change the role of user {id}"))?;
            format!("{} is now {}", user.username, user.role)
        }
        UserOptions::Block(id) => set_blocked(client, id, true).await?,
        UserOptions::Unblock(id) => set_blocked(client, id, false).await?,
        UserOptions::ResetTwoFactor(id) => {
            admin::reset_two_factor(client, id)
                .await
                .with_context(|| format!("could not reset 2FA for user {id}"))?
                .message
        }
    };
    Ok(output)
}

async fn set_blocked(client: &ApiClient, id: i64, blocked: bool) -> Result<String> {
    let user = admin::set_blocked(client, id, blocked)
        .await
        .with_context(|| format!("could not update user {id}"))?;
    Ok(format!(
        "{} is {}",
        user.username,
        if user.is_blocked { "blocked" } else { "unblocked" }
    ))
}

async fn audit_logs(client: &ApiClient, options: LogOptions) -> Result<String> {
    let output = match options {
        LogOptions::List(filters) => {
            let page = logs::list(client, &filters)
                .await
                .context("could not load the audit log")?;
            render::logs(&page, &filters)
        }
        LogOptions::Show(id) => render::log_entry(
            &logs::get(client, id)
                .await
                .with_context(|| format!("could not load audit event {id}"))?,
        ),
        LogOptions::Stats { from, to } => render::log_stats(
            &logs::stats(client, from.as_deref(), to.as_deref())
                .await
                .context("could not load audit statistics")?,
        ),
    };
    Ok(output)
}
