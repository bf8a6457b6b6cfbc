use super::{non_empty, required, secret};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_REFRESH: &str = "refresh";
pub const CMD_GOOGLE_LOGIN: &str = "google-login";
pub const CMD_OAUTH_CALLBACK: &str = "oauth-callback";

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_TOTP: &str = "totp";
pub const ARG_CALLBACK_URL: &str = "url";

#[derive(Debug)]
pub enum Options {
    Register {
        username: String,
        email: String,
        password: SecretString,
        confirm_password: SecretString,
    },
    Login {
        username: String,
        password: SecretString,
        totp: Option<String>,
    },
    Logout,
    WhoAmI,
    Refresh,
    GoogleLogin,
    OAuthCallback {
        url: String,
    },
}

impl Options {
    /// Parse account subcommands. Returns `None` for other subcommands.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or empty.
    pub fn parse(name: &str, matches: &ArgMatches) -> anyhow::Result<Option<Self>> {
        let options = match name {
            CMD_REGISTER => Self::Register {
                username: required(matches, ARG_USERNAME)?,
                email: required(matches, ARG_EMAIL)?,
                password: secret(matches, ARG_PASSWORD)?,
                confirm_password: secret(matches, ARG_CONFIRM_PASSWORD)?,
            },
            CMD_LOGIN => Self::Login {
                username: required(matches, ARG_USERNAME)?,
                password: secret(matches, ARG_PASSWORD)?,
                totp: non_empty(matches, ARG_TOTP),
            },
            CMD_LOGOUT => Self::Logout,
            CMD_WHOAMI => Self::WhoAmI,
            CMD_REFRESH => Self::Refresh,
            CMD_GOOGLE_LOGIN => Self::GoogleLogin,
            CMD_OAUTH_CALLBACK => Self::OAuthCallback {
                url: required(matches, ARG_CALLBACK_URL)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(options))
    }
}

fn username_arg() -> Arg {
    Arg::new(ARG_USERNAME)
        .short('u')
        .long(ARG_USERNAME)
        .help("Account username")
        .env("OPTIKA_USERNAME")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("OPTIKA_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account")
                .arg(username_arg())
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Email address")
                        .required(true),
                )
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_CONFIRM_PASSWORD)
                        .long(ARG_CONFIRM_PASSWORD)
                        .help("Password again, must match --password")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in and store the session")
                .arg(username_arg())
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_TOTP)
                        .long(ARG_TOTP)
                        .help("Six-digit code from the authenticator app, for accounts with 2FA"),
                ),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in user"))
        .subcommand(Command::new(CMD_REFRESH).about("Exchange the refresh token for a new access token"))
        .subcommand(
            Command::new(CMD_GOOGLE_LOGIN).about("Print the URL that starts Google sign-in"),
        )
        .subcommand(
            Command::new(CMD_OAUTH_CALLBACK)
                .about("Finish Google sign-in with the URL the browser was redirected to")
                .arg(
                    Arg::new(ARG_CALLBACK_URL)
                        .help("Redirect URL containing access_token and refresh_token")
                        .required(true),
                ),
        )
}
