use crate::api::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TOKEN_FILE: &str = "token-file";
pub const ARG_TIMEOUT_SECONDS: &str = "timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub api_url: String,
    pub token_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl Options {
    /// Parse backend connection arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_url = match matches.get_one::<String>(ARG_API_URL) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_API_URL}"),
        };

        let token_file = matches
            .get_one::<String>(ARG_TOKEN_FILE)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let timeout = matches
            .get_one::<u64>(ARG_TIMEOUT_SECONDS)
            .copied()
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            api_url,
            token_file,
            timeout,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the shop API")
                .env("OPTIKA_API_URL")
                .default_value(DEFAULT_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_FILE)
                .long(ARG_TOKEN_FILE)
                .help("File holding the session tokens")
                .long_help(
                    "File holding the access and refresh tokens between runs.\n\nDefaults to `optika/session.json` under the user configuration directory. The file is written with mode 0600.",
                )
                .env("OPTIKA_TOKEN_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_SECONDS)
                .long(ARG_TIMEOUT_SECONDS)
                .help("Per-request timeout in seconds")
                .env("OPTIKA_TIMEOUT_SECONDS")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
