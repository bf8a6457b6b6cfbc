use super::{required, secret};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const CMD_TWO_FACTOR: &str = "2fa";
pub const CMD_ENABLE: &str = "enable";
pub const CMD_VERIFY: &str = "verify";
pub const CMD_DISABLE: &str = "disable";

pub const ARG_CODE: &str = "code";
pub const ARG_PASSWORD: &str = "password";

#[derive(Debug)]
pub enum Options {
    Enable,
    Verify { code: String },
    Disable { password: SecretString },
}

impl Options {
    /// Parse the `2fa` subcommand.
    ///
    /// # Errors
    /// Returns an error if no action or a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        match matches.subcommand() {
            Some((CMD_ENABLE, _)) => Ok(Self::Enable),
            Some((CMD_VERIFY, sub)) => Ok(Self::Verify {
                code: required(sub, ARG_CODE)?,
            }),
            Some((CMD_DISABLE, sub)) => Ok(Self::Disable {
                password: secret(sub, ARG_PASSWORD)?,
            }),
            _ => anyhow::bail!("missing 2fa action: enable, verify or disable"),
        }
    }
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_TWO_FACTOR)
            .about("Manage two-factor authentication")
            .subcommand_required(true)
            .subcommand(Command::new(CMD_ENABLE).about("Start enrollment and show the TOTP secret"))
            .subcommand(
                Command::new(CMD_VERIFY)
                    .about("Confirm enrollment with a code from the authenticator app")
                    .arg(Arg::new(ARG_CODE).help("Six-digit code").required(true)),
            )
            .subcommand(
                Command::new(CMD_DISABLE)
                    .about("Turn two-factor authentication off")
                    .arg(
                        Arg::new(ARG_PASSWORD)
                            .short('p')
                            .long(ARG_PASSWORD)
                            .help("Account password")
                            .env("OPTIKA_PASSWORD")
                            .hide_env_values(true)
                            .required(true),
                    ),
            ),
    )
}
