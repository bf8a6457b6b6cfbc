pub mod admin;
pub mod auth;
pub mod logging;
pub mod products;
pub mod session;
pub mod twofa;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgMatches, ColorChoice, Command,
};
use secrecy::SecretString;

/// Trimmed value of an argument that must not be blank.
///
/// # Errors
/// Returns an error if the argument is missing or only whitespace.
pub(crate) fn required(matches: &ArgMatches, id: &str) -> anyhow::Result<String> {
    non_empty(matches, id).ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
}

/// Secret argument taken exactly as typed.
///
/// # Errors
/// Returns an error if the argument is missing or only whitespace.
pub(crate) fn secret(matches: &ArgMatches, id: &str) -> anyhow::Result<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::from(value.clone()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
}

pub(crate) fn non_empty(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn id(matches: &ArgMatches, arg: &str) -> anyhow::Result<i64> {
    matches
        .get_one::<i64>(arg)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("missing required argument: <{arg}>"))
}

pub(crate) fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .value_parser(clap::value_parser!(i64).range(1..))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("optika")
        .about("Client for the Optika shop backend")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = session::with_args(command);
    let command = auth::with_subcommands(command);
    let command = twofa::with_subcommands(command);
    let command = products::with_subcommands(command);
    let command = admin::with_subcommands(command);
    logging::with_args(command)
}
