//! Maps parsed arguments to an [`Action`].

use crate::cli::{
    actions::{self, Action},
    commands::{admin, auth, products, session, twofa},
    globals::GlobalArgs,
};
use anyhow::{bail, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or blank.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::new(session::Options::parse(matches)?)?;

    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing command, see `optika --help`");
    };

    if let Some(options) = auth::Options::parse(name, sub)? {
        return Ok(Action::Auth(actions::auth::Args { globals, options }));
    }

    let action = match name {
        twofa::CMD_TWO_FACTOR => Action::TwoFactor(actions::twofa::Args {
            globals,
            options: twofa::Options::parse(sub)?,
        }),
        products::CMD_PRODUCTS => Action::Products(actions::products::Args {
            globals,
            options: products::Options::parse(sub)?,
        }),
        admin::CMD_ADMIN => Action::Admin(actions::admin::Args {
            globals,
            options: admin::Options::parse(sub)?,
        }),
        other => bail!("unknown command: {other}"),
    };
    Ok(action)
}
