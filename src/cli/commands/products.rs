use super::non_empty;
use clap::{Arg, ArgMatches, Command};

pub const CMD_PRODUCTS: &str = "products";
pub const CMD_LIST: &str = "list";
pub const CMD_SHOW: &str = "show";

pub const ARG_CATEGORY: &str = "category";
pub const ARG_ID: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Options {
    List { category: Option<String> },
    Show { id: i64 },
}

impl Options {
    /// Parse the `products` subcommand.
    ///
    /// # Errors
    /// Returns an error if no action or the product id is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        match matches.subcommand() {
            Some((CMD_LIST, sub)) => Ok(Self::List {
                category: non_empty(sub, ARG_CATEGORY),
            }),
            Some((CMD_SHOW, sub)) => Ok(Self::Show {
                id: super::id(sub, ARG_ID)?,
            }),
            _ => anyhow::bail!("missing products action: list or show"),
        }
    }
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_PRODUCTS)
            .about("Browse the catalog")
            .subcommand_required(true)
            .subcommand(
                Command::new(CMD_LIST).about("List products").arg(
                    Arg::new(ARG_CATEGORY)
                        .short('c')
                        .long(ARG_CATEGORY)
                        .help("Only this category, e.g. Солнцезащитные, Для чтения, Спортивные, Компьютерные, Детские"),
                ),
            )
            .subcommand(
                Command::new(CMD_SHOW)
                    .about("Show one product")
                    .arg(super::id_arg(ARG_ID, "Product id")),
            ),
    )
}
