use super::{id, id_arg, non_empty, required, secret};
use crate::api::{
    logs::{LogFilters, LogSortField, SortOrder, DEFAULT_LIMIT, MAX_LIMIT},
    types::{LogStatus, Role, UpdateUserRequest},
};
use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const CMD_ADMIN: &str = "admin";
pub const CMD_DASHBOARD: &str = "dashboard";
pub const CMD_USERS: &str = "users";
pub const CMD_LOGS: &str = "logs";

pub const CMD_LIST: &str = "list";
pub const CMD_SHOW: &str = "show";
pub const CMD_CREATE: &str = "create";
pub const CMD_UPDATE: &str = "update";
pub const CMD_DELETE: &str = "delete";
pub const CMD_ROLE: &str = "role";
pub const CMD_BLOCK: &str = "block";
pub const CMD_UNBLOCK: &str = "unblock";
pub const CMD_RESET_2FA: &str = "reset-2fa";
pub const CMD_STATS: &str = "stats";

pub const ARG_ID: &str = "id";
pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_ROLE: &str = "role";
pub const ARG_ACTIVE: &str = "active";
pub const ARG_BLOCKED: &str = "blocked";

pub const ARG_PAGE: &str = "page";
pub const ARG_LIMIT: &str = "limit";
pub const ARG_OPERATION: &str = "operation";
pub const ARG_STATUS: &str = "status";
pub const ARG_FROM: &str = "from";
pub const ARG_TO: &str = "to";
pub const ARG_IP: &str = "ip";
pub const ARG_SORT_BY: &str = "sort-by";
pub const ARG_SORT_ORDER: &str = "sort-order";

fn roles() -> [&'static str; 3] {
    Role::ALL.map(Role::as_str)
}

#[derive(Debug)]
pub enum UserOptions {
    List,
    Show(i64),
    Create {
        username: String,
        email: String,
        password: SecretString,
        role: Role,
    },
    Update(i64, UpdateUserRequest),
    Delete(i64),
    SetRole(i64, Role),
    Block(i64),
    Unblock(i64),
    ResetTwoFactor(i64),
}

#[derive(Debug)]
pub enum LogOptions {
    List(LogFilters),
    Show(i64),
    Stats {
        from: Option<String>,
        to: Option<String>,
    },
}

#[derive(Debug)]
pub enum Options {
    Dashboard,
    Users(UserOptions),
    Logs(LogOptions),
}

fn role(matches: &ArgMatches) -> anyhow::Result<Option<Role>> {
    non_empty(matches, ARG_ROLE)
        .map(|value| value.parse::<Role>().map_err(|err| anyhow!(err)))
        .transpose()
}

impl Options {
    /// Parse the `admin` subcommand.
    ///
    /// # Errors
    /// Returns an error if an action or a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        match matches.subcommand() {
            Some((CMD_DASHBOARD, _)) => Ok(Self::Dashboard),
            Some((CMD_USERS, sub)) => Ok(Self::Users(parse_users(sub)?)),
            Some((CMD_LOGS, sub)) => Ok(Self::Logs(parse_logs(sub)?)),
            _ => anyhow::bail!("missing admin section: dashboard, users or logs"),
        }
    }
}

fn parse_users(matches: &ArgMatches) -> anyhow::Result<UserOptions> {
    let options = match matches.subcommand() {
        Some((CMD_LIST, _)) => UserOptions::List,
        Some((CMD_SHOW, sub)) => UserOptions::Show(id(sub, ARG_ID)?),
        Some((CMD_CREATE, sub)) => UserOptions::Create {
            username: required(sub, ARG_USERNAME)?,
            email: required(sub, ARG_EMAIL)?,
            password: secret(sub, ARG_PASSWORD)?,
            role: role(sub)?.unwrap_or(Role::User),
        },
        Some((CMD_UPDATE, sub)) => {
            let update = UpdateUserRequest {
                email: non_empty(sub, ARG_EMAIL),
                is_active: sub.get_one::<bool>(ARG_ACTIVE).copied(),
                is_blocked: sub.get_one::<bool>(ARG_BLOCKED).copied(),
                role: role(sub)?,
            };
            if update.is_empty() {
                anyhow::bail!(
                    "nothing to update: pass --{ARG_EMAIL}, --{ARG_ACTIVE}, --{ARG_BLOCKED} or --{ARG_ROLE}"
                );
            }
            UserOptions::Update(id(sub, ARG_ID)?, update)
        }
        Some((CMD_DELETE, sub)) => UserOptions::Delete(id(sub, ARG_ID)?),
        Some((CMD_ROLE, sub)) => UserOptions::SetRole(
            id(sub, ARG_ID)?,
            role(sub)?.ok_or_else(|| anyhow!("missing required argument: <{ARG_ROLE}>"))?,
        ),
        Some((CMD_BLOCK, sub)) => UserOptions::Block(id(sub, ARG_ID)?),
        Some((CMD_UNBLOCK, sub)) => UserOptions::Unblock(id(sub, ARG_ID)?),
        Some((CMD_RESET_2FA, sub)) => UserOptions::ResetTwoFactor(id(sub, ARG_ID)?),
        _ => anyhow::bail!("missing users action"),
    };
    Ok(options)
}

fn parse_logs(matches: &ArgMatches) -> anyhow::Result<LogOptions> {
    let options = match matches.subcommand() {
        Some((CMD_LIST, sub)) => {
            let text = |arg: &str| non_empty(sub, arg).unwrap_or_default();
            LogOptions::List(LogFilters {
                page: sub.get_one::<u32>(ARG_PAGE).copied().unwrap_or(1),
                limit: sub.get_one::<u32>(ARG_LIMIT).copied().unwrap_or(DEFAULT_LIMIT),
                username: text(ARG_USERNAME),
                operation: text(ARG_OPERATION),
                status: text(ARG_STATUS),
                role: text(ARG_ROLE),
                from_date: non_empty(sub, ARG_FROM),
                to_date: non_empty(sub, ARG_TO),
                ip_address: non_empty(sub, ARG_IP),
                sort_by: non_empty(sub, ARG_SORT_BY)
                    .map(|value| value.parse::<LogSortField>().map_err(|err| anyhow!(err)))
                    .transpose()?
                    .unwrap_or_default(),
                sort_order: non_empty(sub, ARG_SORT_ORDER)
                    .map(|value| value.parse::<SortOrder>().map_err(|err| anyhow!(err)))
                    .transpose()?
                    .unwrap_or_default(),
            })
        }
        Some((CMD_SHOW, sub)) => LogOptions::Show(id(sub, ARG_ID)?),
        Some((CMD_STATS, sub)) => LogOptions::Stats {
            from: non_empty(sub, ARG_FROM),
            to: non_empty(sub, ARG_TO),
        },
        _ => anyhow::bail!("missing logs action: list, show or stats"),
    };
    Ok(options)
}

fn role_arg() -> Arg {
    Arg::new(ARG_ROLE)
        .long(ARG_ROLE)
        .help("Role: admin, staff or user")
        .value_parser(roles())
}

fn from_to_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FROM)
                .long(ARG_FROM)
                .help("Only events at or after this ISO-8601 timestamp"),
        )
        .arg(
            Arg::new(ARG_TO)
                .long(ARG_TO)
                .help("Only events at or before this ISO-8601 timestamp"),
        )
}

fn users_command() -> Command {
    Command::new(CMD_USERS)
        .about("Manage user accounts")
        .subcommand_required(true)
        .subcommand(Command::new(CMD_LIST).about("List all users"))
        .subcommand(
            Command::new(CMD_SHOW)
                .about("Show one user")
                .arg(id_arg(ARG_ID, "User id")),
        )
        .subcommand(
            Command::new(CMD_CREATE)
                .about("Create a user")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Username")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Email address")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .short('p')
                        .long(ARG_PASSWORD)
                        .help("Initial password")
                        .required(true),
                )
                .arg(role_arg().default_value("user")),
        )
        .subcommand(
            Command::new(CMD_UPDATE)
                .about("Change email, status or role")
                .arg(id_arg(ARG_ID, "User id"))
                .arg(Arg::new(ARG_EMAIL).long(ARG_EMAIL).help("New email address"))
                .arg(
                    Arg::new(ARG_ACTIVE)
                        .long(ARG_ACTIVE)
                        .help("Mark the account active (true) or inactive (false)")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new(ARG_BLOCKED)
                        .long(ARG_BLOCKED)
                        .help("Block (true) or unblock (false) the account")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(role_arg()),
        )
        .subcommand(
            Command::new(CMD_DELETE)
                .about("Delete a user")
                .arg(id_arg(ARG_ID, "User id")),
        )
        .subcommand(
            Command::new(CMD_ROLE)
                .about("Change a user's role")
                .arg(id_arg(ARG_ID, "User id"))
                .arg(
                    Arg::new(ARG_ROLE)
                        .help("New role")
                        .required(true)
                        .value_parser(roles()),
                ),
        )
        .subcommand(
            Command::new(CMD_BLOCK)
                .about("Block a user")
                .arg(id_arg(ARG_ID, "User id")),
        )
        .subcommand(
            Command::new(CMD_UNBLOCK)
                .about("Unblock a user")
                .arg(id_arg(ARG_ID, "User id")),
        )
        .subcommand(
            Command::new(CMD_RESET_2FA)
                .about("Remove a user's two-factor enrollment")
                .arg(id_arg(ARG_ID, "User id")),
        )
}

fn logs_command() -> Command {
    let list = Command::new(CMD_LIST)
        .about("List audit events, newest first by default")
        .arg(
            Arg::new(ARG_PAGE)
                .long(ARG_PAGE)
                .help("Page number")
                .default_value("1")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_LIMIT)
                .long(ARG_LIMIT)
                .help("Events per page")
                .default_value("20")
                .value_parser(clap::value_parser!(u32).range(1..=i64::from(MAX_LIMIT))),
        )
        .arg(Arg::new(ARG_USERNAME).long(ARG_USERNAME).help("Filter by username"))
        .arg(
            Arg::new(ARG_OPERATION)
                .long(ARG_OPERATION)
                .help("Filter by operation, e.g. login_failed or role_changed"),
        )
        .arg(
            Arg::new(ARG_STATUS)
                .long(ARG_STATUS)
                .help("Filter by status")
                .value_parser(LogStatus::ALL.map(LogStatus::as_str)),
        )
        .arg(
            Arg::new(ARG_ROLE)
                .long(ARG_ROLE)
                .help("Filter by the actor's role")
                .value_parser(roles()),
        )
        .arg(Arg::new(ARG_IP).long(ARG_IP).help("Filter by client IP address"))
        .arg(
            Arg::new(ARG_SORT_BY)
                .long(ARG_SORT_BY)
                .help("Sort field")
                .default_value("timestamp")
                .value_parser(LogSortField::ALL.map(LogSortField::as_str)),
        )
        .arg(
            Arg::new(ARG_SORT_ORDER)
                .long(ARG_SORT_ORDER)
                .help("Sort direction")
                .default_value("desc")
                .value_parser(["asc", "desc"]),
        );

    Command::new(CMD_LOGS)
        .about("Inspect the audit log")
        .subcommand_required(true)
        .subcommand(from_to_args(list))
        .subcommand(
            Command::new(CMD_SHOW)
                .about("Show one audit event")
                .arg(id_arg(ARG_ID, "Event id")),
        )
        .subcommand(from_to_args(
            Command::new(CMD_STATS).about("Event counts by status, operation and user"),
        ))
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_ADMIN)
            .about("Admin console (admin and staff roles)")
            .subcommand_required(true)
            .subcommand(Command::new(CMD_DASHBOARD).about("User and audit-log summary"))
            .subcommand(users_command())
            .subcommand(logs_command()),
    )
}
