pub mod backend;
pub mod identity;
pub mod logging;

use crate::config::{timeout_from_secs, DEFAULT_TIMEOUT_SECS};
use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ArgMatches, ColorChoice, Command,
};
use std::time::Duration;

pub const CMD_REDIRECT: &str = "redirect";
pub const CMD_REGISTER: &str = "register";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout";
pub const ARG_RETRIES: &str = "retries";
pub const ARG_JSON: &str = "json";

/// Per-request timeout from matches, `0` disabling it.
#[must_use]
pub fn request_timeout(matches: &ArgMatches) -> Option<Duration> {
    timeout_from_secs(
        matches
            .get_one::<u64>(ARG_REQUEST_TIMEOUT)
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    )
}

fn json_arg() -> Arg {
    Arg::new(ARG_JSON)
        .long(ARG_JSON)
        .help("Print the result as JSON")
        .action(ArgAction::SetTrue)
}

fn redirect_command() -> Command {
    let command = Command::new(CMD_REDIRECT)
        .about("Sign in, synchronize the profile and print where the user lands")
        .arg(
            Arg::new(ARG_RETRIES)
                .long(ARG_RETRIES)
                .help("Manual retries after a failed profile sync")
                .env("PORTALGATE_RETRIES")
                .default_value("0")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(json_arg());

    let command = backend::with_args(command);
    let command = identity::with_provider_args(command);
    identity::with_static_args(command)
}

fn register_command() -> Command {
    let command = Command::new(CMD_REGISTER)
        .about("Create an identity provider account")
        .arg(json_arg());

    identity::with_provider_args(command)
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

    let command = Command::new("portalgate")
        .about("Account portal session sync and role routing")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Per-request timeout in seconds, 0 disables it")
                .env("PORTALGATE_REQUEST_TIMEOUT")
                .global(true)
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
        .subcommand(redirect_command())
        .subcommand(register_command());

    logging::with_args(command)
}
