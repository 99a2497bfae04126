use crate::{
    config::{normalize_value, IdentityConfig, DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL},
    identity::Session,
};
use anyhow::{bail, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_TOKEN_URL: &str = "token-url";
pub const ARG_API_KEY: &str = "api-key";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TOKEN: &str = "token";
pub const ARG_IDENTITY_ID: &str = "identity-id";
pub const ARG_DISPLAY_NAME: &str = "display-name";

const DEFAULT_STATIC_IDENTITY: &str = "static-session";

fn get_non_empty(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .and_then(|value| normalize_value(value))
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    match get_non_empty(matches, id) {
        Some(value) => Ok(value),
        None => bail!("missing required argument: --{id}"),
    }
}

/// Email/password sign-in against the identity provider.
#[derive(Debug)]
pub struct LoginOptions {
    pub config: IdentityConfig,
    pub email: String,
    pub password: SecretString,
}

impl LoginOptions {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API key, email or password is missing.
    pub fn parse(matches: &ArgMatches, request_timeout: Option<Duration>) -> Result<Self> {
        let config = IdentityConfig {
            identity_url: required(matches, ARG_IDENTITY_URL)?,
            token_url: required(matches, ARG_TOKEN_URL)?,
            api_key: SecretString::from(required(matches, ARG_API_KEY)?),
            request_timeout,
        };

        Ok(Self {
            config,
            email: required(matches, ARG_EMAIL)?,
            password: SecretString::from(required(matches, ARG_PASSWORD)?),
        })
    }
}

/// Where the session driving the redirect comes from.
#[derive(Debug)]
pub enum Source {
    /// A bearer token issued elsewhere.
    Static {
        session: Session,
        token: SecretString,
    },
    Login(LoginOptions),
}

impl Source {
    /// A `--token` selects the static mode; otherwise sign-in arguments are required.
    ///
    /// # Errors
    /// Returns an error if neither mode is fully configured.
    pub fn parse(matches: &ArgMatches, request_timeout: Option<Duration>) -> Result<Self> {
        if let Some(token) = get_non_empty(matches, ARG_TOKEN) {
            let identity_id = get_non_empty(matches, ARG_IDENTITY_ID)
                .unwrap_or_else(|| DEFAULT_STATIC_IDENTITY.to_string());
            let mut session = Session::new(identity_id);
            session.email = get_non_empty(matches, ARG_EMAIL);
            session.display_name = get_non_empty(matches, ARG_DISPLAY_NAME);

            return Ok(Self::Static {
                session,
                token: SecretString::from(token),
            });
        }

        LoginOptions::parse(matches, request_timeout).map(Self::Login)
    }
}

/// Arguments for talking to the identity provider.
#[must_use]
pub fn with_provider_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity provider accounts API base URL")
                .env("PORTALGATE_IDENTITY_URL")
                .default_value(DEFAULT_IDENTITY_URL),
        )
        .arg(
            Arg::new(ARG_TOKEN_URL)
                .long(ARG_TOKEN_URL)
                .help("Identity provider secure token API base URL")
                .env("PORTALGATE_TOKEN_URL")
                .default_value(DEFAULT_TOKEN_URL),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Identity provider API key")
                .env("PORTALGATE_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long(ARG_EMAIL)
                .help("Account email")
                .env("PORTALGATE_EMAIL"),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("Account password")
                .env("PORTALGATE_PASSWORD")
                .hide_env_values(true),
        )
}

/// Arguments for the static-token mode.
#[must_use]
pub fn with_static_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN)
                .long(ARG_TOKEN)
                .help("Bearer token issued by the identity provider; skips sign-in")
                .env("PORTALGATE_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_ID)
                .long(ARG_IDENTITY_ID)
                .help("Identity id reported for the static token")
                .env("PORTALGATE_IDENTITY_ID")
                .requires(ARG_TOKEN),
        )
        .arg(
            Arg::new(ARG_DISPLAY_NAME)
                .long(ARG_DISPLAY_NAME)
                .help("Display name used to seed the profile upsert")
                .env("PORTALGATE_DISPLAY_NAME")
                .requires(ARG_TOKEN),
        )
}
