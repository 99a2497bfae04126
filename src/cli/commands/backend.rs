use crate::{
    access::{self, SurfaceRoutes},
    config::{normalize_value, PortalConfig, DEFAULT_API_BASE_URL},
};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use url::Url;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_ADMIN_ROUTE: &str = "admin-route";
pub const ARG_OWNER_ROUTE: &str = "owner-route";
pub const ARG_COMPANY_ROUTE: &str = "company-route";
pub const ARG_DEFAULT_ROUTE: &str = "default-route";
pub const ARG_SIGN_IN_ROUTE: &str = "sign-in-route";

#[derive(Debug)]
pub struct Options {
    pub api_base_url: String,
    pub routes: SurfaceRoutes,
}

impl Options {
    /// Parse backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is missing or invalid.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .and_then(|value| normalize_value(value))
        };

        let api_base_url = get_non_empty(ARG_API_URL)
            .with_context(|| format!("missing required argument: --{ARG_API_URL}"))?;
        Url::parse(&api_base_url).with_context(|| format!("invalid --{ARG_API_URL}: {api_base_url}"))?;

        let defaults = SurfaceRoutes::default();
        let routes = SurfaceRoutes {
            admin: get_non_empty(ARG_ADMIN_ROUTE).unwrap_or(defaults.admin),
            owner: get_non_empty(ARG_OWNER_ROUTE).unwrap_or(defaults.owner),
            company: get_non_empty(ARG_COMPANY_ROUTE).unwrap_or(defaults.company),
            default: get_non_empty(ARG_DEFAULT_ROUTE).unwrap_or(defaults.default),
            sign_in: get_non_empty(ARG_SIGN_IN_ROUTE).unwrap_or(defaults.sign_in),
        };

        Ok(Self {
            api_base_url,
            routes,
        })
    }

    #[must_use]
    pub fn into_config(self, request_timeout: Option<Duration>) -> PortalConfig {
        PortalConfig::new(self.api_base_url)
            .with_timeout(request_timeout)
            .with_routes(self.routes)
    }
}

fn route_arg(id: &'static str, help: &'static str, env: &'static str, default: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .env(env)
        .default_value(default)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Portal backend base URL")
                .env("PORTALGATE_API_URL")
                .default_value(DEFAULT_API_BASE_URL),
        )
        .arg(route_arg(
            ARG_ADMIN_ROUTE,
            "Path of the platform admin surface",
            "PORTALGATE_ADMIN_ROUTE",
            access::ADMIN_ROUTE,
        ))
        .arg(route_arg(
            ARG_OWNER_ROUTE,
            "Path of the company owner surface",
            "PORTALGATE_OWNER_ROUTE",
            access::OWNER_ROUTE,
        ))
        .arg(route_arg(
            ARG_COMPANY_ROUTE,
            "Path of the company member surface",
            "PORTALGATE_COMPANY_ROUTE",
            access::COMPANY_ROUTE,
        ))
        .arg(route_arg(
            ARG_DEFAULT_ROUTE,
            "Path of the default dashboard",
            "PORTALGATE_DEFAULT_ROUTE",
            access::DEFAULT_ROUTE,
        ))
        .arg(route_arg(
            ARG_SIGN_IN_ROUTE,
            "Path of the sign-in page",
            "PORTALGATE_SIGN_IN_ROUTE",
            access::SIGN_IN_ROUTE,
        ))
}
