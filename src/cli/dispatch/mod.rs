//! Maps validated CLI matches to the action the binary executes.

use crate::cli::actions::{redirect, register, Action};
use crate::cli::commands::{self, backend, identity, CMD_REDIRECT, CMD_REGISTER};
use anyhow::{bail, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let request_timeout = commands::request_timeout(matches);

    match matches.subcommand() {
        Some((CMD_REDIRECT, sub)) => {
            let portal = backend::Options::parse(sub)?.into_config(request_timeout);
            let source = identity::Source::parse(sub, request_timeout)?;

            Ok(Action::Redirect(redirect::Args {
                portal,
                source,
                retries: sub.get_one::<u32>(commands::ARG_RETRIES).copied().unwrap_or(0),
                json: sub.get_flag(commands::ARG_JSON),
            }))
        }
        Some((CMD_REGISTER, sub)) => Ok(Action::Register(register::Args {
            login: identity::LoginOptions::parse(sub, request_timeout)?,
            json: sub.get_flag(commands::ARG_JSON),
        })),
        Some((name, _)) => bail!("unknown command: {name}"),
        None => bail!("missing command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::identity::Source;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    const CLEARED: [(&str, Option<&str>); 5] = [
        ("PORTALGATE_API_KEY", None),
        ("PORTALGATE_EMAIL", None),
        ("PORTALGATE_PASSWORD", None),
        ("PORTALGATE_TOKEN", None),
        ("PORTALGATE_REQUEST_TIMEOUT", None),
    ];

    #[test]
    fn static_token_redirect() {
        temp_env::with_vars(CLEARED, || {
            let matches = commands::new().get_matches_from(vec![
                "portalgate",
                "redirect",
                "--token",
                "tok-1",
                "--identity-id",
                "uid-7",
                "--display-name",
                "Ada Lovelace",
                "--owner-route",
                "/owners/home",
                "--request-timeout",
                "3",
                "--json",
            ]);

            let Ok(Action::Redirect(args)) = handler(&matches) else {
                panic!("expected a redirect action");
            };
            assert_eq!(args.portal.request_timeout, Some(Duration::from_secs(3)));
            assert_eq!(args.portal.routes.owner, "/owners/home");
            assert_eq!(args.portal.routes.admin, "/admin/dashboard");
            assert!(args.json);

            let Source::Static { session, token } = args.source else {
                panic!("expected the static token source");
            };
            assert_eq!(session.identity_id, "uid-7");
            assert_eq!(session.display_name.as_deref(), Some("Ada Lovelace"));
            assert_eq!(token.expose_secret(), "tok-1");
        });
    }

    #[test]
    fn sign_in_requires_api_key() {
        temp_env::with_vars(CLEARED, || {
            let matches = commands::new().get_matches_from(vec![
                "portalgate",
                "redirect",
                "--email",
                "ada@acme.test",
                "--password",
                "secret-pw",
            ]);

            let err = handler(&matches).err().map(|err| err.to_string());
            assert_eq!(err.as_deref(), Some("missing required argument: --api-key"));
        });
    }

    #[test]
    fn register_from_env() {
        temp_env::with_vars(
            [
                ("PORTALGATE_API_KEY", Some("key-1")),
                ("PORTALGATE_EMAIL", Some("ada@acme.test")),
                ("PORTALGATE_PASSWORD", Some("secret-pw")),
                ("PORTALGATE_TOKEN", None),
                ("PORTALGATE_REQUEST_TIMEOUT", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["portalgate", "register"]);
                let Ok(Action::Register(args)) = handler(&matches) else {
                    panic!("expected a register action");
                };
                assert_eq!(args.login.email, "ada@acme.test");
                assert_eq!(args.login.config.api_key.expose_secret(), "key-1");
                assert_eq!(args.login.config.request_timeout, Some(Duration::from_secs(10)));
            },
        );
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        temp_env::with_vars(CLEARED, || {
            let matches = commands::new().get_matches_from(vec![
                "portalgate",
                "redirect",
                "--token",
                "tok-1",
                "--api-url",
                "not a url",
            ]);
            assert!(handler(&matches).is_err());
        });
    }
}
