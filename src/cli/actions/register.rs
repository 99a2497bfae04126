use crate::{
    cli::commands::identity::LoginOptions,
    identity::{rest::RestIdentityProvider, IdentityProvider},
};
use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub login: LoginOptions,
    pub json: bool,
}

/// Execute the register action.
/// # Errors
/// Returns an error if the provider rejects the registration.
pub async fn execute(args: Args) -> Result<()> {
    let provider = RestIdentityProvider::new(args.login.config)?;
    let session = provider
        .register_user(&args.login.email, &args.login.password)
        .await
        .context("registration failed")?;
    info!(identity_id = %session.identity_id, "account registered");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        println!(
            "registered {} as {}",
            session.email.as_deref().unwrap_or(&args.login.email),
            session.identity_id
        );
    }

    Ok(())
}
