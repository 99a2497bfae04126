use crate::{
    api::ApiGateway,
    cli::commands::identity::Source,
    config::PortalConfig,
    identity::{memory::InMemoryIdentity, rest::RestIdentityProvider, IdentityProvider},
    profile::ProfileSynchronizer,
    redirect::{RedirectController, RedirectHandle, RedirectState, RedirectView},
};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub portal: PortalConfig,
    pub source: Source,
    pub retries: u32,
    pub json: bool,
}

/// Execute the redirect action.
/// # Errors
/// Returns an error if sign-in fails, or the flow ends signed out or with a failed sync.
pub async fn execute(args: Args) -> Result<()> {
    let Args {
        portal,
        source,
        retries,
        json,
    } = args;

    match source {
        Source::Static { session, token } => {
            let identity = Arc::new(InMemoryIdentity::with_session(session, token));
            run(identity, &portal, retries, json).await
        }
        Source::Login(login) => {
            let identity = Arc::new(RestIdentityProvider::new(login.config)?);
            identity
                .sign_in(&login.email, &login.password)
                .await
                .context("sign-in failed")?;
            run(identity, &portal, retries, json).await
        }
    }
}

/// Reads transitions until the controller settles.
async fn next_settled(handle: &mut RedirectHandle) -> Option<RedirectState> {
    while let Some(state) = handle.next_transition().await {
        debug!(state = %state, "redirect state");
        if state.is_settled() {
            return Some(state);
        }
    }
    None
}

async fn run<P>(identity: Arc<P>, portal: &PortalConfig, retries: u32, json: bool) -> Result<()>
where
    P: IdentityProvider + 'static,
{
    let gateway = Arc::new(ApiGateway::new(portal, identity.clone())?);
    let synchronizer = Arc::new(ProfileSynchronizer::new(gateway));
    let mut handle = RedirectController::new(identity, synchronizer).spawn();

    let mut attempts = 0;
    let state = loop {
        let state = next_settled(&mut handle)
            .await
            .ok_or_else(|| anyhow!("redirect controller stopped before settling"))?;

        match state {
            RedirectState::SyncFailed { ref message } if attempts < retries => {
                attempts += 1;
                warn!(attempt = attempts, "profile sync failed, retrying: {message}");
                handle.retry();
            }
            state => break state,
        }
    };
    handle.shutdown().await;

    let view = state.view(&portal.routes);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{view}");
    }

    match view {
        RedirectView::Error { message, .. } => Err(anyhow!("profile sync failed: {message}")),
        RedirectView::SignIn { .. } => Err(anyhow!("no active session")),
        _ => Ok(()),
    }
}
