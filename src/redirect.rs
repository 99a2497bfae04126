//! Redirect state machine. One controller task per portal entry point folds
//! session emissions, retry commands and synchronization outcomes into a
//! single observable [`RedirectState`].
//!
//! Every session emission starts a new generation. Work spawned for an older
//! generation is cancelled through its [`CancellationToken`] and any outcome it
//! still delivers is discarded, so a profile is only ever resolved for the
//! session that is current when it arrives.

use crate::{
    access::{resolve, SurfaceRoutes, Target},
    identity::{IdentityProvider, Session, SessionSubscription},
    profile::{Profile, ProfileSynchronizer, SyncError},
};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

const TRANSITION_CAPACITY: usize = 64;

pub const LOADING_TITLE: &str = "Checking authentication...";
pub const LOADING_DETAIL: &str = "Please wait while we verify your account";
pub const SUSPENDED_TITLE: &str = "Account Suspended";
pub const SUSPENDED_NOTICE: &str =
    "Your account has been suspended. Please contact your administrator for assistance.";
const FALLBACK_ERROR: &str = "Failed to load profile";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectState {
    Unauthenticated,
    Authenticating,
    ProfileSyncing,
    SyncFailed { message: String },
    Resolved(Target),
}

impl RedirectState {
    /// `Resolved(Suspended)` accepts no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(Target::Suspended))
    }

    /// True once the controller is waiting on the user or the provider rather
    /// than on in-flight work.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::SyncFailed { .. } | Self::Resolved(_)
        )
    }

    #[must_use]
    pub fn view(&self, routes: &SurfaceRoutes) -> RedirectView {
        match self {
            Self::Authenticating | Self::ProfileSyncing => RedirectView::Loading {
                title: LOADING_TITLE.to_string(),
                detail: LOADING_DETAIL.to_string(),
            },
            Self::Unauthenticated => RedirectView::SignIn {
                path: routes.sign_in.clone(),
            },
            Self::SyncFailed { message } => RedirectView::Error {
                message: if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message.clone()
                },
                retry: true,
            },
            Self::Resolved(Target::Suspended) => RedirectView::Suspended {
                title: SUSPENDED_TITLE.to_string(),
                notice: SUSPENDED_NOTICE.to_string(),
            },
            Self::Resolved(Target::Surface(surface)) => RedirectView::Navigate {
                path: routes.path(*surface).to_string(),
            },
        }
    }
}

impl fmt::Display for RedirectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::ProfileSyncing => f.write_str("profile-syncing"),
            Self::SyncFailed { message } => write!(f, "sync-failed: {message}"),
            Self::Resolved(Target::Suspended) => f.write_str("resolved: suspended"),
            Self::Resolved(Target::Surface(surface)) => write!(f, "resolved: {surface}"),
        }
    }
}

/// What the entry point renders for a state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RedirectView {
    Loading { title: String, detail: String },
    Error { message: String, retry: bool },
    Suspended { title: String, notice: String },
    Navigate { path: String },
    SignIn { path: String },
}

impl fmt::Display for RedirectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { title, detail } => write!(f, "{title} {detail}"),
            Self::Error { message, .. } => write!(f, "{message} (retry available)"),
            Self::Suspended { title, notice } => write!(f, "{title}: {notice}"),
            Self::Navigate { path } => write!(f, "navigate to {path}"),
            Self::SignIn { path } => write!(f, "sign in at {path}"),
        }
    }
}

#[derive(Debug)]
enum Command {
    Retry,
}

pub struct RedirectController {
    identity: Arc<dyn IdentityProvider>,
    synchronizer: Arc<ProfileSynchronizer>,
    state: watch::Sender<RedirectState>,
    transitions: broadcast::Sender<RedirectState>,
}

impl RedirectController {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, synchronizer: Arc<ProfileSynchronizer>) -> Self {
        let (state, _) = watch::channel(RedirectState::Unauthenticated);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            identity,
            synchronizer,
            state,
            transitions,
        }
    }

    #[must_use]
    pub fn state(&self) -> RedirectState {
        self.state.borrow().clone()
    }

    /// Subscribes to the identity provider and starts the controller task.
    /// The returned handle observes every transition from `Authenticating` on.
    #[must_use]
    pub fn spawn(self) -> RedirectHandle {
        let state_rx = self.state.subscribe();
        let transitions_rx = self.transitions.subscribe();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let subscription = self.identity.subscribe();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let mut worker = Worker {
            synchronizer: self.synchronizer,
            state: self.state,
            transitions: self.transitions,
            done: done_tx,
            shutdown: shutdown.clone(),
            generation: 0,
            session: None,
            in_flight: None,
        };
        worker.publish(RedirectState::Authenticating);

        let task = tokio::spawn(
            worker
                .run(subscription, commands_rx, done_rx)
                .instrument(info_span!("redirect")),
        );

        RedirectHandle {
            state: state_rx,
            transitions: transitions_rx,
            commands: commands_tx,
            shutdown,
            task: Some(task),
        }
    }
}

type Outcome = (u64, Result<Profile, SyncError>);

struct Worker {
    synchronizer: Arc<ProfileSynchronizer>,
    state: watch::Sender<RedirectState>,
    transitions: broadcast::Sender<RedirectState>,
    done: mpsc::UnboundedSender<Outcome>,
    shutdown: CancellationToken,
    generation: u64,
    session: Option<Session>,
    in_flight: Option<CancellationToken>,
}

impl Worker {
    fn current(&self) -> RedirectState {
        self.state.borrow().clone()
    }

    fn publish(&self, next: RedirectState) {
        debug!(state = %next, "redirect transition");
        self.state.send_replace(next.clone());
        let _ = self.transitions.send(next);
    }

    async fn run(
        mut self,
        mut subscription: SessionSubscription,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut done: mpsc::UnboundedReceiver<Outcome>,
    ) {
        let mut listening = true;

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                emission = subscription.next(), if listening => match emission {
                    Some(session) => self.on_session(session),
                    None => {
                        debug!("session stream closed");
                        listening = false;
                    }
                },
                Some(command) = commands.recv() => self.on_command(command),
                Some((generation, outcome)) = done.recv() => self.on_outcome(generation, outcome),
            }

            if self.current().is_terminal() {
                info!("account suspended, redirect flow stopped");
                break;
            }
        }

        self.cancel_in_flight();
        subscription.dispose();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn on_session(&mut self, session: Option<Session>) {
        self.generation += 1;
        self.cancel_in_flight();
        self.session.clone_from(&session);

        match session {
            Some(session) => self.start_sync(session),
            None => self.publish(RedirectState::Unauthenticated),
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Retry => {
                let failed = matches!(self.current(), RedirectState::SyncFailed { .. });
                match self.session.clone() {
                    Some(session) if failed => {
                        self.generation += 1;
                        self.start_sync(session);
                    }
                    _ => debug!("retry ignored outside of a failed sync"),
                }
            }
        }
    }

    fn start_sync(&mut self, session: Session) {
        self.publish(RedirectState::ProfileSyncing);

        let token = self.shutdown.child_token();
        self.in_flight = Some(token.clone());

        let generation = self.generation;
        let synchronizer = Arc::clone(&self.synchronizer);
        let done = self.done.clone();
        let span = info_span!("profile_sync", generation, identity_id = %session.identity_id);
        tokio::spawn(
            async move {
                tokio::select! {
                    () = token.cancelled() => debug!("profile sync cancelled"),
                    outcome = synchronizer.sync(&session) => {
                        let _ = done.send((generation, outcome));
                    }
                }
            }
            .instrument(span),
        );
    }

    fn on_outcome(&mut self, generation: u64, outcome: Result<Profile, SyncError>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale profile");
            return;
        }
        self.in_flight = None;

        match outcome {
            Ok(profile) => {
                if !profile.role.is_known() {
                    warn!(role = %profile.role, "unrecognized role, using the default surface");
                }
                self.publish(RedirectState::Resolved(resolve(&profile)));
            }
            Err(err) => self.publish(RedirectState::SyncFailed {
                message: err.message,
            }),
        }
    }
}

/// Handle to a running controller. Dropping it stops the controller.
pub struct RedirectHandle {
    state: watch::Receiver<RedirectState>,
    transitions: broadcast::Receiver<RedirectState>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RedirectHandle {
    #[must_use]
    pub fn state(&self) -> RedirectState {
        self.state.borrow().clone()
    }

    /// Watch channel carrying the latest state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<RedirectState> {
        self.state.clone()
    }

    /// Next state on the transition stream, in publication order. `None` once
    /// the controller has stopped and every published state was read.
    pub async fn next_transition(&mut self) -> Option<RedirectState> {
        loop {
            match self.transitions.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "redirect transition stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits until the controller settles and returns that state. Returns
    /// immediately if it already has.
    pub async fn settled(&mut self) -> RedirectState {
        if let Ok(state) = self.state.wait_for(RedirectState::is_settled).await {
            return state.clone();
        }
        self.state.borrow().clone()
    }

    /// Re-runs profile synchronization for the current session. Only honored
    /// while the controller is in `SyncFailed`.
    pub fn retry(&self) {
        if self.commands.send(Command::Retry).is_err() {
            debug!("retry after the controller stopped");
        }
    }

    /// Disposes the session subscription, cancels in-flight work and waits for
    /// the controller task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!("redirect controller task failed: {err}");
            }
        }
    }
}

impl Drop for RedirectHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
