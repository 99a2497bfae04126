//! Session-state stream shared by identity providers. A [`SessionHub`] holds the
//! latest determined state and fans every change out to subscribers in order,
//! without debouncing. Subscribers that fall behind the bounded channel are
//! resynced to the latest state rather than replaying stale emissions.

use super::Session;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Emissions buffered per subscriber before it is considered lagging.
const SESSION_CHANNEL_CAPACITY: usize = 16;

/// `None` until the provider has determined whether anyone is signed in.
type Snapshot = Option<Option<Session>>;

struct HubInner {
    current: Mutex<Snapshot>,
    sender: broadcast::Sender<Option<Session>>,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Publisher side of the session stream, owned by an identity provider.
#[derive(Clone)]
pub struct SessionHub {
    inner: Arc<HubInner>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    /// Creates a hub whose state is not determined yet.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(HubInner {
                current: Mutex::new(None),
                sender,
            }),
        }
    }

    /// Creates a hub that already knows its state.
    #[must_use]
    pub fn determined(state: Option<Session>) -> Self {
        let hub = Self::new();
        *hub.inner.lock() = Some(state);
        hub
    }

    /// Publishes a new session state to every subscriber.
    pub fn publish(&self, state: Option<Session>) {
        let mut current = self.inner.lock();
        debug!(
            signed_in = state.is_some(),
            subscribers = self.inner.sender.receiver_count(),
            "session state changed"
        );
        *current = Some(state.clone());
        let _ = self.inner.sender.send(state);
    }

    /// Latest determined state, `None` if the provider has not reported yet.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.inner.lock().clone()
    }

    /// Current session if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.current().flatten()
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        let current = self.inner.lock();
        let receiver = self.inner.sender.subscribe();
        SessionSubscription {
            pending: current.clone(),
            receiver,
            hub: Arc::downgrade(&self.inner),
        }
    }
}

/// Subscriber side of the session stream. Dropping it unsubscribes.
pub struct SessionSubscription {
    pending: Snapshot,
    receiver: broadcast::Receiver<Option<Session>>,
    hub: Weak<HubInner>,
}

impl SessionSubscription {
    /// Waits for the next session state. Returns `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session subscriber lagged, resyncing to latest state");
                    let hub = self.hub.upgrade()?;
                    let current = hub.lock();
                    self.receiver = hub.sender.subscribe();
                    if let Some(state) = current.clone() {
                        return Some(state);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Stops listening to the provider.
    pub fn dispose(self) {
        debug!("session subscription disposed");
    }
}
