//! Upsert-then-fetch synchronization of the backend profile for one session.
//!
//! The upsert (`POST /api/users/sync`) is idempotent and best effort: if it
//! fails the failure is logged and the fetch still runs, since the record may
//! already exist. The fetch (`GET /api/users/profile`) decides the outcome.

use super::Profile;
use crate::{
    api::{ApiError, ApiGateway, ApiResponse},
    identity::Session,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

pub const SYNC_ENDPOINT: &str = "/api/users/sync";
pub const PROFILE_ENDPOINT: &str = "/api/users/profile";

const PROFILE_UNAVAILABLE: &str = "Failed to load user profile";

/// Best-effort upsert payload derived from the identity session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SyncRequest {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let (first_name, last_name) = session.name_parts();
        Self {
            first_name,
            last_name,
            phone: None,
        }
    }
}

/// Profile could not be obtained. The message is suitable for display.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyncError {
    pub message: String,
    pub status: Option<u16>,
}

impl SyncError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Synced(Profile),
    SyncFailed(SyncError),
}

#[derive(Debug, Default)]
struct Tracked {
    latest_run: u64,
    state: SyncState,
}

pub struct ProfileSynchronizer {
    gateway: Arc<ApiGateway>,
    tracked: Mutex<Tracked>,
}

impl ProfileSynchronizer {
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            tracked: Mutex::new(Tracked::default()),
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outcome of the most recently started run. A run dropped before it
    /// finished leaves `Idle` behind.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.lock().state.clone()
    }

    fn begin(&self) -> SyncRun<'_> {
        let mut tracked = self.lock();
        tracked.latest_run += 1;
        tracked.state = SyncState::Syncing;
        SyncRun {
            owner: self,
            run: tracked.latest_run,
            settled: false,
        }
    }

    /// Only the latest run may write; returns whether `state` was recorded.
    fn record(&self, run: u64, state: SyncState) -> bool {
        let mut tracked = self.lock();
        if tracked.latest_run != run {
            return false;
        }
        tracked.state = state;
        true
    }

    /// Upserts the backend record for `session`, then fetches its profile.
    ///
    /// # Errors
    /// Returns `SyncError` carrying the gateway's message if the profile fetch
    /// fails or the response holds no usable profile.
    #[instrument(skip_all, fields(identity_id = %session.identity_id))]
    pub async fn sync(&self, session: &Session) -> Result<Profile, SyncError> {
        let run = self.begin();

        let payload = serde_json::to_value(SyncRequest::from_session(session))
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        match self.gateway.post(SYNC_ENDPOINT, payload).await {
            Ok(_) => debug!("profile upserted"),
            Err(err) => warn!("profile upsert failed, fetching anyway: {err}"),
        }

        let result = match self.gateway.get(PROFILE_ENDPOINT).await {
            Ok(envelope) => extract_profile(envelope),
            Err(err) => Err(SyncError::from(err)),
        };

        match &result {
            Ok(profile) => {
                debug!(role = %profile.role, active = profile.is_active, "profile loaded");
                run.settle(SyncState::Synced(profile.clone()));
            }
            Err(err) => {
                error!("profile sync failed: {err}");
                run.settle(SyncState::SyncFailed(err.clone()));
            }
        }

        result
    }
}

/// One in-flight `sync` call. Dropping it unsettled resets the state to `Idle`.
struct SyncRun<'a> {
    owner: &'a ProfileSynchronizer,
    run: u64,
    settled: bool,
}

impl SyncRun<'_> {
    fn settle(mut self, state: SyncState) {
        if !self.owner.record(self.run, state) {
            debug!(run = self.run, "newer sync started, outcome not recorded");
        }
        self.settled = true;
    }
}

impl Drop for SyncRun<'_> {
    fn drop(&mut self) {
        if !self.settled && self.owner.record(self.run, SyncState::Idle) {
            debug!(run = self.run, "profile sync abandoned");
        }
    }
}

/// Reads the profile from `data.user`, falling back to `data` itself.
fn extract_profile(envelope: ApiResponse) -> Result<Profile, SyncError> {
    let data: Value = envelope.decode().map_err(|err| match err {
        ApiError::Parse(_) => SyncError::new(PROFILE_UNAVAILABLE),
        other => SyncError::from(other),
    })?;

    let record = match data.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => data,
    };

    serde_json::from_value(record)
        .map_err(|err| SyncError::new(format!("{PROFILE_UNAVAILABLE}: {err}")))
}
