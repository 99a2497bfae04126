//! # Portalgate (Session Sync & Role Routing)
//!
//! `portalgate` is the session layer of the account portal. It bridges an
//! external identity provider's session stream with the backend-owned user
//! profile and decides which application surface a signed-in identity may reach.
//!
//! ## Flow
//!
//! 1. **Session:** The identity provider publishes session changes through a
//!    [`identity::SessionHub`]. `None` means signed out.
//! 2. **Sync:** For every new session the [`profile::ProfileSynchronizer`] upserts
//!    the profile (`POST /api/users/sync`) and then fetches the canonical record
//!    (`GET /api/users/profile`). Both calls go through the [`api::ApiGateway`],
//!    which attaches a fresh bearer token and normalizes every response into the
//!    `{success, data, error, message, timestamp}` envelope.
//! 3. **Resolve:** [`access::resolve`] maps the profile to a surface (admin, owner,
//!    company or default) or to the terminal suspended state.
//! 4. **Redirect:** The [`redirect::RedirectController`] drives the whole sequence
//!    as a state machine and discards results that belong to a superseded session.
//!
//! The backend remains the authority for access control; routing decisions here
//! are UX only.

pub mod access;
pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod identity;
pub mod profile;
pub mod redirect;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
