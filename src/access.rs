//! Role resolution. [`resolve`] is a pure, total function of the profile; the
//! mapping from surfaces to navigable paths lives in [`SurfaceRoutes`] so it can
//! be configured without touching the rules.

use crate::profile::{Profile, Role};
use serde::Serialize;
use std::fmt;

/// Application area a signed-in user may enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Admin,
    Owner,
    Company,
    Default,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Company => "company",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Result of role resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Surface(Surface),
    Suspended,
}

/// Rules are evaluated in order; the first match wins.
#[must_use]
pub fn resolve(profile: &Profile) -> Target {
    if !profile.is_active {
        return Target::Suspended;
    }

    let surface = match profile.role {
        Role::SuperAdmin => Surface::Admin,
        Role::CompanyAdmin => Surface::Owner,
        Role::AccountUser if profile.company().is_some() => Surface::Company,
        _ => Surface::Default,
    };

    Target::Surface(surface)
}

pub const ADMIN_ROUTE: &str = "/admin/dashboard";
pub const OWNER_ROUTE: &str = "/owner/dashboard";
pub const COMPANY_ROUTE: &str = "/company/dashboard";
pub const DEFAULT_ROUTE: &str = "/dashboard";
pub const SIGN_IN_ROUTE: &str = "/login";

/// Paths rendered for each surface and for the sign-in page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceRoutes {
    pub admin: String,
    pub owner: String,
    pub company: String,
    pub default: String,
    pub sign_in: String,
}

impl Default for SurfaceRoutes {
    fn default() -> Self {
        Self {
            admin: ADMIN_ROUTE.to_string(),
            owner: OWNER_ROUTE.to_string(),
            company: COMPANY_ROUTE.to_string(),
            default: DEFAULT_ROUTE.to_string(),
            sign_in: SIGN_IN_ROUTE.to_string(),
        }
    }
}

impl SurfaceRoutes {
    #[must_use]
    pub fn path(&self, surface: Surface) -> &str {
        match surface {
            Surface::Admin => &self.admin,
            Surface::Owner => &self.owner,
            Surface::Company => &self.company,
            Surface::Default => &self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, is_active: bool, company_id: Option<&str>) -> Profile {
        Profile {
            id: "u1".to_string(),
            role,
            is_active,
            company_id: company_id.map(str::to_string),
            ..Profile::default()
        }
    }

    #[test]
    fn resolves_every_role_activity_and_company_combination() {
        let roles = [
            Role::SuperAdmin,
            Role::CompanyAdmin,
            Role::AccountUser,
            Role::Other("AUDITOR".to_string()),
            Role::default(),
        ];
        let companies = [None, Some(""), Some("acme")];

        for role in &roles {
            for company in companies {
                let inactive = profile(role.clone(), false, company);
                assert_eq!(resolve(&inactive), Target::Suspended, "{role} / {company:?}");

                let expected = match (role, company) {
                    (Role::SuperAdmin, _) => Surface::Admin,
                    (Role::CompanyAdmin, _) => Surface::Owner,
                    (Role::AccountUser, Some("acme")) => Surface::Company,
                    _ => Surface::Default,
                };
                let active = profile(role.clone(), true, company);
                assert_eq!(
                    resolve(&active),
                    Target::Surface(expected),
                    "{role} / {company:?}"
                );
            }
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let user = profile(Role::AccountUser, true, Some("acme"));
        assert_eq!(resolve(&user), resolve(&user.clone()));
    }

    #[test]
    fn default_routes() {
        let routes = SurfaceRoutes::default();
        assert_eq!(routes.path(Surface::Admin), "/admin/dashboard");
        assert_eq!(routes.path(Surface::Owner), "/owner/dashboard");
        assert_eq!(routes.path(Surface::Company), "/company/dashboard");
        assert_eq!(routes.path(Surface::Default), "/dashboard");
        assert_eq!(routes.sign_in, "/login");
    }
}
