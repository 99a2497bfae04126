use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::fmt;

/// Portal role as issued by the backend. Unrecognized values are preserved in
/// `Other` instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    AccountUser,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::CompanyAdmin => "COMPANY_ADMIN",
            Self::AccountUser => "ACCOUNT_USER",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SUPER_ADMIN" => Self::SuperAdmin,
            "COMPANY_ADMIN" => Self::CompanyAdmin,
            "ACCOUNT_USER" => Self::AccountUser,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical profile record returned by `GET /api/users/profile`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

/// `null` reads as the type's default: no role, inactive.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(Number),
}

/// Backends that key users numerically send `id` as a number.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(id)) => id,
        Some(RawId::Number(id)) => id.to_string(),
        None => String::new(),
    })
}

impl Profile {
    /// Company the profile belongs to; an empty id counts as none.
    #[must_use]
    pub fn company(&self) -> Option<&str> {
        self.company_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_reads_camel_case() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "u1",
            "email": "ada@acme.test",
            "firstName": "Ada",
            "lastName": null,
            "role": "ACCOUNT_USER",
            "companyId": "acme",
            "isActive": true,
        }))
        .unwrap();
        assert_eq!(profile.role, Role::AccountUser);
        assert_eq!(profile.company(), Some("acme"));
        assert!(profile.is_active);
        assert_eq!(profile.last_name, None);
    }

    #[test]
    fn missing_fields_default_to_blocked() {
        let profile: Profile = serde_json::from_value(json!({"id": "u1"})).unwrap();
        assert!(!profile.is_active);
        assert_eq!(profile.role, Role::Other(String::new()));
        assert_eq!(profile.company(), None);
    }

    #[test]
    fn unknown_roles_are_preserved() {
        let profile: Profile =
            serde_json::from_value(json!({"id": "u1", "role": "AUDITOR", "isActive": true})).unwrap();
        assert_eq!(profile.role, Role::Other("AUDITOR".to_string()));
        assert!(!profile.role.is_known());
        assert_eq!(serde_json::to_value(&profile.role).unwrap(), json!("AUDITOR"));
        assert_eq!(serde_json::to_value(Role::CompanyAdmin).unwrap(), json!("COMPANY_ADMIN"));
    }

    #[test]
    fn null_activity_reads_as_suspended() {
        let profile: Profile =
            serde_json::from_value(json!({"id": "u1", "role": "SUPER_ADMIN", "isActive": null}))
                .unwrap();
        assert_eq!(profile.role, Role::SuperAdmin);
        assert!(!profile.is_active);
    }

    #[test]
    fn null_role_reads_as_unrecognized() {
        let profile: Profile =
            serde_json::from_value(json!({"id": "u1", "role": null, "isActive": true})).unwrap();
        assert_eq!(profile.role, Role::default());
        assert!(!profile.role.is_known());
        assert!(profile.is_active);
    }

    #[test]
    fn numeric_and_null_ids_are_accepted() {
        let profile: Profile =
            serde_json::from_value(json!({"id": 42, "role": "ACCOUNT_USER", "isActive": true}))
                .unwrap();
        assert_eq!(profile.id, "42");

        let profile: Profile = serde_json::from_value(json!({"id": null})).unwrap();
        assert_eq!(profile.id, "");
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(serde_json::from_value::<Profile>(json!({"role": "SUPER_ADMIN"})).is_err());
    }

    #[test]
    fn blank_company_id_counts_as_none() {
        let profile = Profile {
            company_id: Some("  ".to_string()),
            ..Profile::default()
        };
        assert_eq!(profile.company(), None);
    }
}
