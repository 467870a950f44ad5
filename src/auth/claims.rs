use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Roles known to the authorization layer. See [`Role::satisfies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Author,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Author => "author",
            Role::Admin => "admin",
        }
    }

    /// Whether a subject holding `self` may enter a route that requires `required`.
    ///
    /// Exact match, or `Admin`, which satisfies every requirement. `Author`
    /// does not imply `User`: only the admin bypass crosses roles.
    pub fn satisfies(&self, required: Role) -> bool {
        *self == required || *self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    // Case-sensitive on purpose: "Admin" is not "admin".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "author" => Ok(Role::Author),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Identity and authorization facts carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub user_id: i64,
    pub email: String,
    pub username: String,
    /// Raw role string. Kept verbatim so unknown roles survive decoding;
    /// absent when the token carries no string role.
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    /// Parsed role, if present and one of the known roles.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(role) => Some(role),
        _ => None,
    })
}
