//! Login account model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Leader,
    AdminInbound,
    AdminInventory,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Supervisor,
        Role::Leader,
        Role::AdminInbound,
        Role::AdminInventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Leader => "leader",
            Role::AdminInbound => "admin_inbound",
            Role::AdminInventory => "admin_inventory",
        }
    }

    /// Supervisors and leaders manage other accounts
    pub fn is_super(&self) -> bool {
        matches!(self, Role::Supervisor | Role::Leader)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role string outside the known set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// Public user representation (no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("leader".parse::<Role>(), Ok(Role::Leader));
        assert_eq!("admin_inbound".parse::<Role>(), Ok(Role::AdminInbound));
        assert_eq!(
            "admin".parse::<Role>(),
            Err(UnknownRole("admin".to_string()))
        );
    }

    #[test]
    fn test_role_serde_matches_as_str() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_super_roles() {
        assert!(Role::Supervisor.is_super());
        assert!(Role::Leader.is_super());
        assert!(!Role::AdminInbound.is_super());
        assert!(!Role::AdminInventory.is_super());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 1,
            username: "supervisor".into(),
            password_hash: "$argon2id$secret".into(),
            role: "supervisor".into(),
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(user.role(), Some(Role::Supervisor));
    }
}
