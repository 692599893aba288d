//! Request/response DTOs shared between server and frontend

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

/// Current user response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

// =============================================================================
// User management DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// `current_password` is required only when changing one's own password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// Plain acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Bulk resource DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Full replace of one table. Rows stay raw JSON until the engine decodes
/// them against the entity schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub synced: u64,
    pub total: u64,
    /// Rows visible before the replace
    pub replaced: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_request_defaults() {
        let req: SyncRequest = serde_json::from_str(r#"{"data": [{"sku": "A"}]}"#).unwrap();
        assert_eq!(req.data.len(), 1);
        assert!(!req.confirm);

        let req: SyncRequest = serde_json::from_str("{}").unwrap();
        assert!(req.data.is_empty());
    }

    #[test]
    fn test_change_password_current_optional() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"new_password": "n3w-pass"}"#).unwrap();
        assert!(req.current_password.is_none());
        assert_eq!(req.new_password, "n3w-pass");
    }
}
