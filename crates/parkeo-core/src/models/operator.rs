//! Operator model
//!
//! The engine only cares about a verified operator identity; how the
//! credential is checked lives in parkeo-auth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    /// Unique identifier
    pub id: i32,

    /// Login name
    pub username: String,

    /// Argon2 hash in PHC string format, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Contact email
    pub email: Option<String>,

    /// Disabled operators cannot log in
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_password_hash() {
        let operator = Operator {
            id: 1,
            username: "gate1".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            full_name: "Gate One".to_string(),
            email: None,
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&operator).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("gate1"));
    }
}
