//! Identity types carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
///
/// Tokens are issued by the identity provider; this service only validates
/// them and reads the acting user out of `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Display name of the user, used for audit listings.
    #[serde(default)]
    pub name: String,
    /// Whether the user is a staff administrator.
    #[serde(default)]
    pub staff: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, name: &str, staff: bool, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            name: name.to_string(),
            staff,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns true if the token belongs to a staff administrator.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.staff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(15);
        let claims = Claims::new(user_id, "Ana", false, expires_at);

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.name, "Ana");
        assert!(!claims.is_staff());
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(claims.iat <= claims.exp);
    }

    #[test]
    fn test_claims_deserialize_without_optional_fields() {
        let user_id = Uuid::new_v4();
        let json = format!(r#"{{"sub":"{user_id}","iat":1,"exp":2}}"#);
        let claims: Claims = serde_json::from_str(&json).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert!(claims.name.is_empty());
        assert!(!claims.staff);
    }
}
