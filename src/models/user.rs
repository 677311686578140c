//! User model and JWT claims
//!
//! Accounts are owned by the main application; this service only reads the
//! stored role attribute and verifies bearer tokens issued elsewhere.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::AppError, models::visit::Role};

/// Internal row structure for user role lookups
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRoleRow {
    pub id: i32,
    pub role: Option<String>,
    pub is_admin: Option<bool>,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    /// Role the issuer embedded in the token, if any
    pub role: Option<Role>,
    /// Auth-provider admin flag
    #[serde(default)]
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Check if user is admin (token role or provider admin flag)
    pub fn is_admin(&self) -> bool {
        self.admin || self.role == Some(Role::Admin)
    }

    /// Staff may read aggregates: admins and editors
    pub fn is_staff(&self) -> bool {
        self.is_admin() || self.role == Some(Role::Editor)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Require staff privileges (admin or editor)
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Staff privileges required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(role: Option<Role>, admin: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "test".to_string(),
            user_id: 7,
            role,
            admin,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn token_round_trip() {
        let original = claims(Some(Role::Editor), false);
        let token = original.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.role, Some(Role::Editor));
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = claims(None, false).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn admin_flag_grants_admin() {
        assert!(claims(None, true).is_admin());
        assert!(claims(Some(Role::Admin), false).is_admin());
        assert!(!claims(Some(Role::Reader), false).is_admin());
    }

    #[test]
    fn staff_includes_editors_but_not_readers() {
        assert!(claims(Some(Role::Editor), false).is_staff());
        assert!(claims(Some(Role::Admin), false).is_staff());
        assert!(claims(Some(Role::Reader), false).require_staff().is_err());
    }
}
