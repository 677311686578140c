//! Visitor identity resolution
//!
//! Maps an incoming request (optional verified claims, optional device
//! token) to the (identity, role) pair the visit tracker deduplicates on.
//! Authentication itself happens upstream; this module only interprets its
//! result.

use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};

use crate::{
    models::{
        user::{UserClaims, UserRoleRow},
        visit::{Role, VisitIdentity},
    },
    repository::RoleSource,
};

/// Length of server-generated anonymous device tokens
const DEVICE_TOKEN_LEN: usize = 32;

/// Get-or-create semantics for the opaque per-device token.
///
/// The client persists the token locally and replays it on every visit; a
/// caller that lost (or never had) one gets a fresh token. A device that
/// fails to persist the token is simply counted as a new anonymous visitor
/// next time, which is an accepted approximation.
pub trait DeviceTokenProvider: Send + Sync {
    fn get_or_create(&self, existing: Option<String>) -> String;
}

/// Production token provider: random alphanumeric tokens
pub struct RandomTokenProvider;

impl DeviceTokenProvider for RandomTokenProvider {
    fn get_or_create(&self, existing: Option<String>) -> String {
        match existing {
            Some(token) if !token.is_empty() => token,
            _ => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(DEVICE_TOKEN_LEN)
                .map(char::from)
                .collect(),
        }
    }
}

/// A fully resolved visitor, ready to be recorded
#[derive(Debug, Clone)]
pub struct ResolvedVisitor {
    pub identity: VisitIdentity,
    pub role: Role,
    /// Canonical device token to hand back to the client
    pub device_token: String,
}

/// Resolves visitors from claims and device tokens
#[derive(Clone)]
pub struct IdentityResolver {
    roles: Arc<dyn RoleSource>,
    tokens: Arc<dyn DeviceTokenProvider>,
}

impl IdentityResolver {
    pub fn new(roles: Arc<dyn RoleSource>, tokens: Arc<dyn DeviceTokenProvider>) -> Self {
        Self { roles, tokens }
    }

    /// Resolve the visiting identity and role for a request.
    ///
    /// Unauthenticated callers resolve to `anon:<token>` / `anonymous`.
    /// Authenticated callers resolve to `auth:<id>` with the stored role
    /// attribute, falling back to the provider admin claim and finally to
    /// `reader`. A failed role lookup degrades to `reader` rather than
    /// aborting the visit.
    pub async fn resolve(
        &self,
        claims: Option<&UserClaims>,
        device_token: Option<String>,
    ) -> ResolvedVisitor {
        let device_token = self.tokens.get_or_create(device_token);

        match claims {
            None => ResolvedVisitor {
                identity: VisitIdentity::Anon(device_token.clone()),
                role: Role::Anonymous,
                device_token,
            },
            Some(claims) => {
                let role = match self.roles.role_attributes(claims.user_id).await {
                    Ok(stored) => resolve_role(claims, stored.as_ref()),
                    Err(e) => {
                        tracing::warn!(
                            user_id = claims.user_id,
                            "Role lookup failed, defaulting to reader: {}",
                            e
                        );
                        Role::Reader
                    }
                };
                ResolvedVisitor {
                    identity: VisitIdentity::Auth(claims.user_id),
                    role,
                    device_token,
                }
            }
        }
    }
}

/// Role resolution order for signed-in users: stored role attribute if valid,
/// then the provider admin flag, then `reader`.
fn resolve_role(claims: &UserClaims, stored: Option<&UserRoleRow>) -> Role {
    if let Some(row) = stored {
        if let Some(role) = row
            .role
            .as_deref()
            .and_then(|s| s.parse::<Role>().ok())
            .filter(|r| *r != Role::Anonymous)
        {
            return role;
        }
        if row.is_admin == Some(true) {
            return Role::Admin;
        }
    }
    if claims.admin {
        return Role::Admin;
    }
    Role::Reader
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRoleSource;
    use chrono::Utc;

    struct FixedTokenProvider(&'static str);

    impl DeviceTokenProvider for FixedTokenProvider {
        fn get_or_create(&self, existing: Option<String>) -> String {
            existing.unwrap_or_else(|| self.0.to_string())
        }
    }

    fn claims(user_id: i32, admin: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: format!("user-{}", user_id),
            user_id,
            role: None,
            admin,
            exp: now + 3600,
            iat: now,
        }
    }

    fn row(role: Option<&str>, is_admin: Option<bool>) -> UserRoleRow {
        UserRoleRow {
            id: 1,
            role: role.map(String::from),
            is_admin,
        }
    }

    fn resolver(roles: MockRoleSource) -> IdentityResolver {
        IdentityResolver::new(Arc::new(roles), Arc::new(FixedTokenProvider("fixed-token-123")))
    }

    #[test]
    fn stored_role_wins() {
        let c = claims(1, true);
        assert_eq!(resolve_role(&c, Some(&row(Some("leader"), None))), Role::Leader);
    }

    #[test]
    fn invalid_stored_role_falls_through_to_admin_claim() {
        let c = claims(1, false);
        assert_eq!(
            resolve_role(&c, Some(&row(Some("bogus"), Some(true)))),
            Role::Admin
        );
        assert_eq!(
            resolve_role(&c, Some(&row(Some("anonymous"), None))),
            Role::Reader
        );
    }

    #[test]
    fn admin_claim_from_token_applies_without_user_row() {
        assert_eq!(resolve_role(&claims(1, true), None), Role::Admin);
        assert_eq!(resolve_role(&claims(1, false), None), Role::Reader);
    }

    #[tokio::test]
    async fn unauthenticated_resolves_to_anonymous() {
        let mut roles = MockRoleSource::new();
        roles.expect_role_attributes().never();

        let visitor = resolver(roles).resolve(None, None).await;
        assert_eq!(visitor.role, Role::Anonymous);
        assert_eq!(visitor.identity.key(), "anon:fixed-token-123");
        assert_eq!(visitor.device_token, "fixed-token-123");
    }

    #[tokio::test]
    async fn existing_device_token_is_kept() {
        let mut roles = MockRoleSource::new();
        roles.expect_role_attributes().never();

        let visitor = resolver(roles)
            .resolve(None, Some("previously-issued".to_string()))
            .await;
        assert_eq!(visitor.identity.key(), "anon:previously-issued");
        assert_eq!(visitor.device_token, "previously-issued");
    }

    #[tokio::test]
    async fn role_lookup_failure_degrades_to_reader() {
        let mut roles = MockRoleSource::new();
        roles
            .expect_role_attributes()
            .returning(|_| Err(crate::error::AppError::Internal("db down".to_string())));

        let c = claims(9, true);
        let visitor = resolver(roles).resolve(Some(&c), None).await;
        assert_eq!(visitor.role, Role::Reader);
        assert_eq!(visitor.identity, VisitIdentity::Auth(9));
    }

    #[tokio::test]
    async fn authenticated_uses_stored_role() {
        let mut roles = MockRoleSource::new();
        roles
            .expect_role_attributes()
            .returning(|_| Ok(Some(UserRoleRow {
                id: 3,
                role: Some("editor".to_string()),
                is_admin: None,
            })));

        let c = claims(3, false);
        let visitor = resolver(roles).resolve(Some(&c), None).await;
        assert_eq!(visitor.role, Role::Editor);
        assert_eq!(visitor.identity.key(), "auth:3");
    }

    #[test]
    fn random_tokens_are_fresh_and_well_formed() {
        let provider = RandomTokenProvider;
        let a = provider.get_or_create(None);
        let b = provider.get_or_create(None);
        assert_eq!(a.len(), DEVICE_TOKEN_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        // Empty tokens are treated as absent
        assert_eq!(provider.get_or_create(Some(String::new())).len(), DEVICE_TOKEN_LEN);
    }
}
