use shared::{
    domain::{Capability, Identity, Role},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// No identity on the request; the caller should be sent to the login page.
    #[error("authentication required")]
    Unauthenticated,
    #[error("Access Denied")]
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(AccessDenied),
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Decides whether `identity` may proceed. An empty `required_roles` admits any
/// authenticated identity.
pub fn authorize(identity: Option<&Identity>, required_roles: &[Role]) -> AccessDecision {
    let Some(identity) = identity else {
        return AccessDecision::Deny(AccessDenied::Unauthenticated);
    };
    if required_roles.is_empty() || required_roles.contains(&identity.role) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(AccessDenied::Forbidden)
    }
}

/// Gate used by the HTTP layer: resolves the roles holding `capability` and authorizes
/// against them.
pub fn require(
    identity: Option<&Identity>,
    capability: Capability,
) -> Result<&Identity, AccessDenied> {
    match (authorize(identity, &capability.permitted_roles()), identity) {
        (AccessDecision::Allow, Some(identity)) => Ok(identity),
        (AccessDecision::Deny(denied), _) => Err(denied),
        (AccessDecision::Allow, None) => Err(AccessDenied::Unauthenticated),
    }
}

impl From<AccessDenied> for ApiError {
    fn from(value: AccessDenied) -> Self {
        match value {
            AccessDenied::Unauthenticated => {
                ApiError::new(ErrorCode::Unauthorized, value.to_string())
            }
            AccessDenied::Forbidden => ApiError::access_denied(),
        }
    }
}

#[cfg(test)]
#[path = "tests/access_tests.rs"]
mod tests;
