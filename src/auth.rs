//! Internal Caller Authentication
//!
//! The task endpoints reachable by the on-chain orchestrator are gated by a
//! static shared secret sent in the `X-API-KEY` header. The two failure
//! modes are distinct on purpose: a gateway deployed without the secret is
//! misconfigured (server-side problem), a caller with the wrong secret is
//! unauthorized (caller-side problem).

use thiserror::Error;

/// Header carrying the shared secret.
pub const INTERNAL_API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("internal api key not configured")]
    Unconfigured,

    #[error("invalid api key")]
    Unauthorized,
}

/// Check a caller-provided key against the configured shared secret.
pub fn require_internal_key(
    configured: Option<&str>,
    provided: Option<&str>,
) -> Result<(), AuthError> {
    let expected = match configured.filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => return Err(AuthError::Unconfigured),
    };

    if provided != Some(expected) {
        return Err(AuthError::Unauthorized);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_key_accepted() {
        assert_eq!(require_internal_key(Some("secret"), Some("secret")), Ok(()));
    }

    #[test]
    fn test_wrong_or_missing_key_unauthorized() {
        assert_eq!(
            require_internal_key(Some("secret"), Some("other")),
            Err(AuthError::Unauthorized)
        );
        assert_eq!(
            require_internal_key(Some("secret"), None),
            Err(AuthError::Unauthorized)
        );
    }

    #[test]
    fn test_unconfigured_is_distinct_from_unauthorized() {
        assert_eq!(
            require_internal_key(None, Some("secret")),
            Err(AuthError::Unconfigured)
        );
        assert_eq!(
            require_internal_key(Some(""), Some("")),
            Err(AuthError::Unconfigured)
        );
    }
}
