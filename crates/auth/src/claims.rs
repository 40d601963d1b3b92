use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use letmebuy_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// The minimal set of claims the backend expects once a token issued by the
/// identity provider has been decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the user id of the caller.
    pub sub: UserId,

    /// RBAC roles granted to the caller.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims(issued: i64, expires: i64) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(1),
            roles: vec![Role::ADMIN],
            issued_at: Utc.timestamp_opt(issued, 0).unwrap(),
            expires_at: Utc.timestamp_opt(expires, 0).unwrap(),
        }
    }

    #[test]
    fn accepts_tokens_inside_their_window() {
        let c = claims(1_000, 2_000);
        let now = c.issued_at + Duration::seconds(10);
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let c = claims(1_000, 2_000);
        assert_eq!(
            validate_claims(&c, c.expires_at),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, c.issued_at - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(2_000, 2_000), c.issued_at),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn serializes_standard_claim_names() {
        let json = serde_json::to_value(claims(1_000, 2_000)).unwrap();
        assert_eq!(json["sub"], 1);
        assert_eq!(json["iat"], 1_000);
        assert_eq!(json["exp"], 2_000);
        assert_eq!(json["roles"][0], "ADMIN");
    }
}
