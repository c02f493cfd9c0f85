// JWT token generation and validation service

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::config::TokenConfig;

/// Which of the two token families a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub sid: Uuid, // session_id
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Authentic but past its expiry
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed, or the wrong kind
    #[error("token invalid")]
    Invalid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl KeyPair {
    fn new(secret: &str, ttl: std::time::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// Token service for JWT operations.
///
/// Access and refresh tokens are signed with different secrets, so one kind
/// never verifies as the other.
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            access: KeyPair::new(&config.access_secret, config.access_ttl),
            refresh: KeyPair::new(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign a token of `kind` binding the user to the session
    pub fn sign(&self, kind: TokenKind, user_id: Uuid, session_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            kind,
            iat: now,
            exp: now.saturating_add(self.keys(kind).ttl_secs),
        };

        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.kind).encoding,
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Generate both access and refresh tokens for a fresh session
    pub fn issue_pair(&self, user_id: Uuid, session_id: Uuid) -> Result<(String, String), AuthError> {
        let access_token = self.sign(TokenKind::Access, user_id, session_id)?;
        let refresh_token = self.sign(TokenKind::Refresh, user_id, session_id)?;
        Ok((access_token, refresh_token))
    }

    /// Check signature, expiry and kind. An expired token is only reported as
    /// such when its signature is authentic.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if claims.kind != kind {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }
}

/// Short digest of a token for log lines; raw tokens are never logged
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest).chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn test_config() -> TokenConfig {
        TokenConfig {
            access_secret: "access_secret_for_testing".to_string(),
            refresh_secret: "refresh_secret_for_testing".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        }
    }

    // Helper to create a test token service
    fn test_token_service() -> TokenService {
        TokenService::new(&test_config())
    }

    fn expired_claims(kind: TokenKind) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            kind,
            iat: now - 3600,
            exp: now - 60,
        }
    }

    #[test]
    fn test_access_token_lifetime_follows_config() {
        let service = test_token_service();
        let token = service.sign(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let claims = service.verify(TokenKind::Access, &token).unwrap();

        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_refresh_token_lifetime_follows_config() {
        let service = test_token_service();
        let token = service.sign(TokenKind::Refresh, Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let claims = service.verify(TokenKind::Refresh, &token).unwrap();

        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_issue_pair_binds_same_session() {
        let service = test_token_service();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (access_token, refresh_token) = service.issue_pair(user_id, session_id).unwrap();

        assert_ne!(access_token, refresh_token);

        let access = service.verify(TokenKind::Access, &access_token).unwrap();
        let refresh = service.verify(TokenKind::Refresh, &refresh_token).unwrap();
        assert_eq!((access.sub, access.sid), (user_id, session_id));
        assert_eq!((refresh.sub, refresh.sid), (user_id, session_id));
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let service = test_token_service();
        let (access_token, refresh_token) =
            service.issue_pair(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        assert_eq!(service.verify(TokenKind::Refresh, &access_token), Err(TokenError::Invalid));
        assert_eq!(service.verify(TokenKind::Access, &refresh_token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_kind_claim_checked_even_with_matching_key() {
        // Same secret for both kinds: only the kind claim tells them apart
        let mut config = test_config();
        config.refresh_secret = config.access_secret.clone();
        let service = TokenService::new(&config);

        let refresh_token = service.sign(TokenKind::Refresh, Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(service.verify(TokenKind::Access, &refresh_token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let service = test_token_service();
        let token = service.encode_claims(&expired_claims(TokenKind::Access)).unwrap();

        assert_eq!(service.verify(TokenKind::Access, &token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_forgery_reported_as_invalid() {
        let service = test_token_service();
        let mut other_config = test_config();
        other_config.access_secret = "someone_else".to_string();
        let forger = TokenService::new(&other_config);

        let token = forger.encode_claims(&expired_claims(TokenKind::Access)).unwrap();
        assert_eq!(service.verify(TokenKind::Access, &token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_signature_verification() {
        let service = test_token_service();
        let mut other_config = test_config();
        other_config.access_secret = "another_secret".to_string();
        let other = TokenService::new(&other_config);

        let token = service.sign(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert!(service.verify(TokenKind::Access, &token).is_ok());
        assert_eq!(other.verify(TokenKind::Access, &token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        for token in ["", "not.a.token", "invalid_token_format", "Basic abc"] {
            assert_eq!(service.verify(TokenKind::Access, token), Err(TokenError::Invalid));
        }
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let first = fingerprint("abc.def.ghi");
        assert_eq!(first.len(), 12);
        assert_eq!(first, fingerprint("abc.def.ghi"));
        assert_ne!(first, fingerprint("abc.def.ghj"));
    }

    proptest! {
        #[test]
        fn prop_claims_survive_signing(a in any::<u128>(), b in any::<u128>()) {
            let service = test_token_service();
            let user_id = Uuid::from_u128(a);
            let session_id = Uuid::from_u128(b);

            let token = service.sign(TokenKind::Access, user_id, session_id).unwrap();
            let claims = service.verify(TokenKind::Access, &token).unwrap();
            prop_assert_eq!(claims.sub, user_id);
            prop_assert_eq!(claims.sid, session_id);
        }

        #[test]
        fn prop_random_strings_rejected(malformed in "[a-zA-Z0-9.]{0,60}") {
            let service = test_token_service();
            prop_assert_eq!(service.verify(TokenKind::Access, &malformed), Err(TokenError::Invalid));
        }
    }
}
