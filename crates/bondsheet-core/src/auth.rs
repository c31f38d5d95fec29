//! Credential check and bearer-token issue/verify.
//!
//! Tokens are stateless JWTs signed with a symmetric key: subject carries
//! the username, expiry bounds the session. There is no refresh and no
//! revocation; an expired token means a full re-login.

use std::collections::HashMap;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::AuthError;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::minutes(60);

/// Username → password map, injected from configuration at process start.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(user, password)| (user.into(), password.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and verifies bearer tokens against a fixed signing key.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Check credentials against the store and mint a token on success.
    pub fn issue(
        &self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        if !store.verify(username, password) {
            return Err(AuthError::InvalidCredentials);
        }
        self.mint(username, OffsetDateTime::now_utc() + self.ttl)
    }

    /// Verify signature and expiry; return the subject username.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims.sub)
    }

    fn mint(&self, username: &str, expires_at: OffsetDateTime) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_owned(),
            exp: expires_at.unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::from_pairs([("ana", "s3cret"), ("bruno", "hunter2")])
    }

    #[test]
    fn issue_then_verify_returns_the_username() {
        let authority = TokenAuthority::new("test-signing-key", DEFAULT_TOKEN_TTL);
        let token = authority
            .issue(&store(), "ana", "s3cret")
            .expect("valid credentials should issue");

        let subject = authority.verify(&token).expect("token should verify");
        assert_eq!(subject, "ana");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let authority = TokenAuthority::new("test-signing-key", DEFAULT_TOKEN_TTL);
        let error = authority
            .issue(&store(), "ana", "wrong")
            .expect_err("must fail");
        assert!(matches!(error, AuthError::InvalidCredentials));
    }

    #[test]
    fn unknown_user_is_rejected() {
        let authority = TokenAuthority::new("test-signing-key", DEFAULT_TOKEN_TTL);
        let error = authority
            .issue(&store(), "mallory", "s3cret")
            .expect_err("must fail");
        assert!(matches!(error, AuthError::InvalidCredentials));
    }

    #[test]
    fn token_signed_with_another_key_fails_verification() {
        let issuer = TokenAuthority::new("key-one", DEFAULT_TOKEN_TTL);
        let verifier = TokenAuthority::new("key-two", DEFAULT_TOKEN_TTL);

        let token = issuer
            .issue(&store(), "bruno", "hunter2")
            .expect("valid credentials should issue");
        let error = verifier.verify(&token).expect_err("must fail");
        assert!(matches!(error, AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_fails_verification() {
        let authority = TokenAuthority::new("test-signing-key", DEFAULT_TOKEN_TTL);
        let token = authority
            .mint("ana", OffsetDateTime::now_utc() - Duration::minutes(5))
            .expect("minting should succeed");

        let error = authority.verify(&token).expect_err("must fail");
        assert!(matches!(error, AuthError::InvalidToken));
    }

    #[test]
    fn garbage_token_fails_verification() {
        let authority = TokenAuthority::new("test-signing-key", DEFAULT_TOKEN_TTL);
        let error = authority
            .verify("not.a.token")
            .expect_err("must fail");
        assert!(matches!(error, AuthError::InvalidToken));
    }
}
