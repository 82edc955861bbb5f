use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenVerifier;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_VALIDITY_MINUTES: i64 = 30;

/// Authentication coordinator combining password verification and token handling.
///
/// Owns the signing secret (through its issuer and verifier) and the token
/// validity window. Build one at startup and share it behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    token_validity: Duration,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed bearer token
    pub access_token: String,

    /// Instant after which the token is rejected
    pub expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create an authenticator with the default 30 minute token validity.
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self::with_validity(jwt_secret, Duration::minutes(DEFAULT_TOKEN_VALIDITY_MINUTES))
    }

    pub fn with_validity(jwt_secret: &[u8], token_validity: Duration) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            issuer: TokenIssuer::new(jwt_secret),
            verifier: TokenVerifier::new(jwt_secret),
            token_validity,
        }
    }

    pub fn token_validity(&self) -> Duration {
        self.token_validity
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against its stored hash and, on success, issue a
    /// token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is unreadable
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.generate_token(subject)?)
    }

    /// Issue a token for `subject` without checking a password.
    pub fn generate_token(&self, subject: &str) -> Result<AuthenticationResult, JwtError> {
        let issued = self.issuer.issue(subject, self.token_validity)?;
        let expires_at = issued
            .claims
            .expires_at()
            .ok_or_else(|| JwtError::EncodingFailed("expiry out of range".to_string()))?;

        Ok(AuthenticationResult {
            access_token: issued.token,
            expires_at,
        })
    }

    /// Validate a token and return the subject it was issued for.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature mismatch or malformed token
    /// * `TokenExpired` - Token is past its expiry
    pub fn validate_token(&self, token: &str) -> Result<String, JwtError> {
        self.verifier.verify(token)
    }
}
