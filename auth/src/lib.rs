//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the HTTP service:
//! - Password hashing (Argon2id)
//! - Access token issuance and verification (HS256 JWT)
//! - Authentication coordination
//!
//! The service defines its own ports and adapts these implementations, so the
//! crate carries no knowledge of users, storage or HTTP.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("other_password", &hash).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenIssuer, TokenVerifier};
//! use chrono::Duration;
//!
//! let secret = b"secret_key_at_least_32_bytes_long!";
//! let issued = TokenIssuer::new(secret)
//!     .issue("alice", Duration::minutes(30))
//!     .unwrap();
//! let subject = TokenVerifier::new(secret).verify(&issued.token).unwrap();
//! assert_eq!(subject, "alice");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let result = auth.authenticate("password123", &hash, "alice").unwrap();
//!
//! // Later requests: validate token
//! assert_eq!(auth.validate_token(&result.access_token).unwrap(), "alice");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use authenticator::DEFAULT_TOKEN_VALIDITY_MINUTES;
pub use jwt::issuer::IssuedToken;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenIssuer;
pub use jwt::TokenVerifier;
pub use password::PasswordError;
pub use password::PasswordHasher;
