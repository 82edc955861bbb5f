use thiserror::Error;

/// Top-level error for registration, login and authorization
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Domain-level errors
    #[error("Username already registered: {0}")]
    UsernameAlreadyExists(String),

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials: {0}")]
    Unauthenticated(#[from] auth::JwtError),

    // Infrastructure errors
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
