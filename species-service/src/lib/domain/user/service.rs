use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::models::AccessToken;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Authentication gateway.
///
/// Coordinates the credential store with password hashing and token
/// handling. Holds no mutable state of its own.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        // The store's unique constraint still settles concurrent registrations
        if self
            .repository
            .find_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(UserError::UsernameAlreadyExists(command.username.to_string()));
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())
            .map_err(|e| UserError::PasswordHashing(e.to_string()))?;

        let user = self
            .repository
            .create(NewUser {
                username: command.username,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    async fn login(&self, command: LoginCommand) -> Result<AccessToken, UserError> {
        let Some(user) = self.repository.find_by_username(&command.username).await? else {
            tracing::warn!(username = %command.username, "Login for unknown user");
            return Err(UserError::InvalidCredentials);
        };

        let result = self
            .authenticator
            .authenticate(&command.password, &user.password_hash, user.username.as_str())
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::warn!(username = %user.username, "Login with wrong password");
                    UserError::InvalidCredentials
                }
                AuthenticationError::PasswordError(err) => {
                    tracing::error!(user_id = %user.id, error = %err, "Stored hash unreadable");
                    UserError::InvalidCredentials
                }
                AuthenticationError::JwtError(err) => UserError::TokenIssuance(err.to_string()),
            })?;

        Ok(AccessToken {
            token: result.access_token,
            expires_at: result.expires_at,
        })
    }

    async fn authorize(&self, token: &str) -> Result<User, UserError> {
        let subject = self.authenticator.validate_token(token)?;

        let username = Username::new(subject);

        self.repository
            .find_by_username(&username)
            .await?
            .ok_or_else(|| {
                UserError::Unauthenticated(auth::JwtError::InvalidToken(format!(
                    "unknown subject {username}"
                )))
            })
    }
}
