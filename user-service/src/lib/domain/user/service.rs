use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;

use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPage;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Password hashed once and verified against when the login email is unknown.
const DECOY_PASSWORD: &str = "decoy-password-0";

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    decoy_hash: OnceLock<String>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hasher and token issuer built from configuration
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
            decoy_hash: OnceLock::new(),
        }
    }

    async fn find_existing(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    /// Spend roughly the cost of a real password check so that unknown
    /// emails and wrong passwords take similar time.
    fn verify_against_decoy(&self, password: &str) {
        let decoy = self.decoy_hash.get_or_init(|| {
            self.authenticator
                .hash_password(DECOY_PASSWORD)
                .unwrap_or_default()
        });
        let _ = self.authenticator.verify_password(password, decoy);
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        if self
            .repository
            .exists_by_email(command.email.as_str())
            .await?
        {
            return Err(UserError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        // Hash password using auth library
        let password_hash = self.authenticator.hash_password(&command.password)?;

        let user = User::register(command.email, password_hash, command.name, command.role);

        let created_user = self.repository.create(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            role = %created_user.role,
            "User created"
        );

        Ok(created_user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.find_existing(id).await
    }

    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, UserError> {
        self.repository
            .find_by_email(email.as_str())
            .await?
            .ok_or(UserError::NotFound(email.to_string()))
    }

    async fn list_users(&self, query: ListUsersQuery) -> Result<UserPage, UserError> {
        let users = self.repository.list(query.offset, query.limit).await?;
        let total = self.repository.count().await?;

        Ok(UserPage { users, total })
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self.find_existing(id).await?;

        if let Some(new_name) = command.name {
            user.update_name(new_name);
        }

        if let Some(new_email) = command.email {
            if new_email != user.email
                && self
                    .repository
                    .exists_by_email(new_email.as_str())
                    .await?
            {
                return Err(UserError::EmailAlreadyExists(new_email.to_string()));
            }
            user.update_email(new_email);
        }

        if let Some(new_role) = command.role {
            user.update_role(new_role);
        }

        let updated_user = self.repository.update(user).await?;
        tracing::info!(user_id = %updated_user.id, "User updated");

        Ok(updated_user)
    }

    async fn set_user_active(&self, id: &UserId, active: bool) -> Result<User, UserError> {
        let mut user = self.find_existing(id).await?;

        if active {
            user.activate();
        } else {
            user.deactivate();
        }

        let updated_user = self.repository.update(user).await?;
        tracing::info!(
            user_id = %updated_user.id,
            is_active = updated_user.is_active,
            "User status changed"
        );

        Ok(updated_user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, UserError> {
        let user = match self.repository.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.verify_against_decoy(password);
                tracing::debug!("Login rejected: unknown email");
                return Err(UserError::InvalidCredentials);
            }
        };

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: account deactivated");
            return Err(UserError::AccountDeactivated);
        }

        let claims = auth::Claims::for_user(
            user.id,
            user.email.as_str(),
            user.role.as_str(),
            self.authenticator.token_ttl(),
        )
        .map_err(|e| UserError::TokenIssuance(e.to_string()))?;

        // Verify password and generate token
        let result = self
            .authenticator
            .authenticate(password, &user.password_hash, &claims)
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
                    UserError::InvalidCredentials
                }
                AuthenticationError::PasswordError(err) => {
                    tracing::error!(
                        user_id = %user.id,
                        error = %err,
                        "Stored password hash cannot be verified"
                    );
                    UserError::CorruptCredentialRecord(user.id.to_string())
                }
                AuthenticationError::JwtError(err) => UserError::TokenIssuance(err.to_string()),
            })?;

        tracing::info!(user_id = %user.id, "User authenticated");

        Ok(AuthenticatedUser {
            user,
            token: result.access_token,
        })
    }
}
