//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{RegisterUser, User, UserClaims, UserQuery, UserShort},
    },
    repository::Repository,
};

/// Roles a user may pick when registering
pub const SELF_SERVICE_ROLES: [Role; 2] = [Role::Visitor, Role::Host];

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create an account. Only VISITOR and HOST can be self-assigned.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;
        let role = request.role.unwrap_or(Role::Visitor);
        if !SELF_SERVICE_ROLES.contains(&role) {
            return Err(AppError::Validation(format!("Role {} cannot be chosen at registration", role)));
        }

        let hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&request.email, &hash, &request.full_name, role)
            .await?;

        tracing::info!(user_id = %user.id, %role, "User registered");
        Ok(user)
    }

    /// Create the configured administrator account unless the email is taken
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password) else {
            return Ok(());
        };
        if self.repository.users.get_by_email(email).await?.is_some() {
            return Ok(());
        }
        let hash = hash_password(password)?;
        let user = self
            .repository
            .users
            .create(email, &hash, "Administrator", Role::Admin)
            .await?;
        tracing::info!(user_id = %user.id, "Administrator account created");
        Ok(())
    }

    /// Check credentials and issue a JWT
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(&user.password, password)? {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users (admin only)
    pub async fn list(&self, claims: &UserClaims, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        claims.require_admin()?;
        self.repository.users.list(query).await
    }

    /// Change a user's role (admin only)
    pub async fn update_role(&self, claims: &UserClaims, id: Uuid, role: Role) -> AppResult<User> {
        claims.require_admin()?;
        if id == claims.user_id && role != Role::Admin {
            return Err(AppError::BusinessRule("Administrators cannot demote themselves".to_string()));
        }
        let user = self.repository.users.update_role(id, role).await?;
        tracing::info!(user_id = %user.id, %role, changed_by = %claims.user_id, "Role changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        assert!(matches!(
            verify_password("not-a-hash", "x"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_self_service_roles() {
        assert!(SELF_SERVICE_ROLES.contains(&Role::Visitor));
        assert!(SELF_SERVICE_ROLES.contains(&Role::Host));
        assert!(!SELF_SERVICE_ROLES.contains(&Role::Security));
        assert!(!SELF_SERVICE_ROLES.contains(&Role::Admin));
    }
}
