use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::blocking;
use crate::{
    auth::{AuthUser, TokenManager},
    error::AppError,
    models::{
        LoginRequest, LoginResponse, NewUser, RegisterUserRequest, Role, UpdateUserRequest, User,
        UserChanges,
    },
    password::{MAX_PASSWORD_BYTES, PasswordHasher},
    policy,
    repository::UserRepository,
};

// Local part, an @, a domain containing at least one dot, and a 2+ letter TLD.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn ensure_password_fits(password: &str) -> Result<(), AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// UserService
///
/// Registration, login, and account maintenance. Credential checks happen here
/// so that handlers never touch password hashes.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordHasher,
    tokens: TokenManager,
    allow_admin_signup: bool,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: PasswordHasher,
        tokens: TokenManager,
        allow_admin_signup: bool,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            allow_admin_signup,
        }
    }

    /// register
    ///
    /// Validates every field before touching storage, hashes the password and
    /// stores the account. A request for `role: "admin"` is honoured only when
    /// admin self-registration is enabled.
    pub async fn register(&self, req: RegisterUserRequest) -> Result<User, AppError> {
        if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty()
        {
            return Err(AppError::Validation(
                "All fields (username, email, password) are required".to_string(),
            ));
        }
        if !is_valid_email(&req.email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        ensure_password_fits(&req.password)?;

        let role = match req.role.as_deref() {
            Some("admin") if self.allow_admin_signup => Role::Admin,
            Some("admin") => {
                return Err(AppError::Authorization(
                    "The admin role cannot be requested at registration".to_string(),
                ));
            }
            _ => Role::User,
        };

        let passwords = self.passwords;
        let plaintext = req.password;
        let password_hash = blocking(move || passwords.hash(&plaintext))
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let record = self
            .users
            .create(NewUser {
                name: req.username,
                email: req.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Email is already taken".to_string()),
                other => other,
            })?;

        tracing::info!(user_id = record.id, role = %record.role, "user registered");
        Ok(record.into())
    }

    /// login
    ///
    /// Unknown emails and wrong passwords produce the same error so that the
    /// endpoint does not reveal which accounts exist.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let Some(record) = self.users.get_by_email(&req.email).await? else {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        let passwords = self.passwords;
        let hash = record.password_hash.clone();
        let plaintext = req.password;
        let verified = blocking(move || passwords.verify(&hash, &plaintext)).await?;
        if !verified {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let issued = self
            .tokens
            .issue_token(record.id, record.role)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(user_id = record.id, "user logged in");
        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
        })
    }

    pub async fn get(&self, id: i64) -> Result<User, AppError> {
        self.users
            .get_by_id(id)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// update
    ///
    /// Owner-or-admin. Only admins may change a role. A new email must be well
    /// formed and must not belong to a different user.
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        policy::ensure_can_mutate(actor, existing.id, "update this user")?;

        if req.role.is_some_and(|role| role != existing.role) && !actor.role.is_admin() {
            return Err(AppError::Authorization(
                "Only an admin can change a user's role".to_string(),
            ));
        }
        if req.username.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }
        if let Some(password) = req.password.as_deref() {
            if password.is_empty() {
                return Err(AppError::Validation("Password cannot be empty".to_string()));
            }
            ensure_password_fits(password)?;
        }
        if let Some(email) = req.email.as_deref() {
            if !is_valid_email(email) {
                return Err(AppError::Validation("Invalid email format".to_string()));
            }
            if self.users.email_taken(email, id).await? {
                return Err(AppError::Conflict("Email is already taken".to_string()));
            }
        }

        let password_hash = match req.password {
            Some(plaintext) => {
                let passwords = self.passwords;
                let hash = blocking(move || passwords.hash(&plaintext))
                    .await?
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                Some(hash)
            }
            None => None,
        };

        let changes = UserChanges {
            name: req.username,
            email: req.email,
            password_hash,
            role: req.role,
        };

        let updated = self
            .users
            .update(id, changes)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Email is already taken".to_string()),
                other => other,
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = id, actor_id = actor.id, "user updated");
        Ok(updated.into())
    }

    /// Owner-or-admin. The user's posts are removed along with the account.
    pub async fn delete(&self, actor: &AuthUser, id: i64) -> Result<(), AppError> {
        let existing = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        policy::ensure_can_mutate(actor, existing.id, "delete this user")?;

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = id, actor_id = actor.id, "user deleted");
        Ok(())
    }
}
