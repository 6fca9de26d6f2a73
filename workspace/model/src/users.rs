//! Account creation and credential checks.

use bcrypt::{DEFAULT_COST, hash};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::{debug, info, instrument, warn};

use crate::entities::user;
use crate::error::{ModelError, Result};

/// Creates users and checks their credentials.
///
/// The bcrypt cost is carried here so that tests and development setups can
/// run with a cheap cost while production keeps the default.
#[derive(Clone, Copy, Debug)]
pub struct UserManager {
    cost: u32,
}

impl Default for UserManager {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl UserManager {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Lowercase and trim an email address.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        Ok(hash(password, self.cost)?)
    }

    /// Create a regular user. Fails with a validation error when `email` is
    /// absent or blank, and with a conflict when the email is taken.
    pub async fn create_user<C>(&self, db: &C, email: Option<&str>, password: &str) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        self.insert_user(db, email, password, "", false).await
    }

    /// Create a regular user with a display name.
    pub async fn create_user_with_name<C>(
        &self,
        db: &C,
        email: Option<&str>,
        password: &str,
        name: &str,
    ) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        self.insert_user(db, email, password, name, false).await
    }

    /// Create a user with both the staff and superuser flags set.
    pub async fn create_superuser<C>(&self, db: &C, email: Option<&str>, password: &str) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        self.insert_user(db, email, password, "", true).await
    }

    #[instrument(skip(self, db, password))]
    async fn insert_user<C>(
        &self,
        db: &C,
        email: Option<&str>,
        password: &str,
        name: &str,
        superuser: bool,
    ) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        let email = match email.map(Self::normalize_email) {
            Some(email) if !email.is_empty() => email,
            _ => {
                warn!("Refusing to create a user without an email address");
                return Err(ModelError::validation("email", "Users must have an email address"));
            }
        };

        if find_by_email(db, &email).await?.is_some() {
            warn!("User with email {} already exists", email);
            return Err(ModelError::Conflict(format!("A user with email '{}' already exists", email)));
        }

        debug!("Hashing password with cost {}", self.cost);
        let password_hash = self.hash_password(password)?;

        let new_user = user::ActiveModel {
            email: Set(email.clone()),
            name: Set(name.to_string()),
            password_hash: Set(password_hash),
            is_active: Set(true),
            is_staff: Set(superuser),
            is_superuser: Set(superuser),
            ..Default::default()
        };

        // A concurrent registration can still win the race past the lookup above
        let user = new_user
            .insert(db)
            .await
            .map_err(|err| insert_error(err, &email))?;
        info!("Created user {} (superuser: {})", user.id, superuser);
        Ok(user)
    }

    /// Look up an active user by email and verify the password.
    /// Returns `None` for unknown emails, wrong passwords and inactive users.
    pub async fn authenticate<C>(&self, db: &C, email: &str, password: &str) -> Result<Option<user::Model>>
    where
        C: ConnectionTrait,
    {
        let email = Self::normalize_email(email);
        let Some(user) = find_by_email(db, &email).await? else {
            debug!("No user registered with email {}", email);
            return Ok(None);
        };

        if !user.is_active || !user.check_password(password) {
            debug!("Rejected credentials for user {}", user.id);
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Replace the stored password hash of `user`.
    pub async fn set_password<C>(&self, db: &C, user: user::Model, password: &str) -> Result<user::Model>
    where
        C: ConnectionTrait,
    {
        let password_hash = self.hash_password(password)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        Ok(active.update(db).await?)
    }
}

/// Report a unique index violation on `users.email` as a conflict.
fn insert_error(err: DbErr, email: &str) -> ModelError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("Unique constraint rejected user {}: {}", email, detail);
            ModelError::Conflict(format!("A user with email '{}' already exists", email))
        }
        _ => ModelError::Database(err),
    }
}

/// Find a user by an already normalized email.
pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}
