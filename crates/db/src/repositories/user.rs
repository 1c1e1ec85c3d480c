//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// User repository for lookups and seeding.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        email: &str,
        full_name: &str,
        is_staff: bool,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_lowercase()),
            full_name: Set(full_name.to_string()),
            is_staff: Set(is_staff),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
