use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, User, UserChanges};
use crate::errors::RepoError;

const USER_CONSTRAINTS: &[(&str, &str)] = &[
    ("users_wallet_address_key", "Wallet address already registered"),
    ("users_email_key", "Email already registered"),
];

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_by_wallet(&self, wallet: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepoError>;
    async fn update(&self, wallet: &str, changes: UserChanges) -> Result<User, RepoError>;
}

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, bio, avatar_url, wallet_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, bio, avatar_url, wallet_address, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(&user.wallet_address)
        .fetch_one(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, USER_CONSTRAINTS))
    }

    async fn find_by_wallet(&self, wallet: &str) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, bio, avatar_url, wallet_address, created_at, updated_at
            FROM users
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, &[]))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, bio, avatar_url, wallet_address, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, &[]))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, bio, avatar_url, wallet_address, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, &[]))
    }

    async fn update(&self, wallet: &str, changes: UserChanges) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   bio        = COALESCE($4, bio),
                   avatar_url = COALESCE($5, avatar_url),
                   updated_at = now()
             WHERE wallet_address = $1
            RETURNING id, name, email, bio, avatar_url, wallet_address, created_at, updated_at
            "#,
        )
        .bind(wallet)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.bio)
        .bind(&changes.avatar_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, USER_CONSTRAINTS))
    }
}
