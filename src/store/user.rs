// src/store/user.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::StoreError;
use crate::models::otp::OtpRecord;
use crate::models::user::{RegisterRequest, User};

/// Single-entity persistence for users and their one-time codes. Every
/// operation runs one statement on a pool connection that is returned on
/// all exit paths.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a user whose password has already been hashed.
    pub async fn insert_user(&self, req: &RegisterRequest, password_hash: &str) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user_table (username, email, phone_number, country_code, date_of_birth, password)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.phone_number)
        .bind(&req.country_code)
        .bind(req.date_of_birth)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone_number, country_code, date_of_birth, password, created_at
            FROM user_table
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone_number, country_code, date_of_birth, password, created_at
            FROM user_table
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone_number, country_code, date_of_birth, password, created_at
            FROM user_table
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns the number of rows touched; 0 means the user does not exist.
    pub async fn update_password(&self, username: &str, password_hash: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE user_table SET password = $1 WHERE username = $2")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Records a freshly issued code. Older rows are kept; validity is
    /// decided by `latest_otp` alone.
    pub async fn insert_otp(
        &self,
        user_id: i64,
        code: &str,
        expiry_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO otp_table (user_id, otp, expiry_time) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(code)
            .bind(expiry_time)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// The most recently issued code for a user, if any.
    pub async fn latest_otp(&self, user_id: i64) -> Result<Option<OtpRecord>, StoreError> {
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            SELECT id, user_id, otp, expiry_time
            FROM otp_table
            WHERE user_id = $1
            ORDER BY expiry_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
