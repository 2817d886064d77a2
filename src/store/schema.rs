// src/store/schema.rs

use sqlx::PgPool;

use super::StoreError;

/// Idempotently creates every table the application touches. Safe to run on
/// every startup; existing tables are left alone.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for ddl in TABLE_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Parents precede children so the foreign keys resolve on first boot.
const TABLE_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS user_table (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(255) NOT NULL UNIQUE,
        email VARCHAR(255),
        phone_number VARCHAR(255),
        country_code VARCHAR(10),
        date_of_birth DATE NOT NULL,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS otp_table (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES user_table(id),
        otp VARCHAR(6) NOT NULL,
        expiry_time TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        post_id BIGSERIAL PRIMARY KEY,
        user_id BIGINT REFERENCES user_table(id),
        caption TEXT,
        shares INT DEFAULT 0,
        created_at TIMESTAMPTZ DEFAULT NOW(),
        updated_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_media (
        media_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        media_url TEXT,
        media_type VARCHAR(10)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_tags (
        post_tag_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        tagged_user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_participants (
        participant_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        role VARCHAR(16) NOT NULL CHECK (role IN ('attending', 'participant'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        comment_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        comment_text TEXT,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_questions (
        question_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        question TEXT,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_answers (
        answer_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        question_id BIGINT REFERENCES post_questions(question_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        answer TEXT,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_likes (
        like_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        like_type CHAR(1) CHECK (like_type IN ('A', 'B', 'C')),
        liked_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_reviews (
        review_id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(post_id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES user_table(id) ON DELETE CASCADE,
        review_text TEXT,
        rating INT CHECK (rating BETWEEN 1 AND 5),
        created_at TIMESTAMPTZ DEFAULT NOW()
    )
    "#,
];
