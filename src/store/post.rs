// src/store/post.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::StoreError;
use crate::models::post::{
    AnswerRecord, CommentRecord, LikeRecord, NewComment, NewLike, NewQuestion, NewReview,
    ParticipantRole, PostRecord, QuestionRecord, ReviewRecord,
};

/// Per-collection persistence for the post aggregate. Each operation is one
/// statement (or one batched multi-row statement) against its own pooled
/// connection, so concurrent callers never contend on shared state here.
///
/// Batched inserts bind rows in the caller-supplied order; relative storage
/// order across sibling collections is not guaranteed.
#[derive(Debug, Clone)]
pub struct PostStore {
    pool: PgPool,
}

impl PostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the aggregate root and returns its generated identifier,
    /// the dependency for every child write.
    pub async fn insert_post(&self, user_id: i64, caption: &str) -> Result<i64, StoreError> {
        let post_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (user_id, caption) VALUES ($1, $2) RETURNING post_id",
        )
        .bind(user_id)
        .bind(caption)
        .fetch_one(&self.pool)
        .await?;

        Ok(post_id)
    }

    pub async fn insert_media(
        &self,
        post_id: i64,
        urls: &[String],
        types: &[String],
    ) -> Result<(), StoreError> {
        if urls.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO post_media (post_id, media_url, media_type) ");
        builder.push_values(urls.iter().zip(types.iter()), |mut row, (url, media_type)| {
            row.push_bind(post_id).push_bind(url).push_bind(media_type);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn insert_tags(&self, post_id: i64, tagged_user_ids: &[i64]) -> Result<(), StoreError> {
        if tagged_user_ids.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO post_tags (post_id, tagged_user_id) ");
        builder.push_values(tagged_user_ids, |mut row, user_id| {
            row.push_bind(post_id).push_bind(user_id);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn insert_participants(
        &self,
        post_id: i64,
        user_ids: &[i64],
        role: ParticipantRole,
    ) -> Result<(), StoreError> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO post_participants (post_id, user_id, role) ");
        builder.push_values(user_ids, |mut row, user_id| {
            row.push_bind(post_id).push_bind(user_id).push_bind(role.as_str());
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn insert_comments(&self, post_id: i64, comments: &[NewComment]) -> Result<(), StoreError> {
        if comments.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO comments (post_id, user_id, comment_text) ");
        builder.push_values(comments, |mut row, comment| {
            row.push_bind(post_id)
                .push_bind(comment.user_id)
                .push_bind(&comment.comment_text);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    /// Returns the generated question ids in input order so answers written
    /// in the same fan-out step can be resolved against them.
    pub async fn insert_questions(
        &self,
        post_id: i64,
        questions: &[NewQuestion],
    ) -> Result<Vec<i64>, StoreError> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO post_questions (post_id, user_id, question) ");
        builder.push_values(questions, |mut row, question| {
            row.push_bind(post_id)
                .push_bind(question.user_id)
                .push_bind(&question.question);
        });
        builder.push(" RETURNING question_id");

        let ids = builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Rows are (question_id, user_id, answer text), already resolved to
    /// real question identifiers.
    pub async fn insert_answers(
        &self,
        post_id: i64,
        answers: &[(i64, i64, String)],
    ) -> Result<(), StoreError> {
        if answers.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO post_answers (post_id, question_id, user_id, answer) ",
        );
        builder.push_values(answers, |mut row, (question_id, user_id, answer)| {
            row.push_bind(post_id)
                .push_bind(question_id)
                .push_bind(user_id)
                .push_bind(answer);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn insert_likes(&self, post_id: i64, likes: &[NewLike]) -> Result<(), StoreError> {
        if likes.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO post_likes (post_id, user_id, like_type) ");
        builder.push_values(likes, |mut row, like| {
            row.push_bind(post_id)
                .push_bind(like.user_id)
                .push_bind(&like.like_type);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn insert_reviews(&self, post_id: i64, reviews: &[NewReview]) -> Result<(), StoreError> {
        if reviews.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO post_reviews (post_id, user_id, review_text, rating) ",
        );
        builder.push_values(reviews, |mut row, review| {
            row.push_bind(post_id)
                .push_bind(review.user_id)
                .push_bind(&review.review_text)
                .push_bind(review.rating);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    pub async fn select_post(&self, post_id: i64) -> Result<Option<PostRecord>, StoreError> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT post_id, user_id, caption, shares, created_at, updated_at
            FROM posts
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Media rows in insertion order, url and type paired per row.
    pub async fn select_media(&self, post_id: i64) -> Result<Vec<(String, String)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT media_url, media_type FROM post_media WHERE post_id = $1 ORDER BY media_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn select_tags(&self, post_id: i64) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT tagged_user_id FROM post_tags WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn select_participants(
        &self,
        post_id: i64,
        role: ParticipantRole,
    ) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM post_participants WHERE post_id = $1 AND role = $2",
        )
        .bind(post_id)
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn select_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, StoreError> {
        let comments = sqlx::query_as::<_, CommentRecord>(
            "SELECT user_id, comment_text FROM comments WHERE post_id = $1 ORDER BY comment_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn select_questions(&self, post_id: i64) -> Result<Vec<QuestionRecord>, StoreError> {
        let questions = sqlx::query_as::<_, QuestionRecord>(
            "SELECT question_id, user_id, question FROM post_questions WHERE post_id = $1 ORDER BY question_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn select_answers(&self, post_id: i64) -> Result<Vec<AnswerRecord>, StoreError> {
        let answers = sqlx::query_as::<_, AnswerRecord>(
            "SELECT answer_id, question_id, user_id, answer FROM post_answers WHERE post_id = $1 ORDER BY answer_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    pub async fn select_likes(&self, post_id: i64) -> Result<Vec<LikeRecord>, StoreError> {
        let likes = sqlx::query_as::<_, LikeRecord>(
            "SELECT user_id, like_type FROM post_likes WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    pub async fn select_reviews(&self, post_id: i64) -> Result<Vec<ReviewRecord>, StoreError> {
        let reviews = sqlx::query_as::<_, ReviewRecord>(
            "SELECT user_id, review_text, rating FROM post_reviews WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
