// src/models/post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub post_id: i64,
    pub user_id: i64,
    pub caption: String,
    pub shares: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Role discriminator for the shared 'post_participants' relation.
/// Attendance and participation are distinct collections in the API but
/// live in one table, told apart by this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Attending,
    Participant,
}

impl ParticipantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Attending => "attending",
            ParticipantRole::Participant => "participant",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub user_id: i64,
    pub comment_text: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_id: i64,
    pub user_id: i64,
    pub question: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub answer_id: i64,
    pub question_id: i64,
    pub user_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    pub user_id: i64,
    pub like_type: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub user_id: i64,
    pub review_text: String,
    pub rating: i32,
}

/// DTO for creating a post aggregate in one logical operation.
///
/// Every collection is optional on the wire; media urls and types are
/// parallel arrays zipped by index. All shape violations are rejected
/// before any row is written.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_aggregate_shape))]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 2200, message = "Caption must be between 1 and 2200 characters."))]
    pub caption: String,

    #[serde(default)]
    #[validate(custom(function = validate_media_urls))]
    pub media_urls: Vec<String>,

    #[serde(default)]
    pub media_types: Vec<String>,

    #[serde(default)]
    pub tagged_user_ids: Vec<i64>,

    #[serde(default)]
    pub attending_user_ids: Vec<i64>,

    #[serde(default)]
    pub participant_ids: Vec<i64>,

    #[serde(default)]
    #[validate(nested)]
    pub comments: Vec<NewComment>,

    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<NewQuestion>,

    #[serde(default)]
    #[validate(nested)]
    pub answers: Vec<NewAnswer>,

    #[serde(default)]
    #[validate(nested)]
    pub likes: Vec<NewLike>,

    #[serde(default)]
    #[validate(nested)]
    pub reviews: Vec<NewReview>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub user_id: i64,
    #[validate(length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters."))]
    pub comment_text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub user_id: i64,
    #[validate(length(min = 1, max = 1000, message = "Question must be between 1 and 1000 characters."))]
    pub question: String,
}

/// An answer references its question by zero-based index into the request's
/// question list. The coordinator resolves the index to the generated
/// question id, so stored answers always point at a real question row.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
    pub question_index: usize,
    pub user_id: i64,
    #[validate(length(min = 1, max = 1000, message = "Answer must be between 1 and 1000 characters."))]
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLike {
    pub user_id: i64,
    /// 'A' thumbs up, 'B' clap, 'C' love.
    #[validate(custom(function = validate_like_type, message = "Like type must be one of 'A', 'B', 'C'."))]
    pub like_type: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub user_id: i64,
    #[validate(length(min = 1, max = 2000, message = "Review must be between 1 and 2000 characters."))]
    pub review_text: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i32,
}

/// The fully assembled aggregate returned by the read path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAggregate {
    pub post_id: i64,
    pub user_id: i64,
    pub caption: String,
    pub shares: i32,
    pub media_urls: Vec<String>,
    pub media_types: Vec<String>,
    pub tagged_user_ids: Vec<i64>,
    pub attending_user_ids: Vec<i64>,
    pub participant_ids: Vec<i64>,
    pub comments: Vec<CommentRecord>,
    pub questions: Vec<QuestionRecord>,
    pub answers: Vec<AnswerRecord>,
    pub likes: Vec<LikeRecord>,
    pub reviews: Vec<ReviewRecord>,
}

/// Cross-field invariants: media urls and types pair up by index, and every
/// answer must point inside the question list.
fn validate_aggregate_shape(req: &CreatePostRequest) -> Result<(), ValidationError> {
    if req.media_urls.len() != req.media_types.len() {
        return Err(ValidationError::new("media_mismatch").with_message(
            format!(
                "Media url count ({}) does not match media type count ({}).",
                req.media_urls.len(),
                req.media_types.len()
            )
            .into(),
        ));
    }

    for answer in &req.answers {
        if answer.question_index >= req.questions.len() {
            return Err(ValidationError::new("dangling_answer").with_message(
                format!(
                    "Answer references question index {} but only {} questions were supplied.",
                    answer.question_index,
                    req.questions.len()
                )
                .into(),
            ));
        }
    }
    Ok(())
}

fn validate_media_urls(urls: &[String]) -> Result<(), ValidationError> {
    for url in urls {
        if Url::parse(url).is_err() {
            return Err(ValidationError::new("invalid_media_url")
                .with_message(format!("'{url}' is not a valid URL.").into()));
        }
    }
    Ok(())
}

fn validate_like_type(like_type: &str) -> Result<(), ValidationError> {
    match like_type {
        "A" | "B" | "C" => Ok(()),
        _ => Err(ValidationError::new("invalid_like_type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_post() -> CreatePostRequest {
        CreatePostRequest {
            caption: "an evening hike".to_string(),
            media_urls: vec![],
            media_types: vec![],
            tagged_user_ids: vec![],
            attending_user_ids: vec![],
            participant_ids: vec![],
            comments: vec![],
            questions: vec![],
            answers: vec![],
            likes: vec![],
            reviews: vec![],
        }
    }

    #[test]
    fn mismatched_media_arrays_fail_validation() {
        let mut req = minimal_post();
        req.media_urls = vec![
            "https://cdn.example.com/a.jpg".into(),
            "https://cdn.example.com/b.jpg".into(),
            "https://cdn.example.com/c.mp4".into(),
        ];
        req.media_types = vec!["image".into(), "image".into()];
        assert!(req.validate().is_err());

        req.media_types.push("video".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn answers_must_point_at_a_supplied_question() {
        let mut req = minimal_post();
        req.questions = vec![NewQuestion {
            user_id: 1,
            question: "when do we start?".into(),
        }];
        req.answers = vec![NewAnswer {
            question_index: 1,
            user_id: 2,
            answer: "noon".into(),
        }];
        assert!(req.validate().is_err());

        req.answers[0].question_index = 0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn like_types_are_constrained() {
        let mut req = minimal_post();
        req.likes = vec![NewLike {
            user_id: 1,
            like_type: "D".into(),
        }];
        assert!(req.validate().is_err());
    }
}
