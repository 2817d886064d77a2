// src/coordinator.rs

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::models::post::{CreatePostRequest, ParticipantRole, PostAggregate};
use crate::store::{PostStore, StoreError};

/// A child collection that could not be persisted or read.
#[derive(Debug, Clone)]
pub struct CollectionFailure {
    pub collection: &'static str,
    pub message: String,
}

/// Partial-failure outcome of an aggregate operation. The post row (and any
/// collection not listed in `failures`) is durable; there is no
/// cross-collection transaction and no compensating rollback, so the error
/// itemizes exactly which collections made it and which did not.
#[derive(Debug, Clone)]
pub struct AggregateError {
    pub post_id: i64,
    pub failures: Vec<CollectionFailure>,
    pub succeeded: Vec<&'static str>,
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let failed: Vec<&str> = self.failures.iter().map(|f| f.collection).collect();
        write!(
            f,
            "post {}: {} of {} collections failed: {}",
            self.post_id,
            self.failures.len(),
            self.failures.len() + self.succeeded.len(),
            failed.join(", ")
        )
    }
}

impl std::error::Error for AggregateError {}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Post not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

type ChildTask = (&'static str, JoinHandle<Result<(), (&'static str, String)>>);

/// Orchestrates the fan-out of one post aggregate over the entity store.
///
/// The coordinator is the only component that spawns concurrent work: a
/// fixed set of named tasks per operation, joined at a single barrier. Each
/// task owns its slice of the input and a store clone; no lock is held
/// across the fan-out and sibling completion order is unspecified.
#[derive(Debug, Clone)]
pub struct PostCoordinator {
    store: PostStore,
}

impl PostCoordinator {
    pub fn new(store: PostStore) -> Self {
        Self { store }
    }

    /// Persists the aggregate: the post row first (synchronously, to obtain
    /// the identifier every child write depends on), then all child
    /// collections concurrently.
    ///
    /// The join collects every child failure rather than stopping at the
    /// first one. Questions and answers share a task so that answers are
    /// written against the question ids generated moments earlier; if the
    /// question insert fails, the answers are reported failed as well since
    /// they were never attempted.
    pub async fn create_post(
        &self,
        user_id: i64,
        request: CreatePostRequest,
    ) -> Result<i64, CoordinatorError> {
        let post_id = self.store.insert_post(user_id, &request.caption).await?;

        let CreatePostRequest {
            media_urls,
            media_types,
            tagged_user_ids,
            attending_user_ids,
            participant_ids,
            comments,
            questions,
            answers,
            likes,
            reviews,
            ..
        } = request;

        let had_answers = !answers.is_empty();
        let mut tasks: Vec<ChildTask> = Vec::with_capacity(8);

        {
            let store = self.store.clone();
            tasks.push((
                "media",
                tokio::spawn(async move {
                    store
                        .insert_media(post_id, &media_urls, &media_types)
                        .await
                        .map_err(|e| ("media", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "tags",
                tokio::spawn(async move {
                    store
                        .insert_tags(post_id, &tagged_user_ids)
                        .await
                        .map_err(|e| ("tags", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "attendance",
                tokio::spawn(async move {
                    store
                        .insert_participants(post_id, &attending_user_ids, ParticipantRole::Attending)
                        .await
                        .map_err(|e| ("attendance", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "participants",
                tokio::spawn(async move {
                    store
                        .insert_participants(post_id, &participant_ids, ParticipantRole::Participant)
                        .await
                        .map_err(|e| ("participants", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "comments",
                tokio::spawn(async move {
                    store
                        .insert_comments(post_id, &comments)
                        .await
                        .map_err(|e| ("comments", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "questions",
                tokio::spawn(async move {
                    let question_ids = store
                        .insert_questions(post_id, &questions)
                        .await
                        .map_err(|e| ("questions", e.to_string()))?;

                    let mut resolved = Vec::with_capacity(answers.len());
                    for answer in &answers {
                        // Bounds were validated before any write; a miss here
                        // means the request bypassed validation.
                        let question_id = question_ids.get(answer.question_index).copied().ok_or((
                            "answers",
                            format!("question index {} out of range", answer.question_index),
                        ))?;
                        resolved.push((question_id, answer.user_id, answer.answer.clone()));
                    }

                    store
                        .insert_answers(post_id, &resolved)
                        .await
                        .map_err(|e| ("answers", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "likes",
                tokio::spawn(async move {
                    store
                        .insert_likes(post_id, &likes)
                        .await
                        .map_err(|e| ("likes", e.to_string()))
                }),
            ));
        }
        {
            let store = self.store.clone();
            tasks.push((
                "reviews",
                tokio::spawn(async move {
                    store
                        .insert_reviews(post_id, &reviews)
                        .await
                        .map_err(|e| ("reviews", e.to_string()))
                }),
            ));
        }

        let mut failures = Vec::new();
        for (label, handle) in tasks {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err((collection, message))) => {
                    tracing::error!("post {post_id}: {collection} write failed: {message}");
                    failures.push(CollectionFailure { collection, message });
                }
                Err(join_error) => {
                    tracing::error!("post {post_id}: {label} task died: {join_error}");
                    failures.push(CollectionFailure {
                        collection: label,
                        message: format!("task failed to complete: {join_error}"),
                    });
                }
            }
        }

        // The combined task reports one stage; if questions never landed the
        // answers were not attempted either.
        if had_answers
            && failures.iter().any(|f| f.collection == "questions")
            && !failures.iter().any(|f| f.collection == "answers")
        {
            failures.push(CollectionFailure {
                collection: "answers",
                message: "not written: question insert failed".to_string(),
            });
        }

        if failures.is_empty() {
            Ok(post_id)
        } else {
            let succeeded = WRITE_COLLECTIONS
                .iter()
                .copied()
                .filter(|name| failures.iter().all(|f| f.collection != *name))
                .collect();
            Err(AggregateError {
                post_id,
                failures,
                succeeded,
            }
            .into())
        }
    }

    /// Reads the aggregate: the post row plus the nine child collections,
    /// all fetched concurrently and joined once.
    ///
    /// A missing post row fails the whole call with NotFound. Any child
    /// read failure fails the call with an error naming every failed
    /// collection; partial sibling results are discarded.
    pub async fn get_post(&self, post_id: i64) -> Result<PostAggregate, CoordinatorError> {
        let store = self.store.clone();
        let post_task = tokio::spawn(async move { store.select_post(post_id).await });
        let store = self.store.clone();
        let media_task = tokio::spawn(async move { store.select_media(post_id).await });
        let store = self.store.clone();
        let tags_task = tokio::spawn(async move { store.select_tags(post_id).await });
        let store = self.store.clone();
        let attendance_task = tokio::spawn(async move {
            store
                .select_participants(post_id, ParticipantRole::Attending)
                .await
        });
        let store = self.store.clone();
        let participants_task = tokio::spawn(async move {
            store
                .select_participants(post_id, ParticipantRole::Participant)
                .await
        });
        let store = self.store.clone();
        let comments_task = tokio::spawn(async move { store.select_comments(post_id).await });
        let store = self.store.clone();
        let questions_task = tokio::spawn(async move { store.select_questions(post_id).await });
        let store = self.store.clone();
        let answers_task = tokio::spawn(async move { store.select_answers(post_id).await });
        let store = self.store.clone();
        let likes_task = tokio::spawn(async move { store.select_likes(post_id).await });
        let store = self.store.clone();
        let reviews_task = tokio::spawn(async move { store.select_reviews(post_id).await });

        let (
            post_result,
            media_result,
            tags_result,
            attendance_result,
            participants_result,
            comments_result,
            questions_result,
            answers_result,
            likes_result,
            reviews_result,
        ) = tokio::join!(
            post_task,
            media_task,
            tags_task,
            attendance_task,
            participants_task,
            comments_task,
            questions_task,
            answers_task,
            likes_task,
            reviews_task,
        );

        let mut failures = Vec::new();

        let post = collect("post", post_result, &mut failures);
        let media = collect("media", media_result, &mut failures);
        let tagged_user_ids = collect("tags", tags_result, &mut failures);
        let attending_user_ids = collect("attendance", attendance_result, &mut failures);
        let participant_ids = collect("participants", participants_result, &mut failures);
        let comments = collect("comments", comments_result, &mut failures);
        let questions = collect("questions", questions_result, &mut failures);
        let answers = collect("answers", answers_result, &mut failures);
        let likes = collect("likes", likes_result, &mut failures);
        let reviews = collect("reviews", reviews_result, &mut failures);

        // Not-found wins over sibling failures: there is no aggregate to be
        // partially complete about.
        if let Some(None) = post {
            return Err(CoordinatorError::NotFound);
        }

        if !failures.is_empty() {
            let succeeded = READ_COLLECTIONS
                .iter()
                .copied()
                .filter(|name| failures.iter().all(|f| f.collection != *name))
                .collect();
            return Err(AggregateError {
                post_id,
                failures,
                succeeded,
            }
            .into());
        }

        // All reads succeeded and the post row exists.
        let Some(Some(post)) = post else {
            return Err(CoordinatorError::NotFound);
        };
        let (media_urls, media_types): (Vec<String>, Vec<String>) =
            media.unwrap_or_default().into_iter().unzip();

        Ok(PostAggregate {
            post_id: post.post_id,
            user_id: post.user_id,
            caption: post.caption,
            shares: post.shares,
            media_urls,
            media_types,
            tagged_user_ids: tagged_user_ids.unwrap_or_default(),
            attending_user_ids: attending_user_ids.unwrap_or_default(),
            participant_ids: participant_ids.unwrap_or_default(),
            comments: comments.unwrap_or_default(),
            questions: questions.unwrap_or_default(),
            answers: answers.unwrap_or_default(),
            likes: likes.unwrap_or_default(),
            reviews: reviews.unwrap_or_default(),
        })
    }
}

const WRITE_COLLECTIONS: [&str; 9] = [
    "media",
    "tags",
    "attendance",
    "participants",
    "comments",
    "questions",
    "answers",
    "likes",
    "reviews",
];

const READ_COLLECTIONS: [&str; 10] = [
    "post",
    "media",
    "tags",
    "attendance",
    "participants",
    "comments",
    "questions",
    "answers",
    "likes",
    "reviews",
];

/// Unwraps one joined read task, recording a named failure for either a
/// storage error or a task that died before reporting.
fn collect<T>(
    collection: &'static str,
    joined: Result<Result<T, StoreError>, JoinError>,
    failures: &mut Vec<CollectionFailure>,
) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(store_error)) => {
            tracing::error!("{collection} read failed: {store_error}");
            failures.push(CollectionFailure {
                collection,
                message: store_error.to_string(),
            });
            None
        }
        Err(join_error) => {
            tracing::error!("{collection} read task died: {join_error}");
            failures.push(CollectionFailure {
                collection,
                message: format!("task failed to complete: {join_error}"),
            });
            None
        }
    }
}
