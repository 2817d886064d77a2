// src/store/mod.rs

pub mod post;
pub mod schema;
pub mod user;

pub use post::PostStore;
pub use schema::ensure_schema;
pub use user::UserStore;

use thiserror::Error;

/// Single storage error wrapping the backend failure. No retry happens at
/// this layer; retry policy belongs to the caller.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StoreError(#[from] pub sqlx::Error);

impl StoreError {
    /// Unique-constraint detection for mapping duplicate keys to conflicts.
    /// Postgres reports these as error code 23505.
    pub fn is_unique_violation(&self) -> bool {
        let msg = self.0.to_string();
        msg.contains("unique constraint") || msg.contains("23505") || msg.contains("duplicate key")
    }
}
