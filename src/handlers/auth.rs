// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, ResetPasswordRequest, User},
    store::UserStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Principal, TokenSigner},
    },
};

/// Resolves a login identifier: anything containing '@' is an email,
/// everything else is treated as a phone number.
async fn find_by_email_or_phone(
    store: &UserStore,
    email_or_phone: &str,
) -> Result<Option<User>, AppError> {
    let user = if email_or_phone.contains('@') {
        store.find_by_email(email_or_phone).await?
    } else {
        store.find_by_phone(email_or_phone).await?
    };
    Ok(user)
}

/// Registers a new user.
///
/// Every field validator runs; their failures are merged so the caller
/// sees all violations at once. The password is hashed with Argon2 before
/// it touches storage, and a token is issued for the fresh account.
pub async fn register(
    State(pool): State<PgPool>,
    State(signer): State<TokenSigner>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let store = UserStore::new(pool);
    let user_id = store
        .insert_user(&payload, &hashed_password)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(format!("Username '{}' already exists", payload.username))
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            }
        })?;

    let token = signer
        .issue(&payload.username)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "userId": user_id, "token": token })),
    ))
}

/// Authenticates a user by email or phone and returns an identity token.
pub async fn login(
    State(pool): State<PgPool>,
    State(signer): State<TokenSigner>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.email_or_phone.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email or phone number and password are required".to_string(),
        ));
    }

    let store = UserStore::new(pool);
    let user = find_by_email_or_phone(&store, &payload.email_or_phone).await?;

    // Unknown account and wrong password are indistinguishable on purpose.
    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password)? => user,
        _ => return Err(AppError::AuthError("Invalid credentials".to_string())),
    };

    let token = signer
        .issue(&user.username)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "token": token })))
}

/// Replaces the password of the authenticated account. The principal comes
/// from the verified token, never from the body.
pub async fn reset_password(
    State(pool): State<PgPool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let store = UserStore::new(pool);
    let hashed_password = hash_password(&payload.new_password)?;

    let rows = store
        .update_password(&principal.0, &hashed_password)
        .await?;
    if rows == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Password updated successfully"
    })))
}
