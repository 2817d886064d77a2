// src/handlers/otp.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    models::otp::{RequestOtpRequest, VerifyOtpRequest},
    notifier::Notifier,
    store::UserStore,
    utils::jwt::TokenSigner,
};

/// A 6-digit numeric code, uniform over [100000, 999999].
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Issues a one-time code for the account behind an email or phone number.
///
/// The code is persisted with a fixed TTL and handed to the notifier for
/// delivery; a delivery failure is logged but never rolls issuance back.
/// Earlier codes stay on record, though only the newest one can be
/// redeemed.
pub async fn request_otp(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(notifier): State<Arc<dyn Notifier>>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = UserStore::new(pool);
    let user = lookup(&store, &payload.email_or_phone)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let code = generate_code();
    let expiry_time = Utc::now() + Duration::minutes(config.otp_ttl_minutes);
    store.insert_otp(user.id, &code, expiry_time).await?;

    if let Err(e) = notifier.deliver(&payload.email_or_phone, &code).await {
        tracing::warn!("OTP delivery to {} failed: {e}", payload.email_or_phone);
    }

    Ok(Json(json!({ "status": "success", "otp": code })))
}

/// Redeems a one-time code. Only the most recently issued record counts,
/// and it must both match and still be inside its TTL; on success the
/// token service issues an identity token, same as a password login.
pub async fn verify_otp(
    State(pool): State<PgPool>,
    State(signer): State<TokenSigner>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = UserStore::new(pool);
    let user = lookup(&store, &payload.email_or_phone)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let valid = match store.latest_otp(user.id).await? {
        Some(record) => record.otp == payload.otp && record.expiry_time > Utc::now(),
        None => false,
    };

    if !valid {
        return Err(AppError::AuthError("Invalid or expired OTP".to_string()));
    }

    let token = signer
        .issue(&user.username)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "token": token })))
}

async fn lookup(
    store: &UserStore,
    email_or_phone: &str,
) -> Result<Option<crate::models::user::User>, AppError> {
    let user = if email_or_phone.contains('@') {
        store.find_by_email(email_or_phone).await?
    } else {
        store.find_by_phone(email_or_phone).await?
    };
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }
}
