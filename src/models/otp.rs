// src/models/otp.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents a row of the 'otp_table' table. Several records may exist per
/// user; validation only ever consults the newest one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: i64,
    pub user_id: i64,
    pub otp: String,
    pub expiry_time: chrono::DateTime<chrono::Utc>,
}

/// DTO for requesting a one-time code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest {
    pub email_or_phone: String,
}

/// DTO for redeeming a one-time code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email_or_phone: String,
    pub otp: String,
}
