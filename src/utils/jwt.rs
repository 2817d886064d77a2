// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Typed verification failures. A bad token never yields a subject; it
/// always maps onto exactly one of these kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    SignatureInvalid,
    #[error("Token expired")]
    Expired,
    #[error("Invalid token: missing subject")]
    MissingSubject,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims. Only the subject is trusted after verification.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Issues and verifies identity tokens with a process-wide symmetric key.
/// Built once during the startup phase and injected; the key is never
/// rotated in-process.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Signs a token for the given username, expiring after the configured
    /// lifetime (one hour by default).
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Signing(e.to_string()))?
            .as_secs() as usize;

        let claims = Claims {
            sub: Some(username.to_owned()),
            iat: issued_at,
            exp: issued_at + self.ttl_seconds as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Parses and signature-checks a token, returning the subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })?;

        data.claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(TokenError::MissingSubject)
    }
}

/// The verified identity injected into request extensions for handlers.
#[derive(Debug, Clone)]
pub struct Principal(pub String);

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// verified `Principal` for downstream handlers. Any failure short-circuits
/// with 401 and the failure's message.
pub async fn auth_middleware(
    State(signer): State<TokenSigner>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(AppError::AuthError("Authorization incorrect".to_string())),
    };

    let username = signer
        .verify(token)
        .map_err(|e| AppError::AuthError(e.to_string()))?;

    req.extensions_mut().insert(Principal(username));
    Ok(next.run(req).await)
}
