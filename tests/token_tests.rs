// tests/token_tests.rs

use gatherly_backend::authorizer::{Effect, authorize};
use gatherly_backend::utils::jwt::{TokenError, TokenSigner};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

const SECRET: &str = "unit-test-signing-key";

fn signer() -> TokenSigner {
    TokenSigner::new(SECRET, 3600)
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[derive(Serialize)]
struct RawClaims<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
    iat: usize,
    exp: usize,
}

fn craft(claims: &RawClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn issued_tokens_verify_to_their_subject() {
    let signer = signer();
    let token = signer.issue("alice").unwrap();
    assert_eq!(signer.verify(&token).unwrap(), "alice");
}

#[test]
fn garbage_is_malformed() {
    assert_eq!(
        signer().verify("definitely-not-a-jwt"),
        Err(TokenError::Malformed)
    );
}

#[test]
fn wrong_key_is_signature_invalid() {
    let forged = TokenSigner::new("some-other-key", 3600)
        .issue("mallory")
        .unwrap();
    assert_eq!(signer().verify(&forged), Err(TokenError::SignatureInvalid));
}

#[test]
fn past_expiry_is_expired() {
    // Well beyond the default decode leeway.
    let token = craft(
        &RawClaims {
            sub: Some("alice"),
            iat: now() - 7200,
            exp: now() - 3600,
        },
        SECRET,
    );
    assert_eq!(signer().verify(&token), Err(TokenError::Expired));
}

#[test]
fn absent_subject_is_missing_subject() {
    let token = craft(
        &RawClaims {
            sub: None,
            iat: now(),
            exp: now() + 600,
        },
        SECRET,
    );
    assert_eq!(signer().verify(&token), Err(TokenError::MissingSubject));

    let token = craft(
        &RawClaims {
            sub: Some(""),
            iat: now(),
            exp: now() + 600,
        },
        SECRET,
    );
    assert_eq!(signer().verify(&token), Err(TokenError::MissingSubject));
}

const RESOURCE: &str = "arn:aws:execute-api:us-east-1:123456789012:api/prod/GET/posts/5";

#[test]
fn missing_header_denies_with_generic_principal() {
    let decision = authorize(&signer(), None, RESOURCE);
    assert_eq!(decision.effect(), Effect::Deny);
    assert_eq!(decision.principal_id, "user");
    assert_eq!(
        decision.context.as_ref().unwrap().message,
        "Authorization incorrect"
    );
}

#[test]
fn non_bearer_header_denies() {
    let decision = authorize(&signer(), Some("Basic dXNlcjpwdw=="), RESOURCE);
    assert_eq!(decision.effect(), Effect::Deny);
    assert_eq!(decision.principal_id, "user");
}

#[test]
fn expired_token_denies_with_reason() {
    let token = craft(
        &RawClaims {
            sub: Some("alice"),
            iat: now() - 7200,
            exp: now() - 3600,
        },
        SECRET,
    );
    let decision = authorize(&signer(), Some(&format!("Bearer {token}")), RESOURCE);
    assert_eq!(decision.effect(), Effect::Deny);
    assert_eq!(decision.context.as_ref().unwrap().message, "Token expired");
}

#[test]
fn valid_token_allows_with_subject_principal() {
    let signer = signer();
    let token = signer.issue("alice").unwrap();
    let decision = authorize(&signer, Some(&format!("Bearer {token}")), RESOURCE);

    assert!(decision.is_allow());
    assert_eq!(decision.principal_id, "alice");
    assert!(decision.context.is_none());
}

#[test]
fn decision_serializes_to_the_policy_wire_shape() {
    let signer = signer();
    let token = signer.issue("alice").unwrap();
    let decision = authorize(&signer, Some(&format!("Bearer {token}")), RESOURCE);

    let value = serde_json::to_value(&decision).unwrap();
    assert_eq!(value["principalId"], "alice");
    assert_eq!(value["policyDocument"]["Version"], "2012-10-17");
    let statement = &value["policyDocument"]["Statement"][0];
    assert_eq!(statement["Effect"], "Allow");
    assert_eq!(statement["Action"], "execute-api:Invoke");
    assert_eq!(statement["Resource"], RESOURCE);
    assert!(value.get("context").is_none());
}
