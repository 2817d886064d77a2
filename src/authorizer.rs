// src/authorizer.rs

use serde::Serialize;

use crate::utils::jwt::TokenSigner;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal used on every Deny so callers never learn whether the token
/// mapped to a real account.
const ANONYMOUS_PRINCIPAL: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub action: &'static str,
    #[serde(rename = "Resource")]
    pub resource: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: &'static str,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    pub message: String,
}

/// The gate's terminal outcome: a principal bound to an Allow or Deny
/// policy over the requested resource, consumed by the request router.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDecision {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,
}

impl AuthDecision {
    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map(|s| s.effect)
            .unwrap_or(Effect::Deny)
    }

    pub fn is_allow(&self) -> bool {
        self.effect() == Effect::Allow
    }

    fn build(principal: &str, effect: Effect, resource: &str, message: Option<String>) -> Self {
        Self {
            principal_id: principal.to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION,
                statement: vec![PolicyStatement {
                    effect,
                    action: INVOKE_ACTION,
                    resource: resource.to_string(),
                }],
            },
            context: message.map(|message| DecisionContext { message }),
        }
    }
}

/// Per-request authorization decision. Stateless and side-effect-free
/// beyond logging: extract the bearer token, verify it, and bind the
/// outcome to the requested resource.
pub fn authorize(
    signer: &TokenSigner,
    authorization: Option<&str>,
    resource: &str,
) -> AuthDecision {
    let token = match authorization {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            tracing::debug!("missing or malformed authorization header");
            return AuthDecision::build(
                ANONYMOUS_PRINCIPAL,
                Effect::Deny,
                resource,
                Some("Authorization incorrect".to_string()),
            );
        }
    };

    match signer.verify(token) {
        Ok(username) => AuthDecision::build(&username, Effect::Allow, resource, None),
        Err(e) => {
            tracing::debug!("token validation error: {e}");
            AuthDecision::build(ANONYMOUS_PRINCIPAL, Effect::Deny, resource, Some(e.to_string()))
        }
    }
}
