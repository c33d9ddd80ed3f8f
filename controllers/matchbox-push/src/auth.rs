//! Bearer-token authorization for the operator role.

use matchbox_push::{AuthDecision, Authorizer, Caller};

/// Grants the operator role to callers presenting one of the configured tokens
#[derive(Debug, Clone)]
pub struct TokenAuthorizer {
    operator_tokens: Vec<String>,
}

impl TokenAuthorizer {
    pub fn new(operator_tokens: Vec<String>) -> Self {
        Self { operator_tokens }
    }
}

#[async_trait::async_trait]
impl Authorizer for TokenAuthorizer {
    async fn authorize(&self, caller: &Caller) -> AuthDecision {
        match caller.bearer_token.as_deref() {
            None => AuthDecision::Deny("missing bearer token".to_string()),
            Some(token) if self.operator_tokens.iter().any(|t| t == token) => AuthDecision::Allow,
            Some(_) => AuthDecision::Deny("operator role required".to_string()),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<String> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty())
        .then(|| token.trim().to_string())
}
