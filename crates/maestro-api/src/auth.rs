use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use maestro_types::Actor;

/// Resolves the caller of a request. Returning `None` rejects the request.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Actor>;
}

/// Maps static bearer tokens to actors.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, Actor>,
}

impl TokenAuthenticator {
    pub fn new(tokens: impl IntoIterator<Item = (String, Actor)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Actor> {
        let token = extract_bearer_token(headers)?;
        self.tokens.get(token).cloned()
    }
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
