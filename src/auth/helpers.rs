use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{TokenGenerator, parse_token};
use crate::error::Error;
use crate::server::AppState;
use crate::store::Store;
use crate::types::{Owner, Token};

const MAX_LOOKUP_RETRIES: u32 = 3;

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

pub struct ValidatedToken {
    pub token: Token,
    pub owner: Option<Owner>,
}

/// Extracts a token string from a Basic auth header.
/// Expects format: Basic base64(x-token:actual_token)
fn extract_basic_auth_token(header: &str) -> Option<String> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, password) = credentials.split_once(':')?;
    (username == "x-token").then(|| password.to_string())
}

/// Extracts token from Authorization header (Bearer or Basic).
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    if let Some(token) = header.strip_prefix("Bearer ") {
        return Ok(Some(token.trim().to_string()));
    }

    if header.starts_with("Basic ") {
        return extract_basic_auth_token(header)
            .ok_or(TokenValidationError::InvalidToken)
            .map(Some);
    }

    Err(TokenValidationError::InvalidScheme)
}

/// Validates a raw token string against the store and the app clock.
pub fn validate_token(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<ValidatedToken, TokenValidationError> {
    let parts = parse_token(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = state
        .store
        .get_token_by_lookup(parts.lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let generator = TokenGenerator::new();
    if !generator
        .verify(raw_token, &token.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?
    {
        return Err(TokenValidationError::InvalidToken);
    }

    if token
        .expires_at
        .is_some_and(|expires_at| expires_at < state.clock.now())
    {
        return Err(TokenValidationError::TokenExpired);
    }

    let owner = match &token.owner_id {
        Some(owner_id) => state
            .store
            .get_owner(owner_id)
            .map_err(|_| TokenValidationError::InternalError)?,
        None => None,
    };

    if let Err(e) = state.store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(ValidatedToken { token, owner })
}

/// Generates and stores a new token. An unbound token (`owner_id` of
/// `None`) is an admin token. Returns the stored row and the raw secret,
/// which is never persisted.
pub fn issue_token(
    store: &dyn Store,
    owner_id: Option<&str>,
    now: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
) -> crate::error::Result<(Token, String)> {
    let generator = TokenGenerator::new();

    for _ in 0..MAX_LOOKUP_RETRIES {
        let issued = generator.issue()?;
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            is_admin: owner_id.is_none(),
            owner_id: owner_id.map(str::to_string),
            created_at: now,
            expires_at,
            last_used_at: None,
        };

        match store.create_token(&token) {
            Ok(()) => return Ok((token, issued.raw)),
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_issue_token_round_trip() {
        use crate::store::SqliteStore;

        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("stampbook.db")).unwrap();
        store.initialize().unwrap();

        let (token, raw) = issue_token(&store, None, Utc::now(), None).unwrap();
        assert!(token.is_admin);

        let parts = parse_token(&raw).unwrap();
        let stored = store.get_token_by_lookup(parts.lookup).unwrap().unwrap();
        assert_eq!(stored.id, token.id);
        assert!(TokenGenerator::new().verify(&raw, &stored.token_hash).unwrap());
    }

    #[test]
    fn test_bearer_header() {
        let token = extract_token_from_header(Some("Bearer stampbook_abc")).unwrap();
        assert_eq!(token.as_deref(), Some("stampbook_abc"));
    }

    #[test]
    fn test_basic_header_requires_x_token_user() {
        let good = format!("Basic {}", STANDARD.encode("x-token:stampbook_abc"));
        let token = extract_token_from_header(Some(&good)).unwrap();
        assert_eq!(token.as_deref(), Some("stampbook_abc"));

        let bad = format!("Basic {}", STANDARD.encode("owner:stampbook_abc"));
        assert!(matches!(
            extract_token_from_header(Some(&bad)),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_missing_and_unknown_scheme() {
        assert!(extract_token_from_header(None).unwrap().is_none());
        assert!(matches!(
            extract_token_from_header(Some("Digest abc")),
            Err(TokenValidationError::InvalidScheme)
        ));
    }
}
