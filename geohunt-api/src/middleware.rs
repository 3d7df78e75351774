//! Identity Extractors
//!
//! Authentication happens upstream. The gateway forwards the verified player
//! id in `x-player-id` and the caller's role in `x-player-role`; these
//! extractors turn those headers into a typed context and reject requests
//! that lack them. No progress operation is anonymous.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use geohunt_core::PlayerId;

use crate::constants::{ADMIN_ROLE, MAX_ID_LENGTH, PLAYER_ID_HEADER, PLAYER_ROLE_HEADER};
use crate::error::{ApiError, ApiResult};

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerContext {
    pub player_id: PlayerId,
    pub is_admin: bool,
}

impl PlayerContext {
    /// Build the context from forwarded identity headers.
    pub fn from_headers(headers: &HeaderMap) -> ApiResult<Self> {
        let raw = headers
            .get(PLAYER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing player identity"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Player identity is not valid text"))?
            .trim();

        if raw.is_empty() {
            return Err(ApiError::unauthorized("Missing player identity"));
        }
        if raw.len() > MAX_ID_LENGTH {
            return Err(ApiError::unauthorized("Player identity is too long"));
        }

        let is_admin = headers
            .get(PLAYER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE))
            .unwrap_or(false);

        Ok(Self {
            player_id: PlayerId::new(raw),
            is_admin,
        })
    }
}

// ============================================================================
// PLAYER EXTRACTOR
// ============================================================================

/// Any authenticated player.
#[derive(Debug, Clone)]
pub struct PlayerExtractor(pub PlayerContext);

#[async_trait]
impl<S> FromRequestParts<S> for PlayerExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        PlayerContext::from_headers(&parts.headers).map(PlayerExtractor)
    }
}

impl std::ops::Deref for PlayerExtractor {
    type Target = PlayerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// ADMIN EXTRACTOR
// ============================================================================

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminExtractor(pub PlayerContext);

#[async_trait]
impl<S> FromRequestParts<S> for AdminExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = PlayerContext::from_headers(&parts.headers)?;
        if !context.is_admin {
            tracing::warn!(player_id = %context.player_id, "admin route denied");
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminExtractor(context))
    }
}

impl std::ops::Deref for AdminExtractor {
    type Target = PlayerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (key, value) in pairs {
            map.insert(*key, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let err = PlayerContext::from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let blank = PlayerContext::from_headers(&headers(&[(PLAYER_ID_HEADER, "   ")])).unwrap_err();
        assert_eq!(blank.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_player_identity() {
        let context = PlayerContext::from_headers(&headers(&[(PLAYER_ID_HEADER, "alice")])).unwrap();
        assert_eq!(context.player_id, PlayerId::new("alice"));
        assert!(!context.is_admin);
    }

    #[test]
    fn test_admin_role_case_insensitive() {
        let context = PlayerContext::from_headers(&headers(&[
            (PLAYER_ID_HEADER, "ops"),
            (PLAYER_ROLE_HEADER, "Admin"),
        ]))
        .unwrap();
        assert!(context.is_admin);

        let player = PlayerContext::from_headers(&headers(&[
            (PLAYER_ID_HEADER, "bob"),
            (PLAYER_ROLE_HEADER, "player"),
        ]))
        .unwrap();
        assert!(!player.is_admin);
    }
}
