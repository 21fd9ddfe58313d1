//! The OpenID Connect userinfo endpoint.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::primitives::token::{TokenKind, TokenStore};

use super::error::{ErrorKind, OauthError};
use super::request::UserinfoRequest;
use super::{Endpoint, UserinfoResponse};

static BEARER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Bearer (\S+)$").expect("pattern is valid"));

/// Assemble the identity claims behind a bearer token.
///
/// The claim map is whatever the directory supplies for the token's scope,
/// with the `sub` claim always set from the resolved owner; the directory
/// cannot override it.
pub fn userinfo(
    endpoint: &mut dyn Endpoint, request: &UserinfoRequest,
) -> Result<UserinfoResponse, OauthError> {
    let invalid_bearer =
        || OauthError::new(ErrorKind::InvalidBearer, "Invalid bearer from Authorization header.");

    let header = request.authorization.as_deref().ok_or_else(invalid_bearer)?;
    let value = BEARER
        .captures(header)
        .and_then(|captures| captures.get(1))
        .ok_or_else(invalid_bearer)?
        .as_str();

    let now = endpoint.now();
    let token = endpoint
        .tokens()
        .get_by_value(value)?
        .filter(|token| token.kind == TokenKind::AccessToken && token.active(now))
        .ok_or_else(|| {
            OauthError::new(ErrorKind::InvalidAccessToken, "Provided access token is invalid.")
        })?;

    // Tokens without a subject (client credentials) identify no end-user.
    let sub = token.sub.as_deref().ok_or_else(invalid_bearer)?;
    let owner = endpoint
        .resource_owners()
        .by_sub(sub)
        .map_err(|_| invalid_bearer())?;

    let mut claims = endpoint.resource_owners().claims(&owner, &token.scope);
    claims.insert("sub".to_string(), Value::String(owner.sub));

    Ok(claims)
}
