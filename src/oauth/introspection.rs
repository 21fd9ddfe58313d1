//! Token introspection for client back-ends.
//!
//! The projection deliberately says nothing about *why* a token is inactive;
//! unknown, expired and revoked handles all collapse into `active: false` so
//! the endpoint cannot be used to probe the token space.
use log::debug;

use crate::primitives::token::{TokenKind, TokenStore};

use super::authenticator;
use super::error::{ErrorKind, OauthError, Status};
use super::request::IntrospectionRequest;
use super::{Endpoint, IntrospectResponse};

/// The `iss` claim stamped on every active projection.
pub const ISSUER: &str = "boruta";

/// Introspect a token handle on behalf of an authenticated client.
pub fn introspect(
    endpoint: &mut dyn Endpoint, request: &IntrospectionRequest,
) -> Result<IntrospectResponse, OauthError> {
    // On this surface a client that cannot be authenticated is a malformed
    // request, not an invalid_client envelope.
    let demote = |error: OauthError| match error.status {
        Status::InternalServerError => error,
        _ => OauthError::new(ErrorKind::InvalidRequest, error.description),
    };

    let client =
        authenticator::resolve_client(endpoint.clients(), &request.credentials.client_id, None)
            .map_err(demote)?;
    authenticator::check_secret(&client, &request.credentials).map_err(demote)?;

    let now = endpoint.now();
    let tokens = endpoint.tokens();
    let found = match tokens.get_by_value(&request.token)? {
        Some(token) if token.kind == TokenKind::AccessToken => Some(token),
        _ => tokens
            .get_by_refresh_token(&request.token)?,
    };

    let token = match found {
        Some(token) if token.active(now) => token,
        _ => {
            debug!("introspected token is not active");
            return Ok(inactive());
        }
    };

    let username = token
        .sub
        .as_deref()
        .and_then(|sub| endpoint.resource_owners().by_sub(sub).ok())
        .and_then(|owner| owner.username);

    Ok(IntrospectResponse {
        active: true,
        client_id: Some(token.client_id),
        username,
        scope: Some(token.scope),
        sub: token.sub,
        iat: Some(token.issued_at),
        exp: Some(token.expires_at),
        iss: Some(ISSUER.to_string()),
    })
}

fn inactive() -> IntrospectResponse {
    IntrospectResponse {
        active: false,
        client_id: None,
        username: None,
        scope: None,
        sub: None,
        iat: None,
        exp: None,
        iss: None,
    }
}
