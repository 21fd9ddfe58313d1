//! Token revocation as specified by rfc 7009.
use log::debug;

use crate::primitives::token::{Token, TokenStore};

use super::authenticator;
use super::error::{ErrorKind, OauthError};
use super::request::RevocationRequest;
use super::Endpoint;

/// Revoke a token handle on behalf of an authenticated client.
///
/// An unknown handle is reported as success, per the rfc: the desired state
/// of the token not being usable already holds. A handle issued to a different
/// client is refused.
pub fn revoke(endpoint: &mut dyn Endpoint, request: &RevocationRequest) -> Result<(), OauthError> {
    let client =
        authenticator::resolve_client(endpoint.clients(), &request.credentials.client_id, None)?;
    authenticator::check_secret(&client, &request.credentials)?;

    let now = endpoint.now();
    let found = lookup(endpoint.tokens(), &request.token, request.token_type_hint.as_deref())?;

    let token = match found {
        Some(token) => token,
        None => {
            debug!("revocation of unknown token, reporting success");
            return Ok(());
        }
    };

    // A foreign-token holder must be indistinguishable from an
    // unauthenticated client.
    if token.client_id != client.id {
        return Err(OauthError::new(
            ErrorKind::InvalidClient,
            "Invalid client_id or client_secret.",
        ));
    }

    endpoint.tokens().revoke(&token.value, now)?;
    Ok(())
}

/// Find the token, trying the hinted handle kind first.
fn lookup(
    tokens: &mut dyn TokenStore, handle: &str, hint: Option<&str>,
) -> Result<Option<Token>, OauthError> {
    let by_refresh_first = hint == Some("refresh_token");

    let first = if by_refresh_first {
        tokens.get_by_refresh_token(handle)?
    } else {
        tokens.get_by_value(handle)?
    };

    if first.is_some() {
        return Ok(first);
    }

    let second = if by_refresh_first {
        tokens.get_by_value(handle)?
    } else {
        tokens.get_by_refresh_token(handle)?
    };
    Ok(second)
}
