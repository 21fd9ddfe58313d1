//! Credential creation on top of the token store.
//!
//! The engines decide everything about a credential except its handles; these
//! helpers compute the lifetimes from the client record, assemble the stored
//! attributes and hand them to the store. A store failure surfaces as an
//! `invalid_request` envelope carrying the store's own description.
use crate::primitives::client::Client;
use crate::primitives::token::{CodeChallengeMethod, Token, TokenAttributes, TokenKind, TokenStore};

use super::error::OauthError;
use super::pkce;
use super::request::CodeAuthorization;

/// Create an access token for the client, expiring after its access token ttl.
pub(crate) fn create_access_token(
    tokens: &mut dyn TokenStore, client: &Client, sub: Option<&str>, scope: &str,
    redirect_uri: Option<&str>, state: Option<&str>, with_refresh: bool, now: i64,
) -> Result<Token, OauthError> {
    let attrs = TokenAttributes {
        kind: TokenKind::AccessToken,
        client_id: client.id.clone(),
        sub: sub.map(str::to_string),
        redirect_uri: redirect_uri.map(str::to_string),
        scope: scope.to_string(),
        state: state.map(str::to_string),
        issued_at: now,
        expires_at: now + client.access_token_ttl,
        code_challenge_hash: None,
        code_challenge_method: None,
    };
    Ok(tokens.insert(attrs, with_refresh)?)
}

/// Create an authorization code binding the authorize request parameters.
///
/// When the request carried a challenge, only its digest is persisted and the
/// method defaults to `plain`.
pub(crate) fn create_code(
    tokens: &mut dyn TokenStore, client: &Client, request: &CodeAuthorization, sub: &str,
    scope: &str, now: i64,
) -> Result<Token, OauthError> {
    let challenge = request.code_challenge.as_deref().filter(|raw| !raw.is_empty());

    let attrs = TokenAttributes {
        kind: TokenKind::Code,
        client_id: client.id.clone(),
        sub: Some(sub.to_string()),
        redirect_uri: Some(request.redirect_uri.clone()),
        scope: scope.to_string(),
        state: request.state.clone(),
        issued_at: now,
        expires_at: now + client.authorization_code_ttl,
        code_challenge_hash: challenge.map(pkce::hash_challenge),
        code_challenge_method: challenge
            .map(|_| request.code_challenge_method.unwrap_or(CodeChallengeMethod::Plain)),
    };
    Ok(tokens.insert(attrs, false)?)
}
