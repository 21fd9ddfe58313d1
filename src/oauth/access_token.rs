//! Provides the handling for the token surface.
//!
//! One engine per grant type. All of them resolve and authenticate the client
//! first, then run their grant-specific checks, and only mint a credential
//! once every precondition held. The authorization code engine owns the
//! single-use critical section: the code is claimed through the store's
//! compare-and-swap before the access token is created, so a replayed code
//! never yields a second token.
use log::debug;

use crate::primitives::client::{Client, GrantType};
use crate::primitives::token::{CodeChallengeMethod, Token, TokenStore};

use super::authenticator;
use super::error::{ErrorKind, OauthError};
use super::issuer;
use super::pkce;
use super::request::{
    ClientCredentialsGrant, CodeExchange, Credentials, PasswordGrant, RefreshGrant, TokenRequest,
};
use super::scopes;
use super::{Endpoint, TokenResponse};

/// Run the token engine matching the classified request.
pub fn token(endpoint: &mut dyn Endpoint, request: &TokenRequest) -> Result<TokenResponse, OauthError> {
    match request {
        TokenRequest::AuthorizationCode(request) => code_exchange(endpoint, request),
        TokenRequest::ClientCredentials(request) => client_credentials(endpoint, request),
        TokenRequest::Password(request) => password(endpoint, request),
        TokenRequest::RefreshToken(request) => refresh(endpoint, request),
    }
}

/// Resolve the client, gate the grant and check the secret, in that order.
///
/// The ordering is contractual: an unregistered redirect uri must win over a
/// missing grant type, which must win over a wrong secret.
fn authenticate(
    endpoint: &mut dyn Endpoint, credentials: &Credentials, redirect_uri: Option<&str>,
    grant: GrantType,
) -> Result<Client, OauthError> {
    let client =
        authenticator::resolve_client(endpoint.clients(), &credentials.client_id, redirect_uri)?;

    if !client.supports(grant) {
        debug!("client {} does not support {}", client.id, grant);
        return Err(OauthError::new(
            ErrorKind::UnsupportedGrantType,
            "Client do not support given grant type.",
        ));
    }

    authenticator::check_secret(&client, credentials)?;
    Ok(client)
}

fn bearer(token: Token, now: i64) -> TokenResponse {
    TokenResponse {
        token_type: "bearer".to_string(),
        access_token: token.value,
        expires_in: token.expires_at - now,
        refresh_token: token.refresh_token,
    }
}

fn invalid_code() -> OauthError {
    OauthError::new(ErrorKind::InvalidCode, "Provided authorization code is incorrect.")
}

fn code_exchange(
    endpoint: &mut dyn Endpoint, request: &CodeExchange,
) -> Result<TokenResponse, OauthError> {
    let client = authenticate(
        endpoint,
        &request.credentials,
        Some(&request.redirect_uri),
        GrantType::AuthorizationCode,
    )?;

    let now = endpoint.now();
    let code = endpoint
        .tokens()
        .get_by_value(&request.code)?
        .ok_or_else(invalid_code)?;

    // Expired, revoked, foreign and rebound codes are all reported alike.
    if !code.consumable_by(&client.id, &request.redirect_uri, now) {
        return Err(invalid_code());
    }

    if let Some(stored_hash) = &code.code_challenge_hash {
        let verifier = request
            .code_verifier
            .as_deref()
            .filter(|verifier| !verifier.is_empty())
            .ok_or_else(|| OauthError::new(ErrorKind::InvalidRequest, "PKCE request invalid."))?;

        let method = code.code_challenge_method.unwrap_or(CodeChallengeMethod::Plain);
        if !pkce::verify(stored_hash, method, verifier) {
            debug!("code verifier mismatch for client {}", client.id);
            return Err(OauthError::new(ErrorKind::InvalidRequest, "Code verifier is invalid."));
        }
    }

    // Claim the code before responding; the loser of a concurrent exchange
    // sees it as already revoked.
    endpoint
        .tokens()
        .consume_code(&code.value, now)?
        .ok_or_else(invalid_code)?;

    let token = issuer::create_access_token(
        endpoint.tokens(),
        &client,
        code.sub.as_deref(),
        &code.scope,
        None,
        None,
        true,
        now,
    )?;

    Ok(bearer(token, now))
}

fn client_credentials(
    endpoint: &mut dyn Endpoint, request: &ClientCredentialsGrant,
) -> Result<TokenResponse, OauthError> {
    let client = authenticate(endpoint, &request.credentials, None, GrantType::ClientCredentials)?;

    let scope = scopes::authorize(
        endpoint.scopes(),
        endpoint.resource_owners(),
        &request.scope,
        &client,
        None,
    )?;

    let now = endpoint.now();
    let token =
        issuer::create_access_token(endpoint.tokens(), &client, None, &scope, None, None, false, now)?;

    Ok(bearer(token, now))
}

fn password(endpoint: &mut dyn Endpoint, request: &PasswordGrant) -> Result<TokenResponse, OauthError> {
    let client = authenticate(endpoint, &request.credentials, None, GrantType::Password)?;

    let owner = endpoint
        .resource_owners()
        .by_credentials(&request.username, &request.password)
        .map_err(|_| OauthError::new(ErrorKind::InvalidGrant, "Invalid username or password."))?;

    let scope = scopes::authorize(
        endpoint.scopes(),
        endpoint.resource_owners(),
        &request.scope,
        &client,
        Some(&owner),
    )?;

    let now = endpoint.now();
    let token = issuer::create_access_token(
        endpoint.tokens(),
        &client,
        Some(&owner.sub),
        &scope,
        None,
        None,
        true,
        now,
    )?;

    Ok(bearer(token, now))
}

fn refresh(endpoint: &mut dyn Endpoint, request: &RefreshGrant) -> Result<TokenResponse, OauthError> {
    let client = authenticate(endpoint, &request.credentials, None, GrantType::RefreshToken)?;

    let invalid = || OauthError::new(ErrorKind::InvalidGrant, "Provided refresh token is incorrect.");

    let old = endpoint
        .tokens()
        .get_by_refresh_token(&request.refresh_token)?
        .ok_or_else(invalid)?;

    if old.client_id != client.id || old.revoked_at.is_some() {
        return Err(invalid());
    }

    // The request may narrow the granted scope but never widen it.
    let scope = if request.scope.trim().is_empty() {
        old.scope.clone()
    } else {
        let granted = crate::primitives::scope::split(&old.scope);
        let requested = crate::primitives::scope::split(&request.scope);
        if requested.iter().any(|name| !granted.contains(name)) {
            return Err(OauthError::new(
                ErrorKind::InvalidScope,
                "Given scopes are unknown or unauthorized.",
            ));
        }
        crate::primitives::scope::join(&requested)
    };

    let now = endpoint.now();
    let token = issuer::create_access_token(
        endpoint.tokens(),
        &client,
        old.sub.as_deref(),
        &scope,
        None,
        None,
        true,
        now,
    )?;

    endpoint.tokens().revoke(&old.value, now)?;

    Ok(bearer(token, now))
}
