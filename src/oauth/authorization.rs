//! Provides the handling for the authorize surface.
//!
//! Two engines live here: the authorization code grant, which persists a
//! single-use code, and the implicit grant, which issues an access token
//! straight away. Both run the same precondition chain of client and redirect
//! uri resolution, grant-support gate, resource owner presence and scope
//! resolution, and differ in the credential they mint and in how their
//! outcome is rendered on the redirect (query for codes, fragment for
//! tokens).
use log::debug;

use crate::primitives::client::GrantType;
use crate::primitives::resource_owner::ResourceOwner;

use super::authenticator;
use super::error::{ErrorFormat, ErrorKind, OauthError};
use super::issuer;
use super::request::{AuthorizeRequest, CodeAuthorization, ImplicitAuthorization};
use super::scopes;
use super::{AuthorizeResponse, Endpoint, ResponseKind};

/// Run the authorize engine matching the classified request.
///
/// The resource owner is whatever principal the host's session layer has
/// established; `None` when nobody is logged in.
pub fn authorize(
    endpoint: &mut dyn Endpoint, request: &AuthorizeRequest, owner: Option<&ResourceOwner>,
) -> Result<AuthorizeResponse, OauthError> {
    match request {
        AuthorizeRequest::Code(request) => authorization_code(endpoint, request, owner),
        AuthorizeRequest::Implicit(request) => implicit(endpoint, request, owner),
    }
}

fn authorization_code(
    endpoint: &mut dyn Endpoint, request: &CodeAuthorization, owner: Option<&ResourceOwner>,
) -> Result<AuthorizeResponse, OauthError> {
    let redirected = |error: OauthError| {
        error.with_redirect(ErrorFormat::Query, &request.redirect_uri, request.state.as_deref())
    };

    let client = authenticator::resolve_client(
        endpoint.clients(),
        &request.client_id,
        Some(&request.redirect_uri),
    )
    .map_err(redirected)?;

    if !client.supports(GrantType::AuthorizationCode) {
        return Err(redirected(OauthError::new(
            ErrorKind::UnsupportedGrantType,
            "Client do not support given grant type.",
        )));
    }

    // The proof key gate runs before the owner is consulted, so a client
    // misconfiguration is reported even on anonymous requests.
    let challenge_missing = request
        .code_challenge
        .as_deref()
        .map_or(true, str::is_empty);
    if client.pkce && challenge_missing {
        debug!("client {} requires a code challenge", client.id);
        return Err(redirected(OauthError::new(
            ErrorKind::InvalidRequest,
            "Code challenge is invalid.",
        )));
    }

    let owner = present_owner(owner, request.prompt.as_deref()).map_err(redirected)?;

    let scope = scopes::authorize(
        endpoint.scopes(),
        endpoint.resource_owners(),
        &request.scope,
        &client,
        Some(owner),
    )
    .map_err(redirected)?;

    let now = endpoint.now();
    let code = issuer::create_code(endpoint.tokens(), &client, request, &owner.sub, &scope, now)
        .map_err(redirected)?;

    Ok(AuthorizeResponse {
        kind: ResponseKind::Code,
        value: code.value,
        expires_in: code.expires_at - now,
        state: request.state.clone(),
        redirect_uri: request.redirect_uri.clone(),
        code_challenge: request.code_challenge.clone().filter(|raw| !raw.is_empty()),
        code_challenge_method: code.code_challenge_method,
    })
}

fn implicit(
    endpoint: &mut dyn Endpoint, request: &ImplicitAuthorization, owner: Option<&ResourceOwner>,
) -> Result<AuthorizeResponse, OauthError> {
    let redirected = |error: OauthError| {
        error.with_redirect(
            ErrorFormat::Fragment,
            &request.redirect_uri,
            request.state.as_deref(),
        )
    };

    let client = authenticator::resolve_client(
        endpoint.clients(),
        &request.client_id,
        Some(&request.redirect_uri),
    )
    .map_err(redirected)?;

    if !client.supports(GrantType::Implicit) {
        return Err(redirected(OauthError::new(
            ErrorKind::UnsupportedGrantType,
            "Client do not support given grant type.",
        )));
    }

    let owner = present_owner(owner, request.prompt.as_deref()).map_err(redirected)?;

    let scope = scopes::authorize(
        endpoint.scopes(),
        endpoint.resource_owners(),
        &request.scope,
        &client,
        Some(owner),
    )
    .map_err(redirected)?;

    let now = endpoint.now();
    let token = issuer::create_access_token(
        endpoint.tokens(),
        &client,
        Some(&owner.sub),
        &scope,
        Some(&request.redirect_uri),
        request.state.as_deref(),
        false,
        now,
    )
    .map_err(redirected)?;

    Ok(AuthorizeResponse {
        kind: ResponseKind::Token,
        value: token.value,
        expires_in: token.expires_at - now,
        state: request.state.clone(),
        redirect_uri: request.redirect_uri.clone(),
        code_challenge: None,
        code_challenge_method: None,
    })
}

fn present_owner<'a>(
    owner: Option<&'a ResourceOwner>, prompt: Option<&str>,
) -> Result<&'a ResourceOwner, OauthError> {
    match owner {
        Some(owner) if !owner.sub.is_empty() => Ok(owner),
        _ if prompt == Some("none") => {
            Err(OauthError::new(ErrorKind::LoginRequired, "User is not logged in."))
        }
        _ => Err(OauthError::new(
            ErrorKind::InvalidResourceOwner,
            "Resource owner is invalid.",
        )),
    }
}
