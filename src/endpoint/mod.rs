//! The host-facing surface of the library.
//!
//! A host translates each incoming http request into an [`Envelope`], picks
//! the entry point matching the route, and supplies an application callback
//! for the outcome. The entry points classify the envelope, run the matching
//! protocol engine against the [`Endpoint`] back-ends, and invoke the callback
//! with the single terminal outcome, success or error envelope, exactly
//! once. No entry point panics or returns early without a callback.
use log::debug;

use crate::oauth::error::OauthError;
use crate::oauth::request::{self, Envelope};
use crate::oauth::{
    access_token, authorization, introspection, revocation, userinfo, AuthorizeResponse, Endpoint,
    IntrospectResponse, TokenResponse, UserinfoResponse,
};
use crate::primitives::client::ClientStore;
use crate::primitives::resource_owner::{ResourceOwner, ResourceOwners};
use crate::primitives::token::TokenStore;
use crate::primitives::ScopeStore;

#[cfg(test)]
mod tests;

/// Receives the outcome of an authorize request.
pub trait AuthorizeApplication {
    /// A credential was issued and can be rendered on the redirect uri.
    fn authorize_success(&mut self, response: AuthorizeResponse);

    /// The request failed; the envelope says whether and how to redirect.
    fn authorize_error(&mut self, error: OauthError);
}

/// Receives the outcome of a token request.
pub trait TokenApplication {
    /// An access token was issued.
    fn token_success(&mut self, response: TokenResponse);

    /// The request failed.
    fn token_error(&mut self, error: OauthError);
}

/// Receives the outcome of an introspection request.
pub trait IntrospectApplication {
    /// The projection of the presented handle.
    fn introspect_success(&mut self, response: IntrospectResponse);

    /// The request failed.
    fn introspect_error(&mut self, error: OauthError);
}

/// Receives the outcome of a userinfo request.
pub trait UserinfoApplication {
    /// The claim map for the token's subject.
    fn userinfo_fetched(&mut self, claims: UserinfoResponse);

    /// The bearer did not authenticate an end-user.
    fn unauthorized(&mut self, error: OauthError);
}

/// Receives the outcome of a revocation request.
pub trait RevokeApplication {
    /// The handle is not usable anymore (or never was).
    fn revoke_success(&mut self);

    /// The request failed.
    fn revoke_error(&mut self, error: OauthError);
}

/// Process an authorize-surface request.
///
/// The resource owner is the principal the host's session layer established,
/// `None` when nobody is logged in.
pub fn authorize(
    endpoint: &mut dyn Endpoint, envelope: &Envelope, owner: Option<&ResourceOwner>,
    application: &mut dyn AuthorizeApplication,
) {
    let outcome = request::authorize_request(envelope)
        .and_then(|request| authorization::authorize(endpoint, &request, owner));

    match outcome {
        Ok(response) => application.authorize_success(response),
        Err(error) => {
            debug!("authorize request failed: {}", error);
            application.authorize_error(error)
        }
    }
}

/// Process a token-surface request.
pub fn token(endpoint: &mut dyn Endpoint, envelope: &Envelope, application: &mut dyn TokenApplication) {
    let outcome = request::token_request(envelope)
        .and_then(|request| access_token::token(endpoint, &request));

    match outcome {
        Ok(response) => application.token_success(response),
        Err(error) => {
            debug!("token request failed: {}", error);
            application.token_error(error)
        }
    }
}

/// Process an introspection request.
pub fn introspect(
    endpoint: &mut dyn Endpoint, envelope: &Envelope, application: &mut dyn IntrospectApplication,
) {
    let outcome = request::introspection_request(envelope)
        .and_then(|request| introspection::introspect(endpoint, &request));

    match outcome {
        Ok(response) => application.introspect_success(response),
        Err(error) => {
            debug!("introspection request failed: {}", error);
            application.introspect_error(error)
        }
    }
}

/// Process a userinfo request.
pub fn userinfo(
    endpoint: &mut dyn Endpoint, envelope: &Envelope, application: &mut dyn UserinfoApplication,
) {
    let request = request::userinfo_request(envelope);

    match userinfo::userinfo(endpoint, &request) {
        Ok(claims) => application.userinfo_fetched(claims),
        Err(error) => {
            debug!("userinfo request failed: {}", error);
            application.unauthorized(error)
        }
    }
}

/// Process a revocation request.
pub fn revoke(endpoint: &mut dyn Endpoint, envelope: &Envelope, application: &mut dyn RevokeApplication) {
    let outcome = request::revocation_request(envelope)
        .and_then(|request| revocation::revoke(endpoint, &request));

    match outcome {
        Ok(()) => application.revoke_success(),
        Err(error) => {
            debug!("revocation request failed: {}", error);
            application.revoke_error(error)
        }
    }
}

/// An endpoint assembled from owned back-ends.
///
/// The simplest complete deployment: pick a store implementation per field
/// and the struct is ready to be handed to the entry points. Time is read
/// from the wall clock; implement [`Endpoint`] directly to control it.
pub struct Generic<C, T, S, O> {
    /// The client store.
    pub clients: C,

    /// The token store.
    pub tokens: T,

    /// The scope store.
    pub scopes: S,

    /// The resource owner directory.
    pub owners: O,
}

impl<C, T, S, O> Endpoint for Generic<C, T, S, O>
where
    C: ClientStore,
    T: TokenStore,
    S: ScopeStore,
    O: ResourceOwners,
{
    fn clients(&self) -> &dyn ClientStore {
        &self.clients
    }

    fn tokens(&mut self) -> &mut dyn TokenStore {
        &mut self.tokens
    }

    fn scopes(&self) -> &dyn ScopeStore {
        &self.scopes
    }

    fn resource_owners(&self) -> &dyn ResourceOwners {
        &self.owners
    }
}
