//! The protocol state machines and the values they produce.
//!
//! Every engine in this module is a pure function of a typed request and the
//! back-ends reachable through [`Endpoint`]; nothing here owns state, spawns
//! work or keeps locks. Hosts normally do not call the engines directly but go
//! through the entry points in [`crate::endpoint`], which classify an envelope
//! and deliver the outcome to an application callback.

pub mod access_token;
pub(crate) mod authenticator;
pub mod authorization;
pub mod error;
pub mod introspection;
pub(crate) mod issuer;
pub(crate) mod pkce;
pub mod request;
pub(crate) mod schema;
pub(crate) mod scopes;
pub mod revocation;
pub mod userinfo;

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded::Serializer;
use url::Url;

use crate::primitives::client::ClientStore;
use crate::primitives::resource_owner::ResourceOwners;
use crate::primitives::token::{CodeChallengeMethod, TokenStore};
use crate::primitives::ScopeStore;

/// The back-ends one request is processed against.
///
/// An implementation bundles the stores and the identity directory the host
/// chose, and fixes the clock. Every public operation consults it through a
/// `&mut` borrow for the duration of a single request; the repository is the
/// only shared mutable resource, so hosts dispatching concurrent requests
/// synchronize there.
pub trait Endpoint {
    /// Registered clients.
    fn clients(&self) -> &dyn ClientStore;

    /// Issued credentials.
    fn tokens(&mut self) -> &mut dyn TokenStore;

    /// Administered scopes.
    fn scopes(&self) -> &dyn ScopeStore;

    /// The resource owner directory.
    fn resource_owners(&self) -> &dyn ResourceOwners;

    /// Current wall-clock time in seconds since epoch.
    ///
    /// Override in tests to make expiry deterministic.
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Which credential an authorize response delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    /// An authorization code, rendered onto the query component.
    Code,

    /// An access token, rendered onto the fragment component.
    Token,
}

impl ResponseKind {
    /// The `response_type` family this kind answers.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Code => "code",
            ResponseKind::Token => "token",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The successful outcome of an authorize request.
///
/// Carries the raw challenge the client sent so the caller can round-trip it;
/// the stored credential only ever holds the digest.
#[derive(Clone, Debug)]
pub struct AuthorizeResponse {
    /// Whether `value` is a code or an access token.
    pub kind: ResponseKind,

    /// The issued credential handle.
    pub value: String,

    /// Lifetime of the credential in seconds.
    pub expires_in: i64,

    /// Client state to echo on the redirect.
    pub state: Option<String>,

    /// The validated redirect uri of the request.
    pub redirect_uri: String,

    /// The raw proof key challenge from the request, if any.
    pub code_challenge: Option<String>,

    /// The effective challenge method, defaulted to `plain`.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

impl AuthorizeResponse {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = match self.kind {
            ResponseKind::Code => vec![("code", self.value.clone())],
            ResponseKind::Token => vec![
                ("access_token", self.value.clone()),
                ("token_type", "bearer".to_string()),
                ("expires_in", self.expires_in.to_string()),
            ],
        };
        if let Some(state) = &self.state {
            pairs.push(("state", state.clone()));
        }
        pairs
    }

    /// Render the response onto the redirect uri.
    ///
    /// Codes land in the query component, tokens in the fragment, matching
    /// the formats of the respective error envelopes. Returns `None` when the
    /// redirect uri does not parse, which a validated request rules out.
    pub fn redirect_url(&self) -> Option<Url> {
        let mut url: Url = self.redirect_uri.parse().ok()?;
        match self.kind {
            ResponseKind::Code => {
                url.query_pairs_mut().extend_pairs(self.pairs()).finish();
            }
            ResponseKind::Token => {
                let mut serializer = Serializer::new(String::new());
                serializer.extend_pairs(self.pairs());
                url.set_fragment(Some(&serializer.finish()));
            }
        }
        Some(url)
    }
}

/// The successful outcome of a token request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Always `bearer`.
    pub token_type: String,

    /// The issued access token.
    pub access_token: String,

    /// Lifetime of the access token in seconds.
    pub expires_in: i64,

    /// The rotation handle, when the grant issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// The active/inactive projection of an introspected token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntrospectResponse {
    /// Whether the token is currently good for access.
    pub active: bool,

    /// Issued-to client, on active tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Username of the subject, when the directory knows one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Scope string of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Subject of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued-at timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// The issuer identifier of this server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// The claim map returned from the userinfo endpoint.
pub type UserinfoResponse = serde_json::Map<String, serde_json::Value>;
