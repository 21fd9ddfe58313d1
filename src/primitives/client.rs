//! Client records and the store administering them.
//!
//! Clients are registered by the host application out of band. During request
//! processing they are read-only: every decision about redirect uris, secrets,
//! grant support and token lifetimes is made against the record as it was
//! fetched at the start of the request.
use std::collections::HashMap;
use std::{fmt, str};

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::scope::Scope;
use super::StoreError;

/// The five grant types a client may be allowed to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// The authorization code grant, optionally bound with a proof key.
    AuthorizationCode,

    /// The implicit grant, issuing tokens straight from the authorize surface.
    Implicit,

    /// The resource owner password credentials grant.
    Password,

    /// The client credentials grant, issuing tokens without a resource owner.
    ClientCredentials,

    /// Exchanging a refresh token for a fresh access token.
    RefreshToken,
}

impl GrantType {
    /// All grant types, the default set for a newly registered client.
    pub fn all() -> Vec<GrantType> {
        vec![
            GrantType::AuthorizationCode,
            GrantType::Implicit,
            GrantType::Password,
            GrantType::ClientCredentials,
            GrantType::RefreshToken,
        ]
    }

    /// The parameter value naming this grant type.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Implicit => "implicit",
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl str::FromStr for GrantType {
    type Err = ();

    fn from_str(string: &str) -> Result<GrantType, ()> {
        match string {
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "implicit" => Ok(GrantType::Implicit),
            "password" => Ok(GrantType::Password),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            "refresh_token" => Ok(GrantType::RefreshToken),
            _ => Err(()),
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered client of the authorization server.
///
/// The secret is an opaque string chosen by the host; whether it is itself a
/// derived value is the host's concern. All token lifetimes are given in
/// seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier, a UUID in its canonical hex-and-dashes form.
    pub id: String,

    /// The client secret checked on the token surface.
    pub secret: String,

    /// Absolute redirect uris registered for this client, matched exactly.
    pub redirect_uris: Vec<String>,

    /// Whether authorize requests must carry a code challenge.
    pub pkce: bool,

    /// Whether requested scopes must also appear in `authorized_scopes`.
    pub authorize_scope: bool,

    /// Scopes this client is allowed when `authorize_scope` is set.
    pub authorized_scopes: Vec<Scope>,

    /// The grant types this client may use.
    pub supported_grant_types: Vec<GrantType>,

    /// Lifetime of issued access tokens.
    pub access_token_ttl: i64,

    /// Lifetime of issued authorization codes.
    pub authorization_code_ttl: i64,

    /// Lifetime of issued refresh tokens.
    pub refresh_token_ttl: i64,

    /// Lifetime of issued id tokens.
    pub id_token_ttl: i64,
}

impl Client {
    /// Create a client with the default lifetimes and all grant types enabled.
    pub fn new(id: &str, secret: &str) -> Client {
        Client {
            id: id.to_string(),
            secret: secret.to_string(),
            redirect_uris: vec![],
            pkce: false,
            authorize_scope: false,
            authorized_scopes: vec![],
            supported_grant_types: GrantType::all(),
            access_token_ttl: 3600,
            authorization_code_ttl: 60,
            refresh_token_ttl: 2_592_000,
            id_token_ttl: 3600,
        }
    }

    /// Register the exact redirect uris the client may use.
    pub fn with_redirect_uris(mut self, uris: &[&str]) -> Client {
        self.redirect_uris = uris.iter().map(|uri| uri.to_string()).collect();
        self
    }

    /// Restrict the client to the given grant types.
    pub fn with_grant_types(mut self, grants: Vec<GrantType>) -> Client {
        self.supported_grant_types = grants;
        self
    }

    /// Restrict requested scopes to the given set.
    pub fn with_authorized_scopes(mut self, scopes: Vec<Scope>) -> Client {
        self.authorize_scope = true;
        self.authorized_scopes = scopes;
        self
    }

    /// Require a proof key on every authorize request.
    pub fn require_pkce(mut self) -> Client {
        self.pkce = true;
        self
    }

    /// Whether the client may use the given grant type.
    pub fn supports(&self, grant: GrantType) -> bool {
        self.supported_grant_types.contains(&grant)
    }

    /// Whether the uri is registered for this client. Exact string match, as
    /// motivated in the rfc; no semantic url normalization is applied.
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|registered| registered == uri)
    }

    /// Check a presented secret against the registered one in constant time.
    pub fn check_secret(&self, secret: &str) -> bool {
        self.secret.as_bytes().ct_eq(secret.as_bytes()).into()
    }

    /// Whether the scope name appears in the client's authorized set.
    pub fn authorizes_scope(&self, name: &str) -> bool {
        self.authorized_scopes.iter().any(|scope| scope.name == name)
    }
}

/// Read access to registered clients.
pub trait ClientStore {
    /// Fetch a client by its identifier.
    fn get_client(&self, id: &str) -> Result<Option<Client>, StoreError>;
}

/// A very simple, in-memory hash map of client ids to client records.
#[derive(Default)]
pub struct ClientMap {
    clients: HashMap<String, Client>,
}

impl ClientMap {
    /// Create an empty map without any clients in it.
    pub fn new() -> ClientMap {
        ClientMap::default()
    }

    /// Insert or update the client record.
    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }
}

impl ClientStore for ClientMap {
    fn get_client(&self, id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(id).cloned())
    }
}
