use serde_json::{Map, Value};

use crate::endpoint::{
    AuthorizeApplication, IntrospectApplication, RevokeApplication, TokenApplication,
    UserinfoApplication,
};
use crate::oauth::error::OauthError;
use crate::oauth::request::Envelope;
use crate::oauth::{
    AuthorizeResponse, Endpoint, IntrospectResponse, TokenResponse, UserinfoResponse,
};
use crate::primitives::client::{Client, ClientMap, ClientStore};
use crate::primitives::resource_owner::{OwnerError, ResourceOwner, ResourceOwners};
use crate::primitives::scope::Scope;
use crate::primitives::token::{Token, TokenKind, TokenMap, TokenStore};
use crate::primitives::{ScopeList, ScopeStore};

use base64::{engine::general_purpose::STANDARD, Engine};

pub mod defaults {
    pub const EXAMPLE_CLIENT_ID: &str = "6a022adc-54c8-4c39-9bd4-7172f683ca48";
    pub const OTHER_CLIENT_ID: &str = "a1b2c3d4-0000-4000-8000-c0ffeec0ffee";
    pub const EXAMPLE_SECRET: &str = "VGhpcyBpcyBhIHZlcnkgc2VjdXJlIHBhc3NwaHJhc2UK";
    pub const EXAMPLE_REDIRECT_URI: &str = "https://client.example/endpoint";
    pub const OTHER_REDIRECT_URI: &str = "https://client.example/other";
    pub const EXAMPLE_SUB: &str = "s1";
    pub const EXAMPLE_USERNAME: &str = "ada";
    pub const EXAMPLE_PASSWORD: &str = "hunter2";
    pub const NOW: i64 = 1_700_000_000;
}

use self::defaults::*;

/// One registered end-user of the in-memory directory.
struct DirectoryUser {
    owner: ResourceOwner,
    password: String,
    scopes: Vec<Scope>,
    claims: Map<String, Value>,
}

/// In-memory stand-in for the host's identity source.
#[derive(Default)]
pub struct Directory {
    users: Vec<DirectoryUser>,
}

impl Directory {
    fn with_user(
        mut self, owner: ResourceOwner, password: &str, scopes: Vec<Scope>,
        claims: Map<String, Value>,
    ) -> Directory {
        self.users.push(DirectoryUser {
            owner,
            password: password.to_string(),
            scopes,
            claims,
        });
        self
    }
}

impl ResourceOwners for Directory {
    fn by_sub(&self, sub: &str) -> Result<ResourceOwner, OwnerError> {
        self.users
            .iter()
            .find(|user| user.owner.sub == sub)
            .map(|user| user.owner.clone())
            .ok_or(OwnerError::Unknown)
    }

    fn by_credentials(&self, username: &str, password: &str) -> Result<ResourceOwner, OwnerError> {
        self.users
            .iter()
            .find(|user| {
                user.owner.username.as_deref() == Some(username) && user.password == password
            })
            .map(|user| user.owner.clone())
            .ok_or(OwnerError::Unknown)
    }

    fn authorized_scopes(&self, owner: &ResourceOwner) -> Vec<Scope> {
        self.users
            .iter()
            .find(|user| user.owner.sub == owner.sub)
            .map(|user| user.scopes.clone())
            .unwrap_or_default()
    }

    fn claims(&self, owner: &ResourceOwner, _scope: &str) -> Map<String, Value> {
        self.users
            .iter()
            .find(|user| user.owner.sub == owner.sub)
            .map(|user| user.claims.clone())
            .unwrap_or_default()
    }
}

/// A complete endpoint over in-memory back-ends with a frozen clock.
pub struct TestEndpoint {
    pub clients: ClientMap,
    pub tokens: TokenMap,
    pub scopes: ScopeList,
    pub owners: Directory,
    pub now: i64,
}

impl Endpoint for TestEndpoint {
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

    fn now(&self) -> i64 {
        self.now
    }
}

impl TestEndpoint {
    /// The common fixture: one confidential client, one public and one
    /// owner-authorized scope, and one registered end-user.
    pub fn new() -> TestEndpoint {
        let mut clients = ClientMap::new();
        clients.register_client(
            Client::new(EXAMPLE_CLIENT_ID, EXAMPLE_SECRET)
                .with_redirect_uris(&[EXAMPLE_REDIRECT_URI, OTHER_REDIRECT_URI]),
        );

        let mut scopes = ScopeList::new();
        scopes.register_scope(Scope::public("profile").unwrap());
        scopes.register_scope(Scope::private("internal").unwrap());

        let mut claims = Map::new();
        claims.insert("claim".to_string(), Value::Bool(true));

        let owners = Directory::default().with_user(
            ResourceOwner::new(EXAMPLE_SUB).with_username(EXAMPLE_USERNAME),
            EXAMPLE_PASSWORD,
            vec![Scope::private("email").unwrap()],
            claims,
        );

        TestEndpoint {
            clients,
            tokens: TokenMap::new(),
            scopes,
            owners,
            now: NOW,
        }
    }

    /// Replace the example client with a customized record.
    pub fn reconfigure_client(mut self, client: Client) -> TestEndpoint {
        self.clients.register_client(client);
        self
    }

    /// Seed a code bound to the example client and user.
    pub fn import_code(&mut self, value: &str, challenge_hash: Option<String>) -> Token {
        let token = Token {
            kind: TokenKind::Code,
            value: value.to_string(),
            refresh_token: None,
            client_id: EXAMPLE_CLIENT_ID.to_string(),
            sub: Some(EXAMPLE_SUB.to_string()),
            redirect_uri: Some(EXAMPLE_REDIRECT_URI.to_string()),
            scope: "profile".to_string(),
            state: None,
            issued_at: NOW,
            expires_at: NOW + 60,
            revoked_at: None,
            code_challenge_hash: challenge_hash,
            code_challenge_method: None,
        };
        self.tokens.import(token.clone());
        token
    }

    /// Seed an access token with a refresh handle for the example client.
    pub fn import_access_token(&mut self, value: &str, refresh: &str, sub: Option<&str>) -> Token {
        let token = Token {
            kind: TokenKind::AccessToken,
            value: value.to_string(),
            refresh_token: Some(refresh.to_string()),
            client_id: EXAMPLE_CLIENT_ID.to_string(),
            sub: sub.map(str::to_string),
            redirect_uri: None,
            scope: "profile email".to_string(),
            state: None,
            issued_at: NOW,
            expires_at: NOW + 3600,
            revoked_at: None,
            code_challenge_hash: None,
            code_challenge_method: None,
        };
        self.tokens.import(token.clone());
        token
    }
}

/// The example client in its default configuration, ready for customization.
pub fn example_client() -> Client {
    Client::new(EXAMPLE_CLIENT_ID, EXAMPLE_SECRET)
        .with_redirect_uris(&[EXAMPLE_REDIRECT_URI, OTHER_REDIRECT_URI])
}

/// The `authorization` header value for basic client credentials.
pub fn basic_auth(client_id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", client_id, secret)))
}

/// The logged-in example user.
pub fn example_owner() -> ResourceOwner {
    ResourceOwner::new(EXAMPLE_SUB).with_username(EXAMPLE_USERNAME)
}

/// A token-surface envelope authenticated with the example credentials.
pub fn token_envelope(grant_type: &str) -> Envelope {
    Envelope::new()
        .with_body("grant_type", grant_type)
        .with_header("authorization", &basic_auth(EXAMPLE_CLIENT_ID, EXAMPLE_SECRET))
}

// Outcome sinks. Each panics when invoked twice, asserting the
// exactly-one-callback contract of the entry points.

#[derive(Default)]
pub struct AuthorizeSink(Option<Result<AuthorizeResponse, OauthError>>);

impl AuthorizeApplication for AuthorizeSink {
    fn authorize_success(&mut self, response: AuthorizeResponse) {
        assert!(self.0.replace(Ok(response)).is_none(), "callback invoked twice");
    }

    fn authorize_error(&mut self, error: OauthError) {
        assert!(self.0.replace(Err(error)).is_none(), "callback invoked twice");
    }
}

impl AuthorizeSink {
    pub fn into_success(self) -> AuthorizeResponse {
        self.0.expect("no callback").expect("expected authorize_success")
    }

    pub fn into_error(self) -> OauthError {
        self.0.expect("no callback").expect_err("expected authorize_error")
    }
}

#[derive(Default)]
pub struct TokenSink(Option<Result<TokenResponse, OauthError>>);

impl TokenApplication for TokenSink {
    fn token_success(&mut self, response: TokenResponse) {
        assert!(self.0.replace(Ok(response)).is_none(), "callback invoked twice");
    }

    fn token_error(&mut self, error: OauthError) {
        assert!(self.0.replace(Err(error)).is_none(), "callback invoked twice");
    }
}

impl TokenSink {
    pub fn into_success(self) -> TokenResponse {
        self.0.expect("no callback").expect("expected token_success")
    }

    pub fn into_error(self) -> OauthError {
        self.0.expect("no callback").expect_err("expected token_error")
    }
}

#[derive(Default)]
pub struct IntrospectSink(Option<Result<IntrospectResponse, OauthError>>);

impl IntrospectApplication for IntrospectSink {
    fn introspect_success(&mut self, response: IntrospectResponse) {
        assert!(self.0.replace(Ok(response)).is_none(), "callback invoked twice");
    }

    fn introspect_error(&mut self, error: OauthError) {
        assert!(self.0.replace(Err(error)).is_none(), "callback invoked twice");
    }
}

impl IntrospectSink {
    pub fn into_success(self) -> IntrospectResponse {
        self.0.expect("no callback").expect("expected introspect_success")
    }

    pub fn into_error(self) -> OauthError {
        self.0.expect("no callback").expect_err("expected introspect_error")
    }
}

#[derive(Default)]
pub struct UserinfoSink(Option<Result<UserinfoResponse, OauthError>>);

impl UserinfoApplication for UserinfoSink {
    fn userinfo_fetched(&mut self, claims: UserinfoResponse) {
        assert!(self.0.replace(Ok(claims)).is_none(), "callback invoked twice");
    }

    fn unauthorized(&mut self, error: OauthError) {
        assert!(self.0.replace(Err(error)).is_none(), "callback invoked twice");
    }
}

impl UserinfoSink {
    pub fn into_claims(self) -> UserinfoResponse {
        self.0.expect("no callback").expect("expected userinfo_fetched")
    }

    pub fn into_error(self) -> OauthError {
        self.0.expect("no callback").expect_err("expected unauthorized")
    }
}

#[derive(Default)]
pub struct RevokeSink(Option<Result<(), OauthError>>);

impl RevokeApplication for RevokeSink {
    fn revoke_success(&mut self) {
        assert!(self.0.replace(Ok(())).is_none(), "callback invoked twice");
    }

    fn revoke_error(&mut self, error: OauthError) {
        assert!(self.0.replace(Err(error)).is_none(), "callback invoked twice");
    }
}

impl RevokeSink {
    pub fn assert_success(self) {
        self.0.expect("no callback").expect("expected revoke_success");
    }

    pub fn into_error(self) -> OauthError {
        self.0.expect("no callback").expect_err("expected revoke_error")
    }
}
