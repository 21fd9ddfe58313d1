//! End-to-end run of the authorization code grant through the public api:
//! authorize, exchange, userinfo, introspection, refresh and revocation
//! against the in-memory back-ends and the wall clock.

use serde_json::{Map, Value};

use patina_oauth::endpoint::{
    self, AuthorizeApplication, Generic, IntrospectApplication, RevokeApplication,
    TokenApplication, UserinfoApplication,
};
use patina_oauth::oauth::error::OauthError;
use patina_oauth::oauth::request::Envelope;
use patina_oauth::oauth::{AuthorizeResponse, IntrospectResponse, TokenResponse, UserinfoResponse};
use patina_oauth::primitives::client::{Client, ClientMap};
use patina_oauth::primitives::resource_owner::{OwnerError, ResourceOwner, ResourceOwners};
use patina_oauth::primitives::scope::Scope;
use patina_oauth::primitives::token::TokenMap;
use patina_oauth::primitives::ScopeList;

use base64::{engine::general_purpose::STANDARD, Engine};

const CLIENT_ID: &str = "6a022adc-54c8-4c39-9bd4-7172f683ca48";
const SECRET: &str = "VGhpcyBpcyBhIHZlcnkgc2VjdXJlIHBhc3NwaHJhc2UK";
const REDIRECT_URI: &str = "https://client.example/endpoint";

struct SingleUser;

impl ResourceOwners for SingleUser {
    fn by_sub(&self, sub: &str) -> Result<ResourceOwner, OwnerError> {
        if sub == "u1" {
            Ok(ResourceOwner::new("u1").with_username("ada"))
        } else {
            Err(OwnerError::Unknown)
        }
    }

    fn by_credentials(&self, username: &str, password: &str) -> Result<ResourceOwner, OwnerError> {
        if username == "ada" && password == "hunter2" {
            self.by_sub("u1")
        } else {
            Err(OwnerError::Unknown)
        }
    }

    fn authorized_scopes(&self, _: &ResourceOwner) -> Vec<Scope> {
        vec![]
    }

    fn claims(&self, _: &ResourceOwner, _: &str) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("claim".to_string(), Value::Bool(true));
        claims
    }
}

type TestEndpoint = Generic<ClientMap, TokenMap, ScopeList, SingleUser>;

fn fresh_endpoint() -> TestEndpoint {
    let mut clients = ClientMap::new();
    clients.register_client(Client::new(CLIENT_ID, SECRET).with_redirect_uris(&[REDIRECT_URI]));

    let mut scopes = ScopeList::new();
    scopes.register_scope(Scope::public("profile").unwrap());

    Generic {
        clients,
        tokens: TokenMap::new(),
        scopes,
        owners: SingleUser,
    }
}

fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", CLIENT_ID, SECRET)))
}

#[derive(Default)]
struct Sink {
    authorize: Option<Result<AuthorizeResponse, OauthError>>,
    token: Option<Result<TokenResponse, OauthError>>,
    introspect: Option<Result<IntrospectResponse, OauthError>>,
    userinfo: Option<Result<UserinfoResponse, OauthError>>,
    revoke: Option<Result<(), OauthError>>,
}

impl AuthorizeApplication for Sink {
    fn authorize_success(&mut self, response: AuthorizeResponse) {
        self.authorize = Some(Ok(response));
    }

    fn authorize_error(&mut self, error: OauthError) {
        self.authorize = Some(Err(error));
    }
}

impl TokenApplication for Sink {
    fn token_success(&mut self, response: TokenResponse) {
        self.token = Some(Ok(response));
    }

    fn token_error(&mut self, error: OauthError) {
        self.token = Some(Err(error));
    }
}

impl IntrospectApplication for Sink {
    fn introspect_success(&mut self, response: IntrospectResponse) {
        self.introspect = Some(Ok(response));
    }

    fn introspect_error(&mut self, error: OauthError) {
        self.introspect = Some(Err(error));
    }
}

impl UserinfoApplication for Sink {
    fn userinfo_fetched(&mut self, claims: UserinfoResponse) {
        self.userinfo = Some(Ok(claims));
    }

    fn unauthorized(&mut self, error: OauthError) {
        self.userinfo = Some(Err(error));
    }
}

impl RevokeApplication for Sink {
    fn revoke_success(&mut self) {
        self.revoke = Some(Ok(()));
    }

    fn revoke_error(&mut self, error: OauthError) {
        self.revoke = Some(Err(error));
    }
}

#[test]
fn full_code_flow() {
    let mut endpoint = fresh_endpoint();
    let owner = ResourceOwner::new("u1").with_username("ada");

    // Authorize with a proof key.
    let mut sink = Sink::default();
    let authorize = Envelope::new()
        .with_query("response_type", "code")
        .with_query("client_id", CLIENT_ID)
        .with_query("redirect_uri", REDIRECT_URI)
        .with_query("scope", "profile")
        .with_query("state", "opaque")
        .with_query("code_challenge", "a very random verifier");
    endpoint::authorize(&mut endpoint, &authorize, Some(&owner), &mut sink);

    let response = sink.authorize.unwrap().expect("authorize should succeed");
    assert!(response.expires_in > 0);
    let redirect = response.redirect_url().unwrap();
    assert!(redirect.query().unwrap().contains("state=opaque"));
    let code = response.value.clone();

    // Exchange the code, presenting the verifier.
    let mut sink = Sink::default();
    let exchange = Envelope::new()
        .with_body("grant_type", "authorization_code")
        .with_body("code", &code)
        .with_body("redirect_uri", REDIRECT_URI)
        .with_body("code_verifier", "a very random verifier")
        .with_header("authorization", &basic_auth());
    endpoint::token(&mut endpoint, &exchange, &mut sink);

    let grant = sink.token.unwrap().expect("exchange should succeed");
    assert_eq!(grant.token_type, "bearer");
    assert!(grant.expires_in > 0);
    let refresh_token = grant.refresh_token.clone().expect("code exchange issues a refresh token");

    // A second exchange of the same code must fail.
    let mut sink = Sink::default();
    let replay = Envelope::new()
        .with_body("grant_type", "authorization_code")
        .with_body("code", &code)
        .with_body("redirect_uri", REDIRECT_URI)
        .with_body("code_verifier", "a very random verifier")
        .with_header("authorization", &basic_auth());
    endpoint::token(&mut endpoint, &replay, &mut sink);
    let error = sink.token.unwrap().expect_err("code replay must fail");
    assert_eq!(error.description, "Provided authorization code is incorrect.");

    // The issued token identifies the user.
    let mut sink = Sink::default();
    let userinfo = Envelope::new()
        .with_header("authorization", &format!("Bearer {}", grant.access_token));
    endpoint::userinfo(&mut endpoint, &userinfo, &mut sink);

    let claims = sink.userinfo.unwrap().expect("userinfo should succeed");
    assert_eq!(claims.get("sub"), Some(&Value::String("u1".to_string())));
    assert_eq!(claims.get("claim"), Some(&Value::Bool(true)));

    // Introspection projects the same token as active.
    let mut sink = Sink::default();
    let introspect = Envelope::new()
        .with_body("token", &grant.access_token)
        .with_header("authorization", &basic_auth());
    endpoint::introspect(&mut endpoint, &introspect, &mut sink);

    let projection = sink.introspect.unwrap().expect("introspection should succeed");
    assert!(projection.active);
    assert_eq!(projection.scope.as_deref(), Some("profile"));
    assert_eq!(projection.username.as_deref(), Some("ada"));

    // Rotate the token.
    let mut sink = Sink::default();
    let rotate = Envelope::new()
        .with_body("grant_type", "refresh_token")
        .with_body("refresh_token", &refresh_token)
        .with_header("authorization", &basic_auth());
    endpoint::token(&mut endpoint, &rotate, &mut sink);

    let rotated = sink.token.unwrap().expect("refresh should succeed");
    assert_ne!(rotated.access_token, grant.access_token);

    // The old access token is no longer active.
    let mut sink = Sink::default();
    let introspect = Envelope::new()
        .with_body("token", &grant.access_token)
        .with_header("authorization", &basic_auth());
    endpoint::introspect(&mut endpoint, &introspect, &mut sink);
    assert!(!sink.introspect.unwrap().unwrap().active);

    // Revoke the rotated token and confirm it went inactive.
    let mut sink = Sink::default();
    let revoke = Envelope::new()
        .with_body("token", &rotated.access_token)
        .with_header("authorization", &basic_auth());
    endpoint::revoke(&mut endpoint, &revoke, &mut sink);
    sink.revoke.unwrap().expect("revocation should succeed");

    let mut sink = Sink::default();
    let introspect = Envelope::new()
        .with_body("token", &rotated.access_token)
        .with_header("authorization", &basic_auth());
    endpoint::introspect(&mut endpoint, &introspect, &mut sink);
    assert!(!sink.introspect.unwrap().unwrap().active);
}

#[test]
fn password_grant_flow() {
    let mut endpoint = fresh_endpoint();

    let mut sink = Sink::default();
    let request = Envelope::new()
        .with_body("grant_type", "password")
        .with_body("username", "ada")
        .with_body("password", "hunter2")
        .with_body("scope", "profile")
        .with_header("authorization", &basic_auth());
    endpoint::token(&mut endpoint, &request, &mut sink);

    let grant = sink.token.unwrap().expect("password grant should succeed");
    assert!(grant.refresh_token.is_some());

    let mut sink = Sink::default();
    let userinfo = Envelope::new()
        .with_header("authorization", &format!("Bearer {}", grant.access_token));
    endpoint::userinfo(&mut endpoint, &userinfo, &mut sink);
    assert_eq!(
        sink.userinfo.unwrap().unwrap().get("sub"),
        Some(&Value::String("u1".to_string()))
    );
}
