//! Classification of http-shaped envelopes into typed grant requests.
//!
//! The host hands the core an [`Envelope`] of parameter bags; classification
//! reads the discriminating parameter (`response_type` on the authorize
//! surface, `grant_type` on the token surface), validates the matching schema
//! and produces exactly one variant of the typed request sums. Every variant
//! carries only the fields of its own grant.
use std::collections::HashMap;

use crate::primitives::token::CodeChallengeMethod;

use super::authenticator;
use super::error::OauthError;
use super::schema;

/// An inbound request as the host transport saw it.
///
/// Header names are expected lowercase, as transports normalize them; lookup
/// takes the first pair with a matching name.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Parameters from the url query component.
    pub query_params: HashMap<String, String>,

    /// Parameters from a `x-www-form-urlencoded` body.
    pub body_params: HashMap<String, String>,

    /// Ordered header pairs with lowercase names.
    pub req_headers: Vec<(String, String)>,
}

impl Envelope {
    /// An empty envelope.
    pub fn new() -> Envelope {
        Envelope::default()
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: &str, value: &str) -> Envelope {
        self.query_params.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a body parameter.
    pub fn with_body(mut self, key: &str, value: &str) -> Envelope {
        self.body_params.insert(key.to_string(), value.to_string());
        self
    }

    /// Append a header pair. The name is lowercased.
    pub fn with_header(mut self, name: &str, value: &str) -> Envelope {
        self.req_headers.push((name.to_lowercase(), value.to_string()));
        self
    }

    /// First header value with the given lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.req_headers
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Client identification material presented with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// The presented client identifier.
    pub client_id: String,

    /// The presented secret, absent on the browser surface and for public
    /// clients.
    pub client_secret: Option<String>,
}

/// A validated authorize-surface request.
#[derive(Clone, Debug)]
pub enum AuthorizeRequest {
    /// `response_type=code`.
    Code(CodeAuthorization),

    /// `response_type=token` or `response_type=id_token`.
    Implicit(ImplicitAuthorization),
}

impl AuthorizeRequest {
    /// The client identifier, independent of the grant.
    pub fn client_id(&self) -> &str {
        match self {
            AuthorizeRequest::Code(request) => &request.client_id,
            AuthorizeRequest::Implicit(request) => &request.client_id,
        }
    }

    /// The presented redirect uri, independent of the grant.
    pub fn redirect_uri(&self) -> &str {
        match self {
            AuthorizeRequest::Code(request) => &request.redirect_uri,
            AuthorizeRequest::Implicit(request) => &request.redirect_uri,
        }
    }
}

/// Parameters of an authorization code request.
#[derive(Clone, Debug)]
pub struct CodeAuthorization {
    /// The requesting client.
    pub client_id: String,

    /// The uri to deliver the code to.
    pub redirect_uri: String,

    /// Requested scope string, empty when absent.
    pub scope: String,

    /// Opaque client state.
    pub state: Option<String>,

    /// OpenID Connect prompt parameter; `none` demands a silent flow.
    pub prompt: Option<String>,

    /// The proof key challenge, when the client binds the exchange.
    pub code_challenge: Option<String>,

    /// The method the challenge was derived with.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

/// Parameters of an implicit grant request.
#[derive(Clone, Debug)]
pub struct ImplicitAuthorization {
    /// `token` or `id_token`.
    pub response_type: String,

    /// The requesting client.
    pub client_id: String,

    /// The uri to deliver the token to.
    pub redirect_uri: String,

    /// Requested scope string, empty when absent.
    pub scope: String,

    /// Opaque client state.
    pub state: Option<String>,

    /// OpenID Connect prompt parameter.
    pub prompt: Option<String>,
}

/// A validated token-surface request.
#[derive(Clone, Debug)]
pub enum TokenRequest {
    /// `grant_type=authorization_code`.
    AuthorizationCode(CodeExchange),

    /// `grant_type=client_credentials`.
    ClientCredentials(ClientCredentialsGrant),

    /// `grant_type=password`.
    Password(PasswordGrant),

    /// `grant_type=refresh_token`.
    RefreshToken(RefreshGrant),
}

/// Exchange of an authorization code for an access token.
#[derive(Clone, Debug)]
pub struct CodeExchange {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// The code to exchange.
    pub code: String,

    /// Must equal the uri the code was bound to.
    pub redirect_uri: String,

    /// The proof key verifier, required when the code carries a challenge.
    pub code_verifier: Option<String>,
}

/// Token request on the client's own behalf.
#[derive(Clone, Debug)]
pub struct ClientCredentialsGrant {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// Requested scope string, empty when absent.
    pub scope: String,
}

/// Token request from resource owner credentials.
#[derive(Clone, Debug)]
pub struct PasswordGrant {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// Resource owner login.
    pub username: String,

    /// Resource owner password.
    pub password: String,

    /// Requested scope string, empty when absent.
    pub scope: String,
}

/// Rotation of a refresh token.
#[derive(Clone, Debug)]
pub struct RefreshGrant {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// The refresh token to rotate.
    pub refresh_token: String,

    /// Narrowed scope string, empty to keep the original scope.
    pub scope: String,
}

/// A validated introspection request.
#[derive(Clone, Debug)]
pub struct IntrospectionRequest {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// The handle to introspect, access or refresh.
    pub token: String,
}

/// A validated revocation request.
#[derive(Clone, Debug)]
pub struct RevocationRequest {
    /// Presented client credentials.
    pub credentials: Credentials,

    /// The handle to revoke.
    pub token: String,

    /// Client's guess which kind of handle it is.
    pub token_type_hint: Option<String>,
}

/// A userinfo request; only the authorization header matters.
#[derive(Clone, Debug)]
pub struct UserinfoRequest {
    /// The raw `authorization` header value, if any.
    pub authorization: Option<String>,
}

fn get(params: &HashMap<String, String>, key: &str) -> String {
    params.get(key).cloned().unwrap_or_default()
}

fn maybe(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).cloned()
}

/// Merge basic-auth credentials over the body parameters.
///
/// The header wins over the body so a client cannot present two diverging
/// identities in one request.
fn merged_params(envelope: &Envelope) -> Result<HashMap<String, String>, OauthError> {
    let mut params = envelope.body_params.clone();

    if let Some((client_id, client_secret)) = authenticator::basic_credentials(envelope)? {
        params.insert("client_id".to_string(), client_id);
        params.insert("client_secret".to_string(), client_secret);
    }

    Ok(params)
}

fn credentials(params: &HashMap<String, String>) -> Credentials {
    Credentials {
        client_id: get(params, "client_id"),
        client_secret: maybe(params, "client_secret"),
    }
}

/// Classify an authorize-surface envelope.
pub fn authorize_request(envelope: &Envelope) -> Result<AuthorizeRequest, OauthError> {
    let params = &envelope.query_params;
    schema::validate(&schema::AUTHORIZE_BASE, params)?;

    match params["response_type"].as_str() {
        "code" => {
            schema::validate(&schema::CODE_AUTHORIZE, params)?;
            Ok(AuthorizeRequest::Code(CodeAuthorization {
                client_id: get(params, "client_id"),
                redirect_uri: get(params, "redirect_uri"),
                scope: get(params, "scope"),
                state: maybe(params, "state"),
                prompt: maybe(params, "prompt"),
                code_challenge: maybe(params, "code_challenge"),
                code_challenge_method: params
                    .get("code_challenge_method")
                    .and_then(|method| method.parse().ok()),
            }))
        }
        response_type => {
            schema::validate(&schema::IMPLICIT_AUTHORIZE, params)?;
            Ok(AuthorizeRequest::Implicit(ImplicitAuthorization {
                response_type: response_type.to_string(),
                client_id: get(params, "client_id"),
                redirect_uri: get(params, "redirect_uri"),
                scope: get(params, "scope"),
                state: maybe(params, "state"),
                prompt: maybe(params, "prompt"),
            }))
        }
    }
}

/// Classify a token-surface envelope.
pub fn token_request(envelope: &Envelope) -> Result<TokenRequest, OauthError> {
    let params = merged_params(envelope)?;
    schema::validate(&schema::TOKEN_BASE, &params)?;

    match params["grant_type"].as_str() {
        "authorization_code" => {
            schema::validate(&schema::AUTHORIZATION_CODE, &params)?;
            Ok(TokenRequest::AuthorizationCode(CodeExchange {
                credentials: credentials(&params),
                code: get(&params, "code"),
                redirect_uri: get(&params, "redirect_uri"),
                code_verifier: maybe(&params, "code_verifier"),
            }))
        }
        "client_credentials" => {
            schema::validate(&schema::CLIENT_CREDENTIALS, &params)?;
            Ok(TokenRequest::ClientCredentials(ClientCredentialsGrant {
                credentials: credentials(&params),
                scope: get(&params, "scope"),
            }))
        }
        "password" => {
            schema::validate(&schema::PASSWORD, &params)?;
            Ok(TokenRequest::Password(PasswordGrant {
                credentials: credentials(&params),
                username: get(&params, "username"),
                password: get(&params, "password"),
                scope: get(&params, "scope"),
            }))
        }
        _ => {
            schema::validate(&schema::REFRESH_TOKEN, &params)?;
            Ok(TokenRequest::RefreshToken(RefreshGrant {
                credentials: credentials(&params),
                refresh_token: get(&params, "refresh_token"),
                scope: get(&params, "scope"),
            }))
        }
    }
}

/// Classify an introspection envelope.
pub fn introspection_request(envelope: &Envelope) -> Result<IntrospectionRequest, OauthError> {
    let params = merged_params(envelope)?;
    schema::validate(&schema::INTROSPECT, &params)?;

    Ok(IntrospectionRequest {
        credentials: credentials(&params),
        token: get(&params, "token"),
    })
}

/// Classify a revocation envelope.
pub fn revocation_request(envelope: &Envelope) -> Result<RevocationRequest, OauthError> {
    let params = merged_params(envelope)?;
    schema::validate(&schema::REVOKE, &params)?;

    Ok(RevocationRequest {
        credentials: credentials(&params),
        token: get(&params, "token"),
        token_type_hint: maybe(&params, "token_type_hint"),
    })
}

/// Classify a userinfo envelope.
pub fn userinfo_request(envelope: &Envelope) -> UserinfoRequest {
    UserinfoRequest {
        authorization: envelope.header("authorization").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::error::ErrorKind;

    const CLIENT_ID: &str = "6a022adc-54c8-4c39-9bd4-7172f683ca48";

    #[test]
    fn classifies_code_authorize() {
        let envelope = Envelope::new()
            .with_query("response_type", "code")
            .with_query("client_id", CLIENT_ID)
            .with_query("redirect_uri", "https://client.example/endpoint")
            .with_query("code_challenge", "challenge")
            .with_query("code_challenge_method", "S256");

        match authorize_request(&envelope).unwrap() {
            AuthorizeRequest::Code(request) => {
                assert_eq!(request.client_id, CLIENT_ID);
                assert_eq!(request.scope, "");
                assert_eq!(request.code_challenge.as_deref(), Some("challenge"));
                assert_eq!(request.code_challenge_method, Some(CodeChallengeMethod::S256));
            }
            other => panic!("expected code authorization: {:?}", other),
        }
    }

    #[test]
    fn classifies_implicit_authorize() {
        let envelope = Envelope::new()
            .with_query("response_type", "token")
            .with_query("client_id", CLIENT_ID)
            .with_query("redirect_uri", "https://client.example/endpoint")
            .with_query("state", "opaque");

        match authorize_request(&envelope).unwrap() {
            AuthorizeRequest::Implicit(request) => {
                assert_eq!(request.response_type, "token");
                assert_eq!(request.state.as_deref(), Some("opaque"));
            }
            other => panic!("expected implicit authorization: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_response_type() {
        let envelope = Envelope::new().with_query("response_type", "device");
        let error = authorize_request(&envelope).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn basic_header_wins_over_body() {
        let envelope = Envelope::new()
            .with_body("grant_type", "client_credentials")
            .with_body("client_id", CLIENT_ID)
            .with_body("client_secret", "body-secret")
            .with_header(
                "authorization",
                &format!("Basic {}", crate::oauth::authenticator::tests::encode(CLIENT_ID, "header-secret")),
            );

        match token_request(&envelope).unwrap() {
            TokenRequest::ClientCredentials(request) => {
                assert_eq!(request.credentials.client_secret.as_deref(), Some("header-secret"));
            }
            other => panic!("expected client credentials grant: {:?}", other),
        }
    }

    #[test]
    fn token_surface_reads_grant_type_from_body() {
        let envelope = Envelope::new()
            .with_body("grant_type", "password")
            .with_body("client_id", CLIENT_ID)
            .with_body("client_secret", "secret")
            .with_body("username", "ada")
            .with_body("password", "hunter2");

        match token_request(&envelope).unwrap() {
            TokenRequest::Password(request) => {
                assert_eq!(request.username, "ada");
                assert_eq!(request.password, "hunter2");
            }
            other => panic!("expected password grant: {:?}", other),
        }
    }

    #[test]
    fn introspection_requires_authentication_material() {
        let envelope = Envelope::new().with_body("token", "opaque");
        let error = introspection_request(&envelope).unwrap_err();

        assert_eq!(error.kind, ErrorKind::InvalidRequest);
        assert_eq!(
            error.description,
            "Required properties client_id, client_secret are missing at #."
        );
    }
}
