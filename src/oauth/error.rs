//! The error envelope delivered for every failed operation.
//!
//! Errors never escape the entry points as panics or foreign error types;
//! each becomes exactly one [`OauthError`] handed to the application callback.
//! On the authorize surface the envelope additionally says how to render
//! itself onto the client's redirect uri, as either query or fragment
//! parameters.
use std::borrow::Cow;
use std::fmt;
use std::vec;

use url::form_urlencoded::Serializer;
use url::Url;

/// The closed set of error codes an operation can fail with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The request is missing a required parameter, includes an invalid
    /// parameter value, or is otherwise malformed.
    InvalidRequest,

    /// Client resolution or authentication failed.
    InvalidClient,

    /// The requested scope is unknown, malformed, or not authorized.
    InvalidScope,

    /// The authorization code is unknown, expired, revoked, or bound to
    /// different request parameters.
    InvalidCode,

    /// The presented grant (owner credentials or refresh token) is invalid.
    InvalidGrant,

    /// No resource owner is attached to the authorize request.
    InvalidResourceOwner,

    /// The authorization header does not carry a well-formed bearer.
    InvalidBearer,

    /// The bearer does not resolve to an active access token.
    InvalidAccessToken,

    /// The client is not allowed to use the requested grant type.
    UnsupportedGrantType,

    /// The request demanded a silent flow but no owner is logged in.
    LoginRequired,
}

impl ErrorKind {
    fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InvalidClient => "invalid_client",
            ErrorKind::InvalidScope => "invalid_scope",
            ErrorKind::InvalidCode => "invalid_code",
            ErrorKind::InvalidGrant => "invalid_grant",
            ErrorKind::InvalidResourceOwner => "invalid_resource_owner",
            ErrorKind::InvalidBearer => "invalid_bearer",
            ErrorKind::InvalidAccessToken => "invalid_access_token",
            ErrorKind::UnsupportedGrantType => "unsupported_grant_type",
            ErrorKind::LoginRequired => "login_required",
        }
    }

    /// The status a host should respond with unless overridden.
    pub fn default_status(self) -> Status {
        match self {
            ErrorKind::InvalidRequest
            | ErrorKind::InvalidScope
            | ErrorKind::InvalidCode
            | ErrorKind::InvalidGrant
            | ErrorKind::UnsupportedGrantType => Status::BadRequest,
            ErrorKind::InvalidClient
            | ErrorKind::InvalidResourceOwner
            | ErrorKind::InvalidBearer
            | ErrorKind::InvalidAccessToken
            | ErrorKind::LoginRequired => Status::Unauthorized,
        }
    }
}

impl AsRef<str> for ErrorKind {
    fn as_ref(&self) -> &str {
        self.code()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The HTTP status class attached to an error envelope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// 400.
    BadRequest,

    /// 401.
    Unauthorized,

    /// 403.
    Forbidden,

    /// 500, reserved for back-end failures.
    InternalServerError,
}

impl Status {
    /// The numeric status code.
    pub fn code(self) -> u16 {
        match self {
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::InternalServerError => 500,
        }
    }
}

/// Where an authorize-surface error is rendered on the redirect uri.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorFormat {
    /// Append to the query component, used by the code response type.
    Query,

    /// Place in the fragment component, used by the implicit response types.
    Fragment,
}

/// A fully described operation failure.
#[derive(Clone, Debug, PartialEq)]
pub struct OauthError {
    /// The error code.
    pub kind: ErrorKind,

    /// Human readable description; exact wording is part of the contract.
    pub description: Cow<'static, str>,

    /// Suggested response status.
    pub status: Status,

    /// Redirect rendering, present only for authorize-surface errors.
    pub format: Option<ErrorFormat>,

    /// The redirect uri to render onto, as presented by the request.
    pub redirect_uri: Option<String>,

    /// Client state echoed back alongside the error.
    pub state: Option<String>,
}

impl OauthError {
    /// An error with the kind's default status and no redirect rendering.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, description: D) -> OauthError {
        OauthError {
            kind,
            description: description.into(),
            status: kind.default_status(),
            format: None,
            redirect_uri: None,
            state: None,
        }
    }

    /// Override the suggested status.
    pub fn with_status(mut self, status: Status) -> OauthError {
        self.status = status;
        self
    }

    /// Attach redirect rendering for the authorize surface.
    pub fn with_redirect(
        mut self, format: ErrorFormat, redirect_uri: &str, state: Option<&str>,
    ) -> OauthError {
        self.format = Some(format);
        self.redirect_uri = Some(redirect_uri.to_string());
        self.state = state.map(str::to_string);
        self
    }

    /// The key-value pairs describing this error.
    ///
    /// These are the pairs to place in a response body or, for redirect
    /// rendering, in the component selected by `format`.
    pub fn iter(&self) -> vec::IntoIter<(&'static str, Cow<'_, str>)> {
        let mut pairs = vec![
            ("error", Cow::Borrowed(self.kind.code())),
            ("error_description", Cow::Borrowed(self.description.as_ref())),
        ];
        if let Some(state) = &self.state {
            pairs.push(("state", Cow::Borrowed(state.as_str())));
        }
        pairs.into_iter()
    }

    /// Render the error onto its redirect uri, if one is attached.
    ///
    /// Returns `None` when the envelope carries no format, or when the
    /// presented redirect uri does not parse; the host then renders the error
    /// in the response body instead.
    pub fn redirect_url(&self) -> Option<Url> {
        let format = self.format?;
        let mut url: Url = self.redirect_uri.as_ref()?.parse().ok()?;

        match format {
            ErrorFormat::Query => {
                url.query_pairs_mut().extend_pairs(self.iter()).finish();
            }
            ErrorFormat::Fragment => {
                let mut serializer = Serializer::new(String::new());
                serializer.extend_pairs(self.iter());
                url.set_fragment(Some(&serializer.finish()));
            }
        }
        Some(url)
    }

    /// Convert the error into a json string, viable for being sent over a
    /// network with `application/json` encoding.
    pub fn to_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.into_owned())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

/// A store failure surfaces as `invalid_request` carrying the store's own
/// description, with a server-error status so hosts do not blame the client.
impl From<crate::primitives::StoreError> for OauthError {
    fn from(error: crate::primitives::StoreError) -> OauthError {
        OauthError::new(ErrorKind::InvalidRequest, error.description().to_string())
            .with_status(Status::InternalServerError)
    }
}

impl fmt::Display for OauthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

impl std::error::Error for OauthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_statuses() {
        assert_eq!(ErrorKind::InvalidRequest.default_status(), Status::BadRequest);
        assert_eq!(ErrorKind::InvalidClient.default_status(), Status::Unauthorized);
        assert_eq!(ErrorKind::LoginRequired.default_status(), Status::Unauthorized);
    }

    #[test]
    fn query_rendering() {
        let error = OauthError::new(ErrorKind::InvalidScope, "Given scopes are unknown or unauthorized.")
            .with_redirect(ErrorFormat::Query, "https://client.example/endpoint", Some("xyz"));

        let url = error.redirect_url().unwrap();
        let query: Vec<_> = url.query_pairs().collect();
        assert!(query.contains(&("error".into(), "invalid_scope".into())));
        assert!(query.contains(&(
            "error_description".into(),
            "Given scopes are unknown or unauthorized.".into()
        )));
        assert!(query.contains(&("state".into(), "xyz".into())));
        assert!(url.fragment().is_none());
    }

    #[test]
    fn fragment_rendering() {
        let error = OauthError::new(ErrorKind::InvalidScope, "Given scopes are unknown or unauthorized.")
            .with_redirect(ErrorFormat::Fragment, "https://client.example/endpoint", None);

        let url = error.redirect_url().unwrap();
        let fragment = url.fragment().unwrap();
        assert!(fragment.contains("error=invalid_scope"));
        assert!(url.query().is_none());
    }

    #[test]
    fn body_errors_do_not_redirect() {
        let error = OauthError::new(ErrorKind::InvalidClient, "Invalid client_id or client_secret.");
        assert!(error.redirect_url().is_none());

        let json = error.to_json();
        assert!(json.contains("\"error\":\"invalid_client\""));
        assert!(json.contains("\"error_description\":\"Invalid client_id or client_secret.\""));
    }
}
