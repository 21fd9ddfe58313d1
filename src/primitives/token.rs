//! The token entity backing both authorization codes and access tokens.
//!
//! A single row discriminated by [`TokenKind`] models both credentials: codes
//! carry the redirect uri and proof key data of the authorize request they came
//! from, access tokens carry an optional refresh token. Persistence backends
//! that split the two must hide the split behind [`TokenStore`].
use std::collections::HashMap;
use std::fmt;
use std::str;

use serde::{Deserialize, Serialize};

use super::generator::{RandGenerator, ValueGenerator};
use super::StoreError;

/// Discriminates the two credentials sharing the token row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A short-lived authorization code, exchangeable exactly once.
    Code,

    /// A bearer access token.
    AccessToken,
}

impl TokenKind {
    /// The stored discriminator value.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Code => "code",
            TokenKind::AccessToken => "access_token",
        }
    }
}

/// The transformation a client applied to its code verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// The challenge is the verifier itself.
    #[serde(rename = "plain")]
    Plain,

    /// The challenge is the base64url-encoded sha256 digest of the verifier.
    #[serde(rename = "S256")]
    S256,
}

impl CodeChallengeMethod {
    /// The parameter value naming this method.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeChallengeMethod::Plain => "plain",
            CodeChallengeMethod::S256 => "S256",
        }
    }
}

impl str::FromStr for CodeChallengeMethod {
    type Err = ();

    fn from_str(string: &str) -> Result<CodeChallengeMethod, ()> {
        match string {
            "plain" => Ok(CodeChallengeMethod::Plain),
            "S256" => Ok(CodeChallengeMethod::S256),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued credential as persisted by the store.
///
/// Note that the raw code challenge is absent: only its sha512 hex digest is
/// ever stored, so a leaked token row cannot be replayed as a verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Whether this row is a code or an access token.
    pub kind: TokenKind,

    /// The opaque primary handle.
    pub value: String,

    /// The opaque refresh handle, when one was issued alongside.
    pub refresh_token: Option<String>,

    /// The client the credential was issued to.
    pub client_id: String,

    /// The subject of the resource owner, absent for client credentials.
    pub sub: Option<String>,

    /// The redirect uri the originating authorize request was bound to.
    pub redirect_uri: Option<String>,

    /// The resolved scope string.
    pub scope: String,

    /// Opaque client state echoed back on the authorize surface.
    pub state: Option<String>,

    /// Issuance timestamp, seconds since epoch.
    pub issued_at: i64,

    /// Expiry timestamp, seconds since epoch.
    pub expires_at: i64,

    /// Revocation timestamp, if the credential was revoked.
    pub revoked_at: Option<i64>,

    /// Sha512 hex digest of the code challenge, 128 characters.
    pub code_challenge_hash: Option<String>,

    /// The method the challenge was created with.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

impl Token {
    /// A credential is active while it is neither revoked nor expired.
    pub fn active(&self, now: i64) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    /// Remaining lifetime in seconds at the given instant.
    pub fn expires_in(&self, now: i64) -> i64 {
        self.expires_at - now
    }

    /// Whether this code may be exchanged by the given client and redirect uri.
    ///
    /// Single-use enforcement is not part of this check; the exchange itself
    /// must go through [`TokenStore::consume_code`].
    pub fn consumable_by(&self, client_id: &str, redirect_uri: &str, now: i64) -> bool {
        self.kind == TokenKind::Code
            && self.active(now)
            && self.client_id == client_id
            && self.redirect_uri.as_deref() == Some(redirect_uri)
    }
}

/// Everything the core decides about a credential before the store mints it.
///
/// The store contributes the `value` (and `refresh_token` when requested) so
/// that backends remain free to generate handles in their own transaction.
#[derive(Clone, Debug)]
pub struct TokenAttributes {
    /// Row discriminator.
    pub kind: TokenKind,

    /// Issued-to client.
    pub client_id: String,

    /// Resource owner subject, if any.
    pub sub: Option<String>,

    /// Bound redirect uri, mandatory for codes.
    pub redirect_uri: Option<String>,

    /// Resolved scope string.
    pub scope: String,

    /// Client state to echo.
    pub state: Option<String>,

    /// Issuance timestamp.
    pub issued_at: i64,

    /// Expiry timestamp.
    pub expires_at: i64,

    /// Sha512 hex digest of the code challenge.
    pub code_challenge_hash: Option<String>,

    /// Proof key method.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

/// Persistence of issued credentials.
///
/// Handles minted by `insert` must be drawn from at least 256 bits of
/// cryptographic randomness and be unique over the store's lifetime.
pub trait TokenStore {
    /// Fetch a credential by its primary handle.
    fn get_by_value(&self, value: &str) -> Result<Option<Token>, StoreError>;

    /// Fetch an access token by its refresh handle.
    fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Token>, StoreError>;

    /// Persist a credential, minting its value and, when asked, a refresh token.
    fn insert(&mut self, attrs: TokenAttributes, with_refresh: bool) -> Result<Token, StoreError>;

    /// Mark the credential revoked. Idempotent: revoking twice keeps the first
    /// timestamp and is not an error.
    fn revoke(&mut self, value: &str, now: i64) -> Result<Token, StoreError>;

    /// Atomically claim a code for exchange.
    ///
    /// This is the single-use critical section: the store must perform a
    /// compare-and-swap on `revoked_at IS NULL`, so that of two concurrent
    /// exchanges at most one observes `Some`. Returns `None` when the code is
    /// unknown or was already claimed.
    fn consume_code(&mut self, value: &str, now: i64) -> Result<Option<Token>, StoreError>;
}

/// Keeps track of issued credentials in a hash map.
///
/// The value generator is trait based and can be chosen during construction;
/// the default draws 256 bits from the thread's entropy source.
pub struct TokenMap<G: ValueGenerator = RandGenerator> {
    generator: G,
    tokens: HashMap<String, Token>,
    refresh_index: HashMap<String, String>,
}

impl TokenMap<RandGenerator> {
    /// An empty store with the default random value generator.
    pub fn new() -> Self {
        TokenMap::with_generator(RandGenerator::new(32))
    }
}

impl Default for TokenMap<RandGenerator> {
    fn default() -> Self {
        TokenMap::new()
    }
}

impl<G: ValueGenerator> TokenMap<G> {
    /// An empty store minting values from the given generator.
    pub fn with_generator(generator: G) -> Self {
        TokenMap {
            generator,
            tokens: HashMap::new(),
            refresh_index: HashMap::new(),
        }
    }

    /// Directly insert a fully formed credential, for fixtures and imports.
    pub fn import(&mut self, token: Token) {
        if let Some(refresh) = &token.refresh_token {
            self.refresh_index.insert(refresh.clone(), token.value.clone());
        }
        self.tokens.insert(token.value.clone(), token);
    }

    fn mint(&mut self) -> Result<String, StoreError> {
        self.generator
            .generate()
            .map_err(|()| StoreError::new("Token value generation failed."))
    }
}

impl<G: ValueGenerator> TokenStore for TokenMap<G> {
    fn get_by_value(&self, value: &str) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.get(value).cloned())
    }

    fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Token>, StoreError> {
        let value = match self.refresh_index.get(refresh_token) {
            Some(value) => value,
            None => return Ok(None),
        };
        Ok(self.tokens.get(value).cloned())
    }

    fn insert(&mut self, attrs: TokenAttributes, with_refresh: bool) -> Result<Token, StoreError> {
        let value = self.mint()?;
        let refresh_token = if with_refresh { Some(self.mint()?) } else { None };

        let token = Token {
            kind: attrs.kind,
            value,
            refresh_token,
            client_id: attrs.client_id,
            sub: attrs.sub,
            redirect_uri: attrs.redirect_uri,
            scope: attrs.scope,
            state: attrs.state,
            issued_at: attrs.issued_at,
            expires_at: attrs.expires_at,
            revoked_at: None,
            code_challenge_hash: attrs.code_challenge_hash,
            code_challenge_method: attrs.code_challenge_method,
        };

        self.import(token.clone());
        Ok(token)
    }

    fn revoke(&mut self, value: &str, now: i64) -> Result<Token, StoreError> {
        let token = self
            .tokens
            .get_mut(value)
            .ok_or_else(|| StoreError::new("Token not found."))?;
        token.revoked_at.get_or_insert(now);
        Ok(token.clone())
    }

    fn consume_code(&mut self, value: &str, now: i64) -> Result<Option<Token>, StoreError> {
        let token = match self.tokens.get_mut(value) {
            Some(token) if token.kind == TokenKind::Code => token,
            _ => return Ok(None),
        };
        if token.revoked_at.is_some() {
            return Ok(None);
        }
        token.revoked_at = Some(now);
        Ok(Some(token.clone()))
    }
}
