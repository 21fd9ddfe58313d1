//! Resource owners and the external directory resolving them.
//!
//! The core never stores resource owners. They are looked up through the
//! [`ResourceOwners`] interface supplied by the host, either by subject when a
//! token is inspected or by credentials during the password grant.
use serde_json::{Map, Value};

use super::scope::Scope;

/// The principal on whose behalf tokens are issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceOwner {
    /// Opaque subject identifier.
    pub sub: String,

    /// Optional display name, surfaced by introspection.
    pub username: Option<String>,
}

impl ResourceOwner {
    /// Build an owner from a subject identifier.
    pub fn new(sub: &str) -> ResourceOwner {
        ResourceOwner {
            sub: sub.to_string(),
            username: None,
        }
    }

    /// Attach a username.
    pub fn with_username(mut self, username: &str) -> ResourceOwner {
        self.username = Some(username.to_string());
        self
    }
}

/// Why the directory could not produce an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerError {
    /// No owner matches the given subject or credentials.
    Unknown,

    /// The directory itself failed.
    Directory(String),
}

/// The host-supplied resource owner directory.
///
/// Implementations back this with whatever identity source the host uses.
/// The core calls it at three points: resolving the password grant, resolving
/// the subject behind a bearer token, and assembling userinfo claims.
pub trait ResourceOwners {
    /// Look up an owner by subject identifier.
    fn by_sub(&self, sub: &str) -> Result<ResourceOwner, OwnerError>;

    /// Look up an owner by username and password.
    fn by_credentials(&self, username: &str, password: &str) -> Result<ResourceOwner, OwnerError>;

    /// The scopes this owner has authorized, beyond the globally public ones.
    fn authorized_scopes(&self, owner: &ResourceOwner) -> Vec<Scope>;

    /// Identity claims for the owner, restricted to the given scope string.
    fn claims(&self, owner: &ResourceOwner, scope: &str) -> Map<String, Value>;
}
