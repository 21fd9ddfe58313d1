//! The data model of the authorization server and the back-end seams around it.
//!
//! Every record the protocol engines reason about lives here, together with
//! the traits a host implements to supply persistence ([`client::ClientStore`],
//! [`token::TokenStore`], [`ScopeStore`]) and its identity directory
//! ([`resource_owner::ResourceOwners`]). In-memory implementations are
//! provided for each store; they are suitable for tests and small embedded
//! deployments.

pub mod client;
pub mod generator;
pub mod resource_owner;
pub mod scope;
pub mod token;

use std::fmt;

use self::scope::Scope;

/// A failure inside a pluggable store.
///
/// The description is surfaced to the client inside an `invalid_request`
/// envelope, so backends should phrase it for external consumption and never
/// include internals such as connection strings or stack traces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreError {
    description: String,
}

impl StoreError {
    /// Wrap a backend failure description.
    pub fn new<D: Into<String>>(description: D) -> StoreError {
        StoreError {
            description: description.into(),
        }
    }

    /// The externally presentable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for StoreError {}

/// Read access to the scopes administered by the server.
pub trait ScopeStore {
    /// All globally public scopes.
    fn public_scopes(&self) -> Result<Vec<Scope>, StoreError>;
}

/// An in-memory list of registered scopes.
#[derive(Default)]
pub struct ScopeList {
    scopes: Vec<Scope>,
}

impl ScopeList {
    /// An empty scope list.
    pub fn new() -> ScopeList {
        ScopeList::default()
    }

    /// Register a scope.
    pub fn register_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }
}

impl ScopeStore for ScopeList {
    fn public_scopes(&self) -> Result<Vec<Scope>, StoreError> {
        Ok(self.scopes.iter().filter(|scope| scope.public).cloned().collect())
    }
}
