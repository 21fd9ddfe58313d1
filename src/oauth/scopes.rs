//! Scope resolution against the client and the resource owner.
use log::debug;

use crate::primitives::client::Client;
use crate::primitives::resource_owner::{ResourceOwner, ResourceOwners};
use crate::primitives::scope::{self, Scope};
use crate::primitives::ScopeStore;

use super::error::{ErrorKind, OauthError};

/// Resolve a requested scope string for the given client and owner.
///
/// Every requested name must be admissible: globally public, or authorized by
/// the resource owner, and, for clients that restrict scopes, also present
/// in the client's authorized set. An empty request resolves to the empty
/// string. The resolved string preserves the order and multiplicity of the
/// request, so it can be compared against it verbatim.
pub(crate) fn authorize(
    scopes: &dyn ScopeStore, owners: &dyn ResourceOwners, requested: &str, client: &Client,
    owner: Option<&ResourceOwner>,
) -> Result<String, OauthError> {
    let names = scope::split(requested);
    if names.is_empty() {
        return Ok(String::new());
    }

    let public = scopes.public_scopes()?;
    let owner_scopes: Vec<Scope> = owner
        .map(|owner| owners.authorized_scopes(owner))
        .unwrap_or_default();

    for name in &names {
        let known = public.iter().any(|scope| scope.name == *name)
            || owner_scopes.iter().any(|scope| scope.name == *name);
        let admitted = known && (!client.authorize_scope || client.authorizes_scope(name));

        if !admitted {
            debug!("scope {} denied for client {}", name, client.id);
            return Err(OauthError::new(
                ErrorKind::InvalidScope,
                "Given scopes are unknown or unauthorized.",
            ));
        }
    }

    Ok(scope::join(&names))
}
