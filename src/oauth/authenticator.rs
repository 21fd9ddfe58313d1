//! Client authentication for the confidential surfaces.
//!
//! Credentials arrive either as http basic material in the `authorization`
//! header or as `client_id`/`client_secret` body parameters; the header takes
//! precedence. The browser-facing authorize surface identifies the client by
//! id and redirect uri alone, the token-shaped surfaces additionally check the
//! secret.
use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;

use crate::primitives::client::{Client, ClientStore};

use super::error::{ErrorKind, OauthError};
use super::request::{Credentials, Envelope};

const BASIC_START: &str = "Basic ";

/// Decode basic-auth credentials from the `authorization` header.
///
/// Returns `Ok(None)` when the header is absent or carries another scheme.
/// A header that claims the basic scheme but does not decode to
/// `client_id:client_secret` is a malformed request.
pub(crate) fn basic_credentials(
    envelope: &Envelope,
) -> Result<Option<(String, String)>, OauthError> {
    let header = match envelope.header("authorization") {
        Some(header) => header,
        None => return Ok(None),
    };
    let encoded = match header.strip_prefix(BASIC_START) {
        Some(encoded) => encoded,
        None => return Ok(None),
    };

    let invalid = || OauthError::new(ErrorKind::InvalidRequest, "Given credentials are invalid.");

    let decoded = STANDARD.decode(encoded).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;
    let (client_id, client_secret) = decoded.split_once(':').ok_or_else(invalid)?;

    Ok(Some((client_id.to_string(), client_secret.to_string())))
}

/// Resolve a client and, when presented, its redirect uri.
///
/// An unknown client and an unregistered redirect uri are indistinguishable
/// to the caller, as motivated in the rfc.
pub(crate) fn resolve_client(
    clients: &dyn ClientStore, client_id: &str, redirect_uri: Option<&str>,
) -> Result<Client, OauthError> {
    let client = clients.get_client(client_id)?;

    let denied = || {
        debug!("client resolution failed for {}", client_id);
        OauthError::new(ErrorKind::InvalidClient, "Invalid client_id or redirect_uri.")
    };

    let client = client.ok_or_else(denied)?;
    if let Some(uri) = redirect_uri {
        if !client.has_redirect_uri(uri) {
            return Err(denied());
        }
    }
    Ok(client)
}

/// Check the presented secret against the resolved client.
pub(crate) fn check_secret(client: &Client, credentials: &Credentials) -> Result<(), OauthError> {
    match credentials.client_secret.as_deref() {
        Some(secret) if client.check_secret(secret) => Ok(()),
        _ => Err(OauthError::new(
            ErrorKind::InvalidClient,
            "Invalid client_id or client_secret.",
        )),
    }
}
