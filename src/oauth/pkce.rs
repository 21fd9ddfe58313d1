//! Proof Key for Code Exchange.
//!
//! Challenges are never stored raw. At authorize time the challenge is
//! reduced to its sha512 hex digest; at exchange time the verifier is reduced
//! to a comparator the same way and the two digests are compared in constant
//! time. For the `S256` method the verifier is first folded through
//! base64url-encoded sha256, as prescribed by the proof-key rfc; for `plain`
//! the verifier digest is compared directly against the challenge digest.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::primitives::token::CodeChallengeMethod;

/// Reduce a raw challenge to its stored form, 128 hex characters.
pub(crate) fn hash_challenge(challenge: &str) -> String {
    let digest = Sha512::digest(challenge.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Check a verifier against the stored challenge digest.
pub(crate) fn verify(stored_hash: &str, method: CodeChallengeMethod, verifier: &str) -> bool {
    let comparator = match method {
        CodeChallengeMethod::Plain => hash_challenge(verifier),
        CodeChallengeMethod::S256 => {
            let folded = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
            hash_challenge(&folded)
        }
    };
    comparator.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
