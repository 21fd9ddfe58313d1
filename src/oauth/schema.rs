//! Declarative parameter schemas for every surface.
//!
//! Each grant describes its parameters as required and optional properties
//! with optional pattern constraints. Validation failures enumerate every
//! failing property in a single `invalid_request` description; the wording of
//! those descriptions is part of the external contract and matched verbatim by
//! test scenarios.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{ErrorKind, OauthError};

/// The canonical UUID shape every client identifier must match.
pub(crate) const CLIENT_ID_PATTERN: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

const RESPONSE_TYPE_PATTERN: &str = "code|token|id_token";
const GRANT_TYPE_PATTERN: &str = "client_credentials|password|authorization_code|refresh_token";
const CODE_CHALLENGE_METHOD_PATTERN: &str = "plain|S256";

/// A named parameter, possibly constrained by a pattern.
pub(crate) struct Property {
    pub(crate) name: &'static str,
    pub(crate) pattern: Option<&'static str>,
}

const fn prop(name: &'static str) -> Property {
    Property { name, pattern: None }
}

const fn patterned(name: &'static str, pattern: &'static str) -> Property {
    Property {
        name,
        pattern: Some(pattern),
    }
}

/// The parameter shape of one grant or surface.
pub(crate) struct Schema {
    pub(crate) required: &'static [Property],
    pub(crate) optional: &'static [Property],
}

/// Picks the authorize branch before the per-grant schema applies.
pub(crate) static AUTHORIZE_BASE: Schema = Schema {
    required: &[patterned("response_type", RESPONSE_TYPE_PATTERN)],
    optional: &[],
};

/// Picks the token branch before the per-grant schema applies.
pub(crate) static TOKEN_BASE: Schema = Schema {
    required: &[patterned("grant_type", GRANT_TYPE_PATTERN)],
    optional: &[],
};

pub(crate) static CODE_AUTHORIZE: Schema = Schema {
    required: &[
        prop("response_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("redirect_uri"),
    ],
    optional: &[
        prop("scope"),
        prop("state"),
        prop("prompt"),
        prop("code_challenge"),
        patterned("code_challenge_method", CODE_CHALLENGE_METHOD_PATTERN),
    ],
};

pub(crate) static IMPLICIT_AUTHORIZE: Schema = Schema {
    required: &[
        prop("response_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("redirect_uri"),
    ],
    optional: &[prop("scope"), prop("state"), prop("prompt")],
};

pub(crate) static AUTHORIZATION_CODE: Schema = Schema {
    required: &[
        prop("grant_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("code"),
        prop("redirect_uri"),
    ],
    optional: &[prop("client_secret"), prop("code_verifier")],
};

pub(crate) static CLIENT_CREDENTIALS: Schema = Schema {
    required: &[
        prop("grant_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("client_secret"),
    ],
    optional: &[prop("scope")],
};

pub(crate) static PASSWORD: Schema = Schema {
    required: &[
        prop("grant_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("client_secret"),
        prop("username"),
        prop("password"),
    ],
    optional: &[prop("scope")],
};

pub(crate) static REFRESH_TOKEN: Schema = Schema {
    required: &[
        prop("grant_type"),
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("refresh_token"),
    ],
    optional: &[prop("client_secret"), prop("scope")],
};

pub(crate) static INTROSPECT: Schema = Schema {
    required: &[
        patterned("client_id", CLIENT_ID_PATTERN),
        prop("client_secret"),
        prop("token"),
    ],
    optional: &[],
};

pub(crate) static REVOKE: Schema = Schema {
    required: &[patterned("client_id", CLIENT_ID_PATTERN), prop("token")],
    optional: &[prop("client_secret"), prop("token_type_hint")],
};

static COMPILED_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    [
        CLIENT_ID_PATTERN,
        RESPONSE_TYPE_PATTERN,
        GRANT_TYPE_PATTERN,
        CODE_CHALLENGE_METHOD_PATTERN,
    ]
    .iter()
    .map(|&pattern| {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).expect("schema patterns are valid");
        (pattern, regex)
    })
    .collect()
});

/// Validate a parameter map against a schema.
///
/// All failures are collected into one description: first a sentence per
/// pattern violation, in schema order, then a single sentence naming every
/// missing required property.
pub(crate) fn validate(schema: &Schema, params: &HashMap<String, String>) -> Result<(), OauthError> {
    let mut sentences = Vec::new();

    let properties = schema.required.iter().chain(schema.optional.iter());
    for property in properties {
        let pattern = match property.pattern {
            Some(pattern) => pattern,
            None => continue,
        };
        if let Some(value) = params.get(property.name) {
            if !COMPILED_PATTERNS[pattern].is_match(value) {
                sentences.push(format!(
                    "#/{} do match required pattern /{}/.",
                    property.name, pattern
                ));
            }
        }
    }

    let missing: Vec<&str> = schema
        .required
        .iter()
        .filter(|property| !params.contains_key(property.name))
        .map(|property| property.name)
        .collect();
    if !missing.is_empty() {
        sentences.push(format!(
            "Required properties {} are missing at #.",
            missing.join(", ")
        ));
    }

    if sentences.is_empty() {
        return Ok(());
    }

    Err(OauthError::new(ErrorKind::InvalidRequest, sentences.join(" ")))
}
