//! Defines the Scope type and the whitespace-delimited scope strings of the rfc.
use std::{fmt, str};

use serde::{Deserialize, Serialize};

/// A single named capability administered by the authorization server.
///
/// Scopes are compared by name alone. The `public` flag marks scopes that any
/// client may request without the resource owner having explicitly authorized
/// them.
///
/// Scope names must not contain whitespace, as they are concatenated into
/// space-separated scope strings on tokens and requests.
///
/// Example
/// ------
///
/// ```
/// # use patina_oauth::primitives::scope::Scope;
/// let scope = "profile".parse::<Scope>().unwrap();
/// assert_eq!(scope.name, "profile");
/// assert!(!scope.public);
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct Scope {
    /// The scope name, free of whitespace.
    pub name: String,

    /// Whether any client may request this scope without per-owner authorization.
    pub public: bool,
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            #[serde(default)]
            public: bool,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut scope: Scope = raw.name.parse().map_err(serde::de::Error::custom)?;
        scope.public = raw.public;
        Ok(scope)
    }
}

impl Scope {
    /// Create a private scope with the given name.
    pub fn private(name: &str) -> Result<Scope, ParseScopeErr> {
        name.parse()
    }

    /// Create a globally public scope with the given name.
    pub fn public(name: &str) -> Result<Scope, ParseScopeErr> {
        let mut scope: Scope = name.parse()?;
        scope.public = true;
        Ok(scope)
    }
}

/// Error returned from parsing a scope name.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseScopeErr {
    /// Scope names are concatenated with spaces, so they may not contain whitespace.
    ContainsWhitespace,

    /// The empty string does not name a scope.
    Empty,
}

impl str::FromStr for Scope {
    type Err = ParseScopeErr;

    fn from_str(string: &str) -> Result<Scope, ParseScopeErr> {
        if string.is_empty() {
            return Err(ParseScopeErr::Empty);
        }
        if string.chars().any(char::is_whitespace) {
            return Err(ParseScopeErr::ContainsWhitespace);
        }
        Ok(Scope {
            name: string.to_string(),
            public: false,
        })
    }
}

impl fmt::Display for ParseScopeErr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseScopeErr::ContainsWhitespace => {
                fmt.write_str("Scope names may not contain whitespace")
            }
            ParseScopeErr::Empty => fmt.write_str("Scope names may not be empty"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.name)
    }
}

impl PartialEq for Scope {
    fn eq(&self, rhs: &Scope) -> bool {
        self.name == rhs.name
    }
}

impl Eq for Scope {}

/// Tokenize a scope string into its names.
///
/// Splits on any whitespace. Order and duplicates are preserved, since the
/// resolved scope string on a token must round-trip the request.
pub fn split(scope: &str) -> Vec<&str> {
    scope.split_whitespace().collect()
}

/// Join scope names back into a scope string.
pub fn join<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
