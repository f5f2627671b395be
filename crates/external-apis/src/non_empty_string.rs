// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Non-empty string validation for client configuration
//!
//! API keys and endpoints are wrapped in [`NonEmptyString`] so a client can
//! never be built from a blank value. The type deserializes through the same
//! validation, so configuration files are checked on load.
//!
//! ```rust
//! use external_apis::NonEmptyString;
//!
//! let key = NonEmptyString::new("ckey_123").unwrap();
//! assert_eq!(key.as_str(), "ckey_123");
//! assert!(NonEmptyString::new(" \t").is_err());
//! ```

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a blank string is offered where a value is required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("string cannot be empty or whitespace-only")]
pub struct EmptyStringError;

/// A string with at least one non-whitespace character
///
/// Leading and trailing whitespace is preserved as given.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Validate and wrap `s`
    pub fn new(s: impl Into<String>) -> Result<Self, EmptyStringError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(s.into_boxed_str()))
        }
    }

    /// Get a string slice of the contained value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value with a trailing `/` removed, for joining URL paths
    pub fn trim_end_slash(&self) -> &str {
        self.0.trim_end_matches('/')
    }
}

// Values are frequently secrets; never print them through Debug.
impl fmt::Debug for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NonEmptyString(<{} chars>)", self.0.chars().count())
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = EmptyStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0.into_string()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
