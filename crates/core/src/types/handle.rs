//! URL handle type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Handle`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The input string is empty.
    #[error("handle cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("handle must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("handle contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input starts or ends with a hyphen.
    #[error("handle cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// A Shopify resource handle (the URL slug of a product, collection or article).
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Only lowercase ASCII letters, digits and `-`
/// - Must not start or end with `-`
///
/// ## Examples
///
/// ```
/// use alltagsgold_core::Handle;
///
/// assert!(Handle::parse("bambus-zahnbuerste").is_ok());
/// assert!(Handle::parse("Bambus").is_err());
/// assert!(Handle::parse("-edge").is_err());
/// assert!(Handle::parse("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Maximum length Shopify accepts for a handle.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `Handle` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains characters
    /// other than lowercase letters, digits and hyphens, or starts/ends with
    /// a hyphen.
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        if s.is_empty() {
            return Err(HandleError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(HandleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(HandleError::InvalidCharacter(c));
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(HandleError::EdgeHyphen);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Handle` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = HandleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
