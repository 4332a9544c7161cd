use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("endpoint identity must not be empty")]
    Empty,
}

/// Identity of a monitored host: the address string exactly as given.
///
/// Equality is plain string equality, so `"localhost"` and `"127.0.0.1"` are
/// two different endpoints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointId(String);

impl EndpointId {
    pub fn parse(id: impl Into<String>) -> Result<Self, EndpointError> {
        let id = id.into();
        if id.is_empty() {
            return Err(EndpointError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EndpointId {
    type Error = EndpointError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::parse(id)
    }
}

impl TryFrom<&str> for EndpointId {
    type Error = EndpointError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::parse(id)
    }
}

impl From<EndpointId> for String {
    fn from(id: EndpointId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_identity() {
        assert_eq!(EndpointId::parse(""), Err(EndpointError::Empty));
    }

    #[test]
    fn test_identity_is_exact_string() {
        let a = EndpointId::parse("10.0.0.1").unwrap();
        let b = EndpointId::parse("10.0.0.1 ").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "10.0.0.1");
    }
}
