//! Account identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

/// Maximum length of an account address.
pub const MAX_ADDRESS_LEN: usize = 64;

/// An account identity: a seller, a buyer, or the marketplace's custody account.
///
/// Addresses are opaque labels (`alice`, `0x5fbd…`); only their equality matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address, validating its format.
    ///
    /// # Errors
    ///
    /// Returns error if the address is empty, too long, or contains
    /// characters other than ASCII alphanumerics, `-`, `_` and `.`.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(TokenError::invalid_address("address cannot be empty"));
        }
        if s.len() > MAX_ADDRESS_LEN {
            return Err(TokenError::invalid_address(format!(
                "address cannot exceed {MAX_ADDRESS_LEN} characters"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(TokenError::invalid_address(format!(
                "address contains invalid characters: {s}"
            )));
        }
        Ok(Self(s))
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display, e.g. `0x5FbDB..180aa3` (the wallet UI's
    /// `shortenAddress`). Short addresses are returned unchanged.
    #[must_use]
    pub fn shortened(&self) -> String {
        if self.0.len() <= 16 {
            return self.0.clone();
        }
        format!("{}..{}", &self.0[..7], &self.0[self.0.len() - 7..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TokenError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("alice" ; "plain name")]
    #[test_case("0x5FbDB2315678afecb367f032d93F642f64180aa3" ; "hex account")]
    #[test_case("market.v2" ; "dotted")]
    fn accepts_valid(s: &str) {
        assert_eq!(Address::new(s).expect("valid").as_str(), s);
    }

    #[test_case("" ; "empty")]
    #[test_case("has space" ; "whitespace")]
    #[test_case("semi;colon" ; "punctuation")]
    fn rejects_invalid(s: &str) {
        assert!(Address::new(s).is_err());
    }

    #[test]
    fn rejects_too_long() {
        let s = "a".repeat(MAX_ADDRESS_LEN + 1);
        assert!(Address::new(s).is_err());
    }

    #[test]
    fn shortened_long_address() {
        let addr = Address::new("0x5FbDB2315678afecb367f032d93F642f64180aa3").expect("valid");
        assert_eq!(addr.shortened(), "0x5FbDB..4180aa3");
    }

    #[test]
    fn shortened_short_address_unchanged() {
        let addr = Address::new("alice").expect("valid");
        assert_eq!(addr.shortened(), "alice");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Address = serde_json::from_str(r#""bob""#).expect("deserialize");
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<Address>(r#""not valid""#).is_err());
    }
}
