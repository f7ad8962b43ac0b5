//! Countries

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seller origin country.
///
/// Stored upper-cased with whitespace runs replaced by underscores (`"Czech Republic"` becomes
/// `CZECH_REPUBLIC`), the key format used by shipping price snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Country(String);

impl Country {
    /// Normalize a country name.
    pub fn new(name: &str) -> Self {
        let normalized = name
            .split_whitespace()
            .map(str::to_uppercase)
            .collect::<Vec<_>>()
            .join("_");

        Self(normalized)
    }

    /// The normalized country key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Country {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&str> for Country {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_snapshot_key() {
        assert_eq!(Country::new("Czech Republic").as_str(), "CZECH_REPUBLIC");
        assert_eq!(Country::new("  germany ").as_str(), "GERMANY");
        assert_eq!(Country::new("United  Kingdom"), Country::new("UNITED_KINGDOM"));
    }
}
