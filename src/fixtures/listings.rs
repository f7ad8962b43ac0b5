//! Listing Fixtures

use serde::Deserialize;

use crate::listings::Listing;

/// Wrapper for listings in YAML
#[derive(Debug, Deserialize)]
pub struct ListingsFixture {
    /// Harvested listings, in harvest order
    pub listings: Vec<Listing>,
}
