//! Shipping Fixtures

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::shipping::{ShippingError, ShippingTier, ShippingTierTable};

/// Wrapper for shipping tiers in YAML
#[derive(Debug, Deserialize)]
pub struct ShippingFixture {
    /// Map of origin country -> tiers
    pub shipping: BTreeMap<String, Vec<ShippingTier>>,
}

impl ShippingFixture {
    /// Insert every country's tiers into `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if a country's tiers are malformed.
    pub fn insert_into(self, table: &mut ShippingTierTable) -> Result<(), ShippingError> {
        for (country, tiers) in self.shipping {
            table.insert(country.as_str(), tiers)?;
        }

        Ok(())
    }
}
