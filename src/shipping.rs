//! Shipping Tiers
//!
//! Each origin country has a schedule of `(price, value_ceiling)` tiers. The shipping cost of an
//! order worth `V` is the price of the first tier whose ceiling is at least `V`, or the last
//! tier's price when `V` exceeds every ceiling. Prices never decrease as ceilings increase.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::countries::Country;

/// Errors raised by the shipping tier model.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// The country has no shipping tiers.
    #[error("no shipping tiers for country {0}")]
    UnknownCountry(Country),

    /// A tier schedule breaks the monotone step invariant.
    #[error("malformed shipping tiers for {country} at ceiling {value_ceiling}: {message}")]
    MalformedTierTable {
        /// Country whose schedule is malformed
        country: Country,
        /// Ceiling of the offending tier
        value_ceiling: Decimal,
        /// What is wrong with the tier
        message: &'static str,
    },

    /// The order value does not fit in a decimal.
    #[error("order value {committed} + {added} from {country} overflows")]
    ValueOverflow {
        /// Country of the seller
        country: Country,
        /// Value already committed
        committed: Decimal,
        /// Value being added
        added: Decimal,
    },

    /// A shipping snapshot could not be parsed.
    #[error("failed to parse shipping snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// A single step of a shipping schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTier {
    /// Shipping price charged while the order value is within this tier
    pub price: Decimal,

    /// Largest order value covered by this tier
    #[serde(alias = "maxValue")]
    pub value_ceiling: Decimal,
}

impl ShippingTier {
    /// Create a new tier.
    pub fn new(price: Decimal, value_ceiling: Decimal) -> Self {
        Self {
            price,
            value_ceiling,
        }
    }
}

/// A validated, non-empty schedule of tiers sorted by ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingSchedule {
    tiers: SmallVec<[ShippingTier; 8]>,
}

impl ShippingSchedule {
    /// Sort and validate tiers for a country.
    ///
    /// Returns `Ok(None)` when no tiers are given, which means the country has no viable
    /// shipping.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::MalformedTierTable`] if any price is negative or a tier costs
    /// less than a tier with a lower ceiling.
    pub fn new(
        country: &Country,
        tiers: impl IntoIterator<Item = ShippingTier>,
    ) -> Result<Option<Self>, ShippingError> {
        let mut tiers: SmallVec<[ShippingTier; 8]> = tiers.into_iter().collect();

        if tiers.is_empty() {
            return Ok(None);
        }

        tiers.sort_by_key(|tier| tier.value_ceiling);

        let mut previous_price: Option<Decimal> = None;

        for tier in &tiers {
            if tier.price < Decimal::ZERO {
                return Err(ShippingError::MalformedTierTable {
                    country: country.clone(),
                    value_ceiling: tier.value_ceiling,
                    message: "negative shipping price",
                });
            }

            if previous_price.is_some_and(|previous| tier.price < previous) {
                return Err(ShippingError::MalformedTierTable {
                    country: country.clone(),
                    value_ceiling: tier.value_ceiling,
                    message: "price decreases as value ceiling increases",
                });
            }

            previous_price = Some(tier.price);
        }

        Ok(Some(Self { tiers }))
    }

    /// Tiers in ascending ceiling order.
    pub fn tiers(&self) -> &[ShippingTier] {
        &self.tiers
    }

    /// Shipping price for an order worth `value`.
    pub fn price_for(&self, value: Decimal) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| tier.value_ceiling >= value)
            .or_else(|| self.tiers.last())
            .map_or(Decimal::ZERO, |tier| tier.price)
    }

    /// Shipping contribution of adding `added` on top of `committed`.
    ///
    /// A seller already in the path only pays the step up between the two tiers. A seller new
    /// to the path pays the full price of the tier reached. Returns `None` if
    /// `committed + added` overflows.
    pub fn delta(
        &self,
        committed: Decimal,
        added: Decimal,
        seller_in_path: bool,
    ) -> Option<Decimal> {
        let new_price = self.price_for(committed.checked_add(added)?);

        if seller_in_path {
            Some(new_price - self.price_for(committed))
        } else {
            Some(new_price)
        }
    }

    fn capped(&self, cap: Decimal) -> Option<Self> {
        let tiers: SmallVec<[ShippingTier; 8]> = self
            .tiers
            .iter()
            .copied()
            .take_while(|tier| tier.value_ceiling < cap)
            .collect();

        (!tiers.is_empty()).then_some(Self { tiers })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEntry {
    Tiers(Vec<ShippingTier>),
    Unavailable {
        #[serde(rename = "error")]
        _error: String,
    },
}

/// Shipping schedules keyed by origin country.
#[derive(Debug, Clone, Default)]
pub struct ShippingTierTable {
    schedules: FxHashMap<Country, ShippingSchedule>,
}

impl ShippingTierTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the tiers for a country.
    ///
    /// An empty tier list removes the country, leaving it with no viable shipping.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::MalformedTierTable`] if the tiers are not a monotone step
    /// function.
    pub fn insert(
        &mut self,
        country: impl Into<Country>,
        tiers: impl IntoIterator<Item = ShippingTier>,
    ) -> Result<&mut Self, ShippingError> {
        let country = country.into();

        match ShippingSchedule::new(&country, tiers)? {
            Some(schedule) => {
                self.schedules.insert(country, schedule);
            }
            None => {
                self.schedules.remove(&country);
            }
        }

        Ok(self)
    }

    /// Parse a cached shipping price list.
    ///
    /// The snapshot is a JSON object keyed by origin country. Each value is either a list of
    /// `{"price": .., "maxValue": ..}` tiers or an `{"error": ".."}` marker for routes with no
    /// usable shipping option; markers and empty lists are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::Snapshot`] if the JSON does not have this shape, or
    /// [`ShippingError::MalformedTierTable`] if a country's tiers are malformed.
    pub fn from_json_snapshot(json: &str) -> Result<Self, ShippingError> {
        let entries: FxHashMap<String, SnapshotEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();

        for (country, entry) in entries {
            match entry {
                SnapshotEntry::Tiers(tiers) => {
                    table.insert(country.as_str(), tiers)?;
                }
                SnapshotEntry::Unavailable { .. } => {
                    debug!(country = %country, "no viable shipping in snapshot");
                }
            }
        }

        Ok(table)
    }

    /// Drop tiers whose ceiling is at or above `cap`.
    ///
    /// Countries left with no tiers are removed.
    #[must_use]
    pub fn with_value_cap(&self, cap: Decimal) -> Self {
        let schedules = self
            .schedules
            .iter()
            .filter_map(|(country, schedule)| {
                schedule
                    .capped(cap)
                    .map(|schedule| (country.clone(), schedule))
            })
            .collect();

        Self { schedules }
    }

    /// Look up the schedule for a country.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::UnknownCountry`] if the country has no tiers.
    pub fn schedule(&self, country: &Country) -> Result<&ShippingSchedule, ShippingError> {
        self.schedules
            .get(country)
            .ok_or_else(|| ShippingError::UnknownCountry(country.clone()))
    }

    /// Whether the country has viable shipping.
    pub fn contains(&self, country: &Country) -> bool {
        self.schedules.contains_key(country)
    }

    /// Shipping contribution of adding `added` to an order from a seller in `country`.
    ///
    /// See [`ShippingSchedule::delta`].
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::UnknownCountry`] if the country has no tiers, or
    /// [`ShippingError::ValueOverflow`] if the order value overflows.
    pub fn shipping_delta(
        &self,
        country: &Country,
        committed: Decimal,
        added: Decimal,
        seller_in_path: bool,
    ) -> Result<Decimal, ShippingError> {
        self.schedule(country)?
            .delta(committed, added, seller_in_path)
            .ok_or_else(|| ShippingError::ValueOverflow {
                country: country.clone(),
                committed,
                added,
            })
    }

    /// Number of countries with viable shipping.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Whether no country has viable shipping.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}
