//! Offers
//!
//! The seller × item price matrix the solvers work on, along with the builder that folds
//! listings into it and the pruning pass that drops dominated sellers.

use std::{collections::BTreeMap, fmt};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{countries::Country, items::ItemKey, shipping::ShippingTierTable};

pub mod builder;
pub mod pruning;

/// Errors raised while building an offer matrix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// No listings were provided.
    #[error("no listings provided")]
    NoListings,

    /// A listing had a negative price.
    #[error("seller {seller} lists {item} at a negative price")]
    NegativePrice {
        /// Seller of the offending listing
        seller: String,
        /// Item of the offending listing
        item: String,
    },
}

/// The exact set of items a seller offers, in item order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfferCombination(SmallVec<[ItemKey; 8]>);

impl OfferCombination {
    /// Items in the combination.
    pub fn items(&self) -> &[ItemKey] {
        &self.0
    }

    /// Whether the combination holds no items.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OfferCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: SmallVec<[&str; 8]> = self.0.iter().map(ItemKey::as_str).collect();

        write!(f, "[{}]", names.join(", "))
    }
}

/// One seller's row of the offer matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerOffers {
    name: String,
    country: Country,
    prices: BTreeMap<ItemKey, Decimal>,
    links: FxHashMap<ItemKey, String>,
}

impl SellerOffers {
    /// Create a seller row with no offers.
    pub fn new(name: impl Into<String>, country: impl Into<Country>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            prices: BTreeMap::new(),
            links: FxHashMap::default(),
        }
    }

    /// Add or replace an offer.
    #[must_use]
    pub fn with_offer(mut self, item: &str, price: Decimal) -> Self {
        self.set_offer(ItemKey::new(item), price, None);
        self
    }

    pub(crate) fn set_offer(&mut self, item: ItemKey, price: Decimal, link: Option<&str>) {
        match link {
            Some(link) => {
                self.links.insert(item.clone(), link.to_string());
            }
            None => {
                self.links.remove(&item);
            }
        }

        self.prices.insert(item, price);
    }

    /// Seller identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seller origin country.
    pub fn country(&self) -> &Country {
        &self.country
    }

    /// Price of an item, if offered.
    pub fn price(&self, item: &ItemKey) -> Option<Decimal> {
        self.prices.get(item).copied()
    }

    /// Offer link of an item, if known.
    pub fn link(&self, item: &ItemKey) -> Option<&str> {
        self.links.get(item).map(String::as_str)
    }

    /// Whether the seller offers the item.
    pub fn offers(&self, item: &ItemKey) -> bool {
        self.prices.contains_key(item)
    }

    /// The set of items offered.
    pub fn combination(&self) -> OfferCombination {
        OfferCombination(self.prices.keys().cloned().collect())
    }

    /// Sum of all offered prices, saturating at [`Decimal::MAX`].
    pub fn total(&self) -> Decimal {
        self.prices
            .values()
            .fold(Decimal::ZERO, |total, price| total.saturating_add(*price))
    }

    /// Whether the seller offers nothing.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Seller × item price matrix.
///
/// Rows keep the order in which sellers were first seen, which is the canonical order for
/// pruning survivors and solver tie-breaks. Every row offers at least one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferMatrix {
    sellers: Vec<SellerOffers>,
}

impl OfferMatrix {
    /// Build a matrix from seller rows, dropping rows that offer nothing.
    pub fn from_rows(rows: impl IntoIterator<Item = SellerOffers>) -> Self {
        Self {
            sellers: rows.into_iter().filter(|row| !row.is_empty()).collect(),
        }
    }

    /// Seller rows in canonical order.
    pub fn sellers(&self) -> &[SellerOffers] {
        &self.sellers
    }

    /// Look up a seller row by name.
    pub fn seller(&self, name: &str) -> Option<&SellerOffers> {
        self.sellers.iter().find(|row| row.name == name)
    }

    /// Sellers offering an item.
    pub fn offering<'a>(&'a self, item: &'a ItemKey) -> impl Iterator<Item = &'a SellerOffers> {
        self.sellers.iter().filter(move |row| row.offers(item))
    }

    /// Whether any seller offers the item.
    pub fn offers_item(&self, item: &ItemKey) -> bool {
        self.offering(item).next().is_some()
    }

    /// Keep only sellers whose country satisfies `predicate`.
    #[must_use]
    pub fn retain_countries(&self, mut predicate: impl FnMut(&Country) -> bool) -> Self {
        Self {
            sellers: self
                .sellers
                .iter()
                .filter(|row| predicate(&row.country))
                .cloned()
                .collect(),
        }
    }

    /// Keep only sellers whose country has shipping tiers in `tiers`.
    #[must_use]
    pub fn retain_shippable(&self, tiers: &ShippingTierTable) -> Self {
        self.retain_countries(|country| tiers.contains(country))
    }

    /// Number of sellers.
    pub fn len(&self) -> usize {
        self.sellers.len()
    }

    /// Whether the matrix has no sellers.
    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }
}
