//! Listings
//!
//! A listing is one seller's price quote for one item, as harvested from a marketplace.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{countries::Country, items::ItemKey};

/// One seller's price quote for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Seller identifier
    pub seller: String,

    /// Item name as listed
    #[serde(alias = "card_name")]
    pub item: String,

    /// Offer price
    pub price: Decimal,

    /// Seller origin country
    pub country: Country,

    /// Offer URL, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Listing {
    /// Create a listing without a link.
    pub fn new(seller: &str, item: &str, price: Decimal, country: &str) -> Self {
        Self {
            seller: seller.to_string(),
            item: item.to_string(),
            price,
            country: Country::new(country),
            link: None,
        }
    }

    /// Attach an offer URL.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Normalized item key.
    pub fn item_key(&self) -> ItemKey {
        ItemKey::new(&self.item)
    }
}

/// Remove listings that repeat an earlier listing's seller, item, price and country.
///
/// Links are ignored when comparing, so the same offer harvested twice under different URLs
/// is only kept once. The first occurrence wins and order is otherwise preserved.
pub fn dedup_listings(listings: impl IntoIterator<Item = Listing>) -> Vec<Listing> {
    let mut seen: FxHashSet<(String, ItemKey, Decimal, Country)> = FxHashSet::default();

    listings
        .into_iter()
        .filter(|listing| {
            seen.insert((
                listing.seller.trim().to_string(),
                listing.item_key(),
                listing.price,
                listing.country.clone(),
            ))
        })
        .collect()
}

/// Parse harvested price text in European notation, e.g. `"25,00 €"` or `"1.234,56 EUR"`.
///
/// A comma is required as the decimal separator; dots are thousands separators. Returns
/// `None` when the text holds no such amount.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let text = text.replace('€', "").replace("EUR", "");

    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .find_map(parse_european_amount)
}

fn parse_european_amount(token: &str) -> Option<Decimal> {
    let (whole, fraction) = token.rsplit_once(',')?;
    let whole = whole.replace('.', "");

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if !all_digits(&whole) || !all_digits(fraction) {
        return None;
    }

    format!("{whole}.{fraction}").parse().ok()
}

/// Extract the country from location text such as `"Item location: Germany"`.
///
/// Text without a `:` separator, or with nothing after it, is `"Unknown"`.
pub fn parse_location_country(text: &str) -> String {
    text.split_once(':')
        .map(|(_, country)| country.trim())
        .filter(|country| !country.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}
