//! Offer Matrix Builder

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    items::DesiredItems,
    listings::Listing,
    offers::{MatrixError, OfferMatrix, SellerOffers},
};

/// Fold listings into a seller × item matrix restricted to the desired items.
///
/// Sellers are keyed by their trimmed name and keep the country of their first desired
/// listing. When a seller lists the same item more than once, the last listing wins. Sellers
/// that offer none of the desired items never get a row.
///
/// # Errors
///
/// - [`MatrixError::NoListings`]: `listings` is empty.
/// - [`MatrixError::NegativePrice`]: a desired listing has a negative price.
pub fn build_matrix(
    listings: &[Listing],
    desired: &DesiredItems,
) -> Result<OfferMatrix, MatrixError> {
    if listings.is_empty() {
        return Err(MatrixError::NoListings);
    }

    let mut rows: Vec<SellerOffers> = Vec::new();
    let mut row_index: FxHashMap<&str, usize> = FxHashMap::default();

    for listing in listings {
        let item = listing.item_key();

        if !desired.contains(&item) {
            continue;
        }

        let seller = listing.seller.trim();

        if listing.price < Decimal::ZERO {
            return Err(MatrixError::NegativePrice {
                seller: seller.to_string(),
                item: listing.item.clone(),
            });
        }

        let idx = *row_index.entry(seller).or_insert_with(|| {
            rows.push(SellerOffers::new(seller, listing.country.clone()));
            rows.len() - 1
        });

        if let Some(row) = rows.get_mut(idx) {
            row.set_offer(item, listing.price, listing.link.as_deref());
        }
    }

    debug!(
        listings = listings.len(),
        sellers = rows.len(),
        items = desired.len(),
        "built offer matrix"
    );

    Ok(OfferMatrix::from_rows(rows))
}
