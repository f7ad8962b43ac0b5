//! Offer Pruning
//!
//! Sellers offering exactly the same items from the same country are interchangeable to the
//! solver except for price, so only the cheapest of each group needs to be kept. Country stays
//! part of the group key because shipping depends on it: a pricier seller in a cheaper-to-ship
//! country can still be part of the optimum.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    countries::Country,
    offers::{OfferCombination, OfferMatrix, SellerOffers},
};

/// Keep the cheapest seller of every `(combination, country)` group.
///
/// Survivors keep their relative order from `matrix`. Within a group the seller with the lowest
/// total price wins, and on an exact tie the first one seen is kept. Rows with an empty
/// combination are dropped.
pub fn prune_offers(matrix: &OfferMatrix) -> OfferMatrix {
    // (total, position in `matrix`, row)
    let mut survivors: Vec<(Decimal, usize, &SellerOffers)> = Vec::new();
    let mut groups: FxHashMap<(OfferCombination, Country), usize> = FxHashMap::default();

    for (position, row) in matrix.sellers().iter().enumerate() {
        let combination = row.combination();

        if combination.is_empty() {
            continue;
        }

        let total = row.total();

        match groups.get(&(combination.clone(), row.country().clone())) {
            Some(&slot) => {
                if let Some(survivor) = survivors.get_mut(slot)
                    && total < survivor.0
                {
                    *survivor = (total, position, row);
                }
            }
            None => {
                groups.insert((combination, row.country().clone()), survivors.len());
                survivors.push((total, position, row));
            }
        }
    }

    debug!(
        sellers = matrix.len(),
        survivors = survivors.len(),
        "pruned dominated offers"
    );

    survivors.sort_unstable_by_key(|(_, position, _)| *position);

    OfferMatrix::from_rows(survivors.into_iter().map(|(_, _, row)| row.clone()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn names(matrix: &OfferMatrix) -> Vec<&str> {
        matrix.sellers().iter().map(SellerOffers::name).collect()
    }

    #[test]
    fn keeps_cheapest_seller_per_combination_and_country() {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("pricey", "Germany")
                .with_offer("A", dec!(5))
                .with_offer("B", dec!(5)),
            SellerOffers::new("cheap", "Germany")
                .with_offer("A", dec!(4))
                .with_offer("B", dec!(5)),
            SellerOffers::new("single", "Germany").with_offer("A", dec!(1)),
        ]);

        let pruned = prune_offers(&matrix);

        assert_eq!(names(&pruned), vec!["cheap", "single"]);
    }

    #[test]
    fn keeps_one_survivor_per_country() {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("de", "Germany").with_offer("A", dec!(3)),
            SellerOffers::new("fr", "France").with_offer("A", dec!(9)),
            SellerOffers::new("de-pricey", "Germany").with_offer("A", dec!(4)),
        ]);

        let pruned = prune_offers(&matrix);

        assert_eq!(names(&pruned), vec!["de", "fr"]);
    }

    #[test]
    fn replacing_survivor_keeps_its_own_position() {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("a", "X").with_offer("A", dec!(5)),
            SellerOffers::new("b", "Y").with_offer("A", dec!(4)),
            SellerOffers::new("c", "X").with_offer("A", dec!(3)),
        ]);

        let pruned = prune_offers(&matrix);

        assert_eq!(names(&pruned), vec!["b", "c"]);
    }

    #[test]
    fn ties_keep_first_seen_seller() {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("first", "Germany")
                .with_offer("A", dec!(2))
                .with_offer("B", dec!(3)),
            SellerOffers::new("second", "Germany")
                .with_offer("A", dec!(3))
                .with_offer("B", dec!(2)),
        ]);

        let pruned = prune_offers(&matrix);

        assert_eq!(names(&pruned), vec!["first"]);
    }

    #[test]
    fn subsets_are_separate_groups() {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("both", "Germany")
                .with_offer("A", dec!(10))
                .with_offer("B", dec!(10)),
            SellerOffers::new("only-a", "Germany").with_offer("A", dec!(1)),
        ]);

        let pruned = prune_offers(&matrix);

        assert_eq!(pruned.len(), 2);
    }
}
