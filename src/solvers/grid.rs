//! Price Grid
//!
//! Dense `(seller, item)` view of an offer matrix shared by the solvers. Sellers whose country
//! has no shipping schedule are left out up front.

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    items::{DesiredItems, ItemKey},
    offers::{OfferMatrix, SellerOffers},
    shipping::{ShippingSchedule, ShippingTierTable},
    solution::{PathStep, Solution},
    solvers::SolverError,
};

/// Sellers × items price table in canonical order.
#[derive(Debug)]
pub struct PriceGrid<'a> {
    sellers: Vec<(&'a SellerOffers, &'a ShippingSchedule)>,
    items: Vec<(&'a ItemKey, &'a str)>,
    prices: Vec<Option<Decimal>>,
    excluded: Vec<String>,
}

impl<'a> PriceGrid<'a> {
    /// Lay out `matrix` against the desired items.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NoCoverage`] naming the first item, in item order, that no
    /// eligible seller offers.
    pub fn new(
        matrix: &'a OfferMatrix,
        desired: &'a DesiredItems,
        tiers: &'a ShippingTierTable,
    ) -> Result<Self, SolverError> {
        let mut sellers = Vec::with_capacity(matrix.len());
        let mut excluded = Vec::new();

        for row in matrix.sellers() {
            match tiers.schedule(row.country()) {
                Ok(schedule) => sellers.push((row, schedule)),
                Err(err) => {
                    warn!(seller = row.name(), error = %err, "excluding seller");
                    excluded.push(row.name().to_string());
                }
            }
        }

        let items: Vec<(&ItemKey, &str)> = desired.iter().collect();

        let prices: Vec<Option<Decimal>> = sellers
            .iter()
            .flat_map(|(row, _)| items.iter().map(move |(item, _)| row.price(item)))
            .collect();

        let grid = Self {
            sellers,
            items,
            prices,
            excluded,
        };

        if let Some(item) = (0..grid.items_len()).find(|&item| !grid.is_covered(item)) {
            return Err(SolverError::NoCoverage {
                item: grid.item_name(item).to_string(),
            });
        }

        Ok(grid)
    }

    /// Number of eligible sellers.
    pub fn sellers_len(&self) -> usize {
        self.sellers.len()
    }

    /// Number of items.
    pub fn items_len(&self) -> usize {
        self.items.len()
    }

    /// Price of `item` from `seller`, if offered.
    pub fn price(&self, seller: usize, item: usize) -> Option<Decimal> {
        if item >= self.items.len() {
            return None;
        }

        self.prices
            .get(seller * self.items.len() + item)
            .copied()
            .flatten()
    }

    /// Shipping schedule of a seller.
    pub fn schedule(&self, seller: usize) -> Option<&'a ShippingSchedule> {
        self.sellers.get(seller).map(|(_, schedule)| *schedule)
    }

    /// Seller row.
    pub fn seller(&self, seller: usize) -> Option<&'a SellerOffers> {
        self.sellers.get(seller).map(|(row, _)| *row)
    }

    /// Display name of an item.
    pub fn item_name(&self, item: usize) -> &'a str {
        self.items.get(item).map_or("", |(_, name)| *name)
    }

    /// Whether any eligible seller offers the item.
    pub fn is_covered(&self, item: usize) -> bool {
        (0..self.sellers_len()).any(|seller| self.price(seller, item).is_some())
    }

    /// Sellers excluded for lack of shipping.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Turn a seller-per-item path and its per-step shipping into a [`Solution`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvariantViolation`] if the path does not line up with the grid.
    pub fn solution(
        &self,
        path: &[usize],
        shipping: &[Decimal],
        total_cost: Decimal,
    ) -> Result<Solution, SolverError> {
        if path.len() != self.items.len() || shipping.len() != self.items.len() {
            return Err(SolverError::InvariantViolation {
                message: "path length does not match number of items",
            });
        }

        let steps = self
            .items
            .iter()
            .zip(path.iter().zip(shipping))
            .enumerate()
            .map(|(item_idx, ((item, name), (&seller_idx, &step_shipping)))| {
                let row = self.seller(seller_idx).ok_or(SolverError::InvariantViolation {
                    message: "path references unknown seller",
                })?;

                let price =
                    self.price(seller_idx, item_idx)
                        .ok_or(SolverError::InvariantViolation {
                            message: "path assigns item to seller that does not offer it",
                        })?;

                Ok(PathStep {
                    item: (*item).clone(),
                    item_name: (*name).to_string(),
                    seller: row.name().to_string(),
                    country: row.country().clone(),
                    price,
                    shipping: step_shipping,
                    link: row.link(item).map(str::to_string),
                })
            })
            .collect::<Result<Vec<_>, SolverError>>()?;

        Ok(Solution::new(steps, total_cost, self.excluded.clone()))
    }
}
