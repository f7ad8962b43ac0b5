//! Path Solver
//!
//! Dynamic program over the price grid. Items are processed in order and, for every seller
//! `k` offering item `j`, the cheapest path assigning items `0..=j` with item `j` bought from
//! `k` is kept. Extending a path by `k` costs the item price plus the shipping contribution of
//! [`ShippingSchedule::delta`](crate::shipping::ShippingSchedule::delta), where the committed
//! value depends on the [`ShippingBasis`].
//!
//! Each column is `O(m²)` for `m` sellers, so the whole run is `O(n · m²)` for `n` items.

use clap::ValueEnum;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::{
    items::DesiredItems,
    offers::OfferMatrix,
    shipping::ShippingTierTable,
    solution::Solution,
    solvers::{Solver, SolverError, add_amounts, grid::PriceGrid},
};

/// Which order value a seller's shipping tier is looked up against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingBasis {
    /// Running total of the whole path (goods and shipping across all sellers).
    ///
    /// This is the reference behaviour and keeps results reproducible against earlier runs.
    #[default]
    PathTotal,

    /// Corrected model: running subtotal of goods already bought from the same seller.
    SellerSubtotal,
}

/// Best path ending at one `(seller, item)` cell.
#[derive(Debug, Clone)]
struct PathState {
    cost: Decimal,
    path: Vec<usize>,
    shipping: Vec<Decimal>,
    /// Goods subtotal per seller on the path, sorted by seller index
    subtotals: SmallVec<[(usize, Decimal); 8]>,
}

impl PathState {
    fn start(seller: usize, price: Decimal, shipping: Decimal) -> Result<Self, SolverError> {
        Ok(Self {
            cost: add_amounts(price, shipping)?,
            path: vec![seller],
            shipping: vec![shipping],
            subtotals: SmallVec::from_elem((seller, price), 1),
        })
    }

    fn subtotal(&self, seller: usize) -> Option<Decimal> {
        self.subtotals
            .binary_search_by_key(&seller, |(s, _)| *s)
            .ok()
            .and_then(|pos| self.subtotals.get(pos))
            .map(|(_, subtotal)| *subtotal)
    }

    fn extend(
        &self,
        seller: usize,
        price: Decimal,
        shipping: Decimal,
        cost: Decimal,
    ) -> Result<Self, SolverError> {
        let mut next = self.clone();

        next.cost = cost;
        next.path.push(seller);
        next.shipping.push(shipping);

        match next.subtotals.binary_search_by_key(&seller, |(s, _)| *s) {
            Ok(pos) => {
                if let Some((_, subtotal)) = next.subtotals.get_mut(pos) {
                    *subtotal = add_amounts(*subtotal, price)?;
                }
            }
            Err(pos) => next.subtotals.insert(pos, (seller, price)),
        }

        Ok(next)
    }
}

impl ShippingBasis {
    /// Committed value and in-path flag for extending `state` with `seller`.
    fn committed(self, state: &PathState, seller: usize) -> (Decimal, bool) {
        let subtotal = state.subtotal(seller);

        match self {
            Self::PathTotal => (state.cost, subtotal.is_some()),
            Self::SellerSubtotal => (subtotal.unwrap_or(Decimal::ZERO), subtotal.is_some()),
        }
    }
}

/// Dynamic programming solver over seller paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSolver {
    basis: ShippingBasis,
}

impl PathSolver {
    /// Create a solver with the given shipping basis.
    pub fn new(basis: ShippingBasis) -> Self {
        Self { basis }
    }

    /// Recompute the cost of buying each desired item, in item order, from the named seller.
    ///
    /// Applies the same transition rule as [`Solver::solve`], so replaying a solution's
    /// [`seller_path`](Solution::seller_path) reproduces its total.
    ///
    /// # Errors
    ///
    /// - [`SolverError::PathLength`]: `sellers` does not name one seller per item.
    /// - [`SolverError::NotOffered`]: a named seller does not offer the item at that position.
    /// - [`SolverError::Shipping`]: a named seller's country has no shipping tiers.
    /// - [`SolverError::AmountNotRepresentable`]: the running total overflows.
    pub fn replay(
        &self,
        matrix: &OfferMatrix,
        desired: &DesiredItems,
        tiers: &ShippingTierTable,
        sellers: &[&str],
    ) -> Result<Decimal, SolverError> {
        if sellers.len() != desired.len() {
            return Err(SolverError::PathLength {
                expected: desired.len(),
                actual: sellers.len(),
            });
        }

        let mut cost = Decimal::ZERO;
        let mut subtotals: FxHashMap<&str, Decimal> = FxHashMap::default();

        for ((item, name), &seller) in desired.iter().zip(sellers) {
            let not_offered = || SolverError::NotOffered {
                seller: seller.to_string(),
                item: name.to_string(),
            };

            let row = matrix.seller(seller).ok_or_else(not_offered)?;
            let price = row.price(item).ok_or_else(not_offered)?;

            let subtotal = subtotals.get(seller).copied();
            let committed = match self.basis {
                ShippingBasis::PathTotal => cost,
                ShippingBasis::SellerSubtotal => subtotal.unwrap_or(Decimal::ZERO),
            };

            let shipping =
                tiers.shipping_delta(row.country(), committed, price, subtotal.is_some())?;

            cost = add_amounts(cost, shipping).and_then(|cost| add_amounts(cost, price))?;

            let subtotal = subtotals.entry(seller).or_insert(Decimal::ZERO);
            *subtotal = add_amounts(*subtotal, price)?;
        }

        Ok(cost)
    }
}

impl Solver for PathSolver {
    fn solve(
        &self,
        matrix: &OfferMatrix,
        desired: &DesiredItems,
        tiers: &ShippingTierTable,
    ) -> Result<Solution, SolverError> {
        let grid = PriceGrid::new(matrix, desired, tiers)?;

        if grid.items_len() == 0 {
            return Ok(Solution::new(
                Vec::new(),
                Decimal::ZERO,
                grid.excluded().to_vec(),
            ));
        }

        let sellers = grid.sellers_len();

        debug!(
            sellers,
            items = grid.items_len(),
            basis = ?self.basis,
            "solving seller paths"
        );

        // First column: each seller offering the first item starts a fresh path.
        let mut column: Vec<Option<PathState>> = Vec::with_capacity(sellers);

        for seller in 0..sellers {
            let state = match (grid.price(seller, 0), grid.schedule(seller)) {
                (Some(price), Some(schedule)) => {
                    let shipping = schedule
                        .delta(Decimal::ZERO, price, false)
                        .ok_or(SolverError::AmountNotRepresentable { amount: price })?;

                    Some(PathState::start(seller, price, shipping)?)
                }
                _ => None,
            };

            column.push(state);
        }

        for item in 1..grid.items_len() {
            column = (0..sellers)
                .map(|seller| self.best_extension(&grid, &column, seller, item))
                .collect::<Result<_, _>>()?;
        }

        let best = column
            .into_iter()
            .flatten()
            .reduce(|best, state| if state.cost < best.cost { state } else { best })
            .ok_or(SolverError::InvariantViolation {
                message: "no complete path after covering every item",
            })?;

        info!(total = %best.cost, "found cheapest seller assignment");

        grid.solution(&best.path, &best.shipping, best.cost)
    }
}

impl PathSolver {
    /// Cheapest way to extend any path in `column` by buying `item` from `seller`.
    ///
    /// Predecessors are scanned in seller order and a later one only wins if strictly cheaper.
    fn best_extension(
        &self,
        grid: &PriceGrid<'_>,
        column: &[Option<PathState>],
        seller: usize,
        item: usize,
    ) -> Result<Option<PathState>, SolverError> {
        let (Some(price), Some(schedule)) = (grid.price(seller, item), grid.schedule(seller))
        else {
            return Ok(None);
        };

        let mut best: Option<(&PathState, Decimal, Decimal)> = None;

        for state in column.iter().flatten() {
            let (committed, in_path) = self.basis.committed(state, seller);
            let shipping = schedule
                .delta(committed, price, in_path)
                .ok_or(SolverError::AmountNotRepresentable { amount: committed })?;
            let cost = add_amounts(state.cost, shipping)
                .and_then(|cost| add_amounts(cost, price))?;

            if best.is_none_or(|(_, best_cost, _)| cost < best_cost) {
                best = Some((state, cost, shipping));
            }
        }

        best.map(|(state, cost, shipping)| state.extend(seller, price, shipping, cost))
            .transpose()
    }
}
