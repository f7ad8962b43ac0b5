//! MILP Solver
//!
//! Exact model of the per-seller shipping rule: every seller used pays the tier matching the
//! goods subtotal bought from them, once.
//!
//! - `x[s][j]` is 1 when item `j` is bought from seller `s`.
//! - `y[s][t]` is 1 when seller `s` ships under tier `t`.
//!
//! A seller's subtotal must fit under the ceiling of the tier it picks, and since tier prices
//! never decrease with the ceiling the minimiser always picks the first tier that fits, which
//! is exactly the active tier. The last tier is open-ended.

use good_lp::{
    Expression, ProblemVariables, Solution as _, SolverModel, Variable, constraint, variable,
};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use tracing::{debug, info};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::{
    items::DesiredItems,
    offers::OfferMatrix,
    shipping::ShippingTierTable,
    solution::Solution,
    solvers::{Solver, SolverError, add_amounts, grid::PriceGrid},
};

/// Minor units per major unit used when scaling amounts into solver coefficients.
const MINOR_UNITS: Decimal = Decimal::ONE_HUNDRED;

/// Solver using Mixed Integer Linear Programming (MILP)
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpSolver;

/// Decision variables for one seller.
struct SellerVars {
    /// One per item; `None` where the seller does not offer it
    assign: SmallVec<[Option<Variable>; 16]>,
    /// One per shipping tier
    tiers: SmallVec<[Variable; 8]>,
}

impl Solver for MilpSolver {
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

        let mut pb = ProblemVariables::new();

        let (vars, objective) = build_variables_and_objective(&grid, &mut pb)?;

        let mut model = pb.minimise(objective).using(default_solver);

        // Every item is bought exactly once.
        for item in 0..grid.items_len() {
            let bought: Expression = vars
                .iter()
                .filter_map(|seller| seller.assign.get(item).copied().flatten())
                .map(Expression::from)
                .sum();

            model = model.with(constraint::eq(bought, 1));
        }

        let big_m = ceiling_bound(&grid)?;

        for (seller_idx, seller) in vars.iter().enumerate() {
            let schedule = grid.schedule(seller_idx).ok_or(SolverError::InvariantViolation {
                message: "variables built for unknown seller",
            })?;

            let chosen: Expression = seller.tiers.iter().copied().map(Expression::from).sum();

            // At most one tier, and only if something is bought.
            model = model.with(constraint::leq(chosen.clone(), 1));

            let mut subtotal = Expression::default();

            for (item, var) in seller.assign.iter().enumerate() {
                let Some(var) = *var else {
                    continue;
                };

                model = model.with(constraint::leq(Expression::from(var), chosen.clone()));

                let price = grid
                    .price(seller_idx, item)
                    .ok_or(SolverError::InvariantViolation {
                        message: "assignment variable without a price",
                    })?;

                subtotal += var * coefficient(price)?;
            }

            let mut capacity = Expression::default();
            let last = schedule.tiers().len().saturating_sub(1);

            for (tier_idx, (var, tier)) in seller.tiers.iter().zip(schedule.tiers()).enumerate() {
                let ceiling = if tier_idx == last {
                    coefficient(tier.value_ceiling)?.max(big_m)
                } else {
                    coefficient(tier.value_ceiling)?
                };

                capacity += *var * ceiling;
            }

            model = model.with(constraint::leq(subtotal, capacity));
        }

        debug!(
            sellers = grid.sellers_len(),
            items = grid.items_len(),
            "solving seller assignment model"
        );

        let solution = model.solve()?;

        // Read the assignment back, then price it in decimal from the schedules.
        let path = (0..grid.items_len())
            .map(|item| {
                vars.iter()
                    .position(|seller| {
                        seller
                            .assign
                            .get(item)
                            .copied()
                            .flatten()
                            .is_some_and(|var| solution.value(var) > 0.5)
                    })
                    .ok_or(SolverError::InvariantViolation {
                        message: "model left an item unassigned",
                    })
            })
            .collect::<Result<Vec<usize>, SolverError>>()?;

        let (shipping, total) = price_path(&grid, &path)?;

        info!(total = %total, "found cheapest seller assignment");

        grid.solution(&path, &shipping, total)
    }
}

fn build_variables_and_objective(
    grid: &PriceGrid<'_>,
    pb: &mut ProblemVariables,
) -> Result<(Vec<SellerVars>, Expression), SolverError> {
    let mut objective = Expression::default();
    let mut vars = Vec::with_capacity(grid.sellers_len());

    for seller in 0..grid.sellers_len() {
        let schedule = grid.schedule(seller).ok_or(SolverError::InvariantViolation {
            message: "grid seller without a schedule",
        })?;

        let mut assign = SmallVec::with_capacity(grid.items_len());

        for item in 0..grid.items_len() {
            let var = match grid.price(seller, item) {
                Some(price) => {
                    let var = pb.add(variable().binary());
                    objective += var * coefficient(price)?;
                    Some(var)
                }
                None => None,
            };

            assign.push(var);
        }

        let mut tiers = SmallVec::with_capacity(schedule.tiers().len());

        for tier in schedule.tiers() {
            let var = pb.add(variable().binary());
            objective += var * coefficient(tier.price)?;
            tiers.push(var);
        }

        vars.push(SellerVars { assign, tiers });
    }

    Ok((vars, objective))
}

/// Per-step shipping and total for a seller-per-item path under the per-seller rule.
///
/// Each seller's fee is charged on the first step bought from them.
fn price_path(grid: &PriceGrid<'_>, path: &[usize]) -> Result<(Vec<Decimal>, Decimal), SolverError> {
    let mut subtotals: Vec<Decimal> = vec![Decimal::ZERO; grid.sellers_len()];
    let mut goods = Decimal::ZERO;

    for (item, &seller) in path.iter().enumerate() {
        let price = grid
            .price(seller, item)
            .ok_or(SolverError::InvariantViolation {
                message: "model assigned an item to a seller that does not offer it",
            })?;

        if let Some(subtotal) = subtotals.get_mut(seller) {
            *subtotal = add_amounts(*subtotal, price)?;
        }

        goods = add_amounts(goods, price)?;
    }

    let mut charged: Vec<bool> = vec![false; grid.sellers_len()];
    let mut shipping = Vec::with_capacity(path.len());

    for &seller in path {
        let first = charged.get_mut(seller).is_some_and(|seen| !std::mem::replace(seen, true));

        let fee = match (first, grid.schedule(seller), subtotals.get(seller)) {
            (true, Some(schedule), Some(subtotal)) => schedule.price_for(*subtotal),
            _ => Decimal::ZERO,
        };

        shipping.push(fee);
    }

    let total = shipping.iter().try_fold(goods, |total, fee| add_amounts(total, *fee))?;

    Ok((shipping, total))
}

/// Upper bound on any seller subtotal, used to open up the last tier.
fn ceiling_bound(grid: &PriceGrid<'_>) -> Result<f64, SolverError> {
    let all_goods = (0..grid.sellers_len())
        .flat_map(|seller| (0..grid.items_len()).filter_map(move |item| grid.price(seller, item)))
        .try_fold(Decimal::ONE, add_amounts)?;

    coefficient(all_goods)
}

/// Scale an amount to minor units and convert it to an `f64` coefficient.
fn coefficient(amount: Decimal) -> Result<f64, SolverError> {
    let scaled = amount
        .checked_mul(MINOR_UNITS)
        .ok_or(SolverError::AmountNotRepresentable { amount })?;

    if !scaled.fract().is_zero() {
        return Err(SolverError::AmountNotRepresentable { amount });
    }

    scaled
        .to_i64()
        .and_then(i64_to_f64_exact)
        .ok_or(SolverError::AmountNotRepresentable { amount })
}

/// Convert an `i64` to an `f64` if it can be represented exactly.
fn i64_to_f64_exact(v: i64) -> Option<f64> {
    let f = v.to_f64()?;

    (f.to_i64() == Some(v)).then_some(f)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use crate::{
        offers::SellerOffers,
        shipping::ShippingTier,
        solvers::path::{PathSolver, ShippingBasis},
    };

    use super::*;

    fn two_tier(low: Decimal, ceiling: Decimal, high: Decimal) -> [ShippingTier; 2] {
        [
            ShippingTier::new(low, ceiling),
            ShippingTier::new(high, dec!(1000)),
        ]
    }

    /// Cheapest total over every seller-per-item assignment, charging each seller once.
    fn brute_force(matrix: &OfferMatrix, desired: &DesiredItems, tiers: &ShippingTierTable) -> Decimal {
        let items: Vec<_> = desired.keys().collect();
        let sellers = matrix.sellers();
        let mut best: Option<Decimal> = None;
        let mut choice = vec![0_usize; items.len()];

        loop {
            let mut subtotals = vec![Decimal::ZERO; sellers.len()];
            let mut used = vec![false; sellers.len()];
            let mut feasible = true;

            for (item, &seller) in items.iter().zip(&choice) {
                match sellers.get(seller).and_then(|row| row.price(item)) {
                    Some(price) => {
                        subtotals[seller] += price;
                        used[seller] = true;
                    }
                    None => feasible = false,
                }
            }

            if feasible {
                let total: Decimal = sellers
                    .iter()
                    .zip(subtotals.iter().zip(&used))
                    .filter(|(_, (_, used))| **used)
                    .map(|(row, (subtotal, _))| {
                        let schedule = tiers.schedule(row.country()).expect("tiers for seller");
                        *subtotal + schedule.price_for(*subtotal)
                    })
                    .sum();

                if best.is_none_or(|best| total < best) {
                    best = Some(total);
                }
            }

            // Advance the mixed-radix counter over seller choices.
            let mut pos = 0;
            loop {
                if pos == choice.len() {
                    return best.expect("at least one feasible assignment");
                }
                choice[pos] += 1;
                if choice[pos] < sellers.len() {
                    break;
                }
                choice[pos] = 0;
                pos += 1;
            }
        }
    }

    fn fixture() -> TestResult<(OfferMatrix, DesiredItems, ShippingTierTable)> {
        let matrix = OfferMatrix::from_rows([
            SellerOffers::new("S1", "X")
                .with_offer("A", dec!(10))
                .with_offer("B", dec!(6))
                .with_offer("C", dec!(7)),
            SellerOffers::new("S2", "Y")
                .with_offer("A", dec!(11))
                .with_offer("C", dec!(4.5)),
            SellerOffers::new("S3", "X").with_offer("B", dec!(5)),
        ]);
        let desired: DesiredItems = ["A", "B", "C"].into_iter().collect();
        let mut tiers = ShippingTierTable::new();
        tiers
            .insert("X", two_tier(dec!(2), dec!(20), dec!(6)))?
            .insert("Y", two_tier(dec!(3), dec!(10), dec!(4)))?;

        Ok((matrix, desired, tiers))
    }

    #[test]
    fn matches_brute_force_optimum() -> TestResult {
        let (matrix, desired, tiers) = fixture()?;

        let solution = MilpSolver.solve(&matrix, &desired, &tiers)?;

        assert_eq!(solution.total_cost(), brute_force(&matrix, &desired, &tiers));
        assert_eq!(
            solution.total_cost(),
            solution.goods_total() + solution.shipping_total()
        );

        Ok(())
    }

    #[test]
    fn never_worse_than_seller_subtotal_path() -> TestResult {
        let (matrix, desired, tiers) = fixture()?;

        let exact = MilpSolver.solve(&matrix, &desired, &tiers)?;
        let path = PathSolver::new(ShippingBasis::SellerSubtotal).solve(&matrix, &desired, &tiers)?;

        assert!(exact.total_cost() <= path.total_cost());

        Ok(())
    }

    #[test]
    fn charges_each_seller_once() -> TestResult {
        let matrix = OfferMatrix::from_rows([SellerOffers::new("S", "X")
            .with_offer("A", dec!(15))
            .with_offer("B", dec!(10))]);
        let desired: DesiredItems = ["A", "B"].into_iter().collect();
        let mut tiers = ShippingTierTable::new();
        tiers.insert("X", two_tier(dec!(5), dec!(20), dec!(8)))?;

        let solution = MilpSolver.solve(&matrix, &desired, &tiers)?;

        let shipping: Vec<Decimal> = solution.steps().iter().map(|step| step.shipping).collect();

        assert_eq!(shipping, vec![dec!(8), Decimal::ZERO]);
        assert_eq!(solution.total_cost(), dec!(33));

        Ok(())
    }

    #[test]
    fn solver_with_no_items_returns_empty_solution() -> TestResult {
        let solution =
            MilpSolver.solve(&OfferMatrix::default(), &DesiredItems::new(), &ShippingTierTable::new())?;

        assert!(solution.is_empty());

        Ok(())
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert!(matches!(
            coefficient(dec!(0.001)),
            Err(SolverError::AmountNotRepresentable { .. })
        ));
    }

    #[test]
    fn overflowing_amounts_are_rejected() -> TestResult {
        let matrix = OfferMatrix::from_rows([SellerOffers::new("S", "X")
            .with_offer("A", Decimal::MAX)
            .with_offer("B", Decimal::MAX)]);
        let desired: DesiredItems = ["A", "B"].into_iter().collect();
        let mut tiers = ShippingTierTable::new();
        tiers.insert("X", two_tier(dec!(1), dec!(10), dec!(2)))?;

        assert!(matches!(
            MilpSolver.solve(&matrix, &desired, &tiers),
            Err(SolverError::AmountNotRepresentable { .. })
        ));
        assert!(matches!(
            coefficient(Decimal::MAX),
            Err(SolverError::AmountNotRepresentable { amount }) if amount == Decimal::MAX
        ));

        Ok(())
    }

    #[test]
    #[expect(
        clippy::cast_precision_loss,
        reason = "This is a test case for exact conversion"
    )]
    fn i64_to_f64_exact_accepts_exactly_representable_integers() {
        let cases: [i64; 4] = [0, 1, -1, 9_007_199_254_740_992]; // 2^53

        for v in cases {
            assert_eq!(i64_to_f64_exact(v), Some(v as f64));
        }
    }

    #[test]
    fn i64_to_f64_exact_rejects_nonrepresentable_integers() {
        assert_eq!(i64_to_f64_exact(9_007_199_254_740_993), None);
    }
}
