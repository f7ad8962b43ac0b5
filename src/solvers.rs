//! Solvers for seller assignment

use good_lp::ResolutionError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    items::DesiredItems,
    offers::OfferMatrix,
    shipping::{ShippingError, ShippingTierTable},
    solution::Solution,
};

pub mod grid;
pub mod milp;
pub mod path;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// A desired item has no seller left to buy it from.
    #[error("no seller offers {item}")]
    NoCoverage {
        /// Display name of the uncovered item
        item: String,
    },

    /// A path names a seller that does not offer the item at that position.
    #[error("seller {seller} does not offer {item}")]
    NotOffered {
        /// Seller named on the path
        seller: String,
        /// Item at that position
        item: String,
    },

    /// The path does not have one seller per desired item.
    #[error("path has {actual} sellers for {expected} items")]
    PathLength {
        /// Number of desired items
        expected: usize,
        /// Number of sellers on the path
        actual: usize,
    },

    /// An amount overflows a running total or cannot be used as a solver coefficient.
    #[error("amount {amount} cannot be represented")]
    AmountNotRepresentable {
        /// The offending amount
        amount: Decimal,
    },

    /// Wrapped shipping model error.
    #[error(transparent)]
    Shipping(#[from] ShippingError),

    /// Wrapped solver resolution error
    #[error(transparent)]
    ResolutionError(#[from] ResolutionError),

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// `lhs + rhs`, failing with [`SolverError::AmountNotRepresentable`] on overflow.
pub(crate) fn add_amounts(lhs: Decimal, rhs: Decimal) -> Result<Decimal, SolverError> {
    lhs.checked_add(rhs)
        .ok_or(SolverError::AmountNotRepresentable { amount: lhs })
}

/// Trait for assigning every desired item to one seller
pub trait Solver {
    /// Find the cheapest seller assignment covering `desired`.
    ///
    /// Sellers whose country has no shipping tiers are left out of the search and reported in
    /// [`Solution::excluded_sellers`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NoCoverage`] if a desired item has no eligible seller, or another
    /// [`SolverError`] if the solver itself fails.
    fn solve(
        &self,
        matrix: &OfferMatrix,
        desired: &DesiredItems,
        tiers: &ShippingTierTable,
    ) -> Result<Solution, SolverError>;
}
