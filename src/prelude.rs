//! Cartwright prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    countries::Country,
    fixtures::{Fixture, FixtureError},
    items::{DesiredItems, ItemKey},
    listings::{Listing, dedup_listings, parse_location_country, parse_price_text},
    offers::{
        MatrixError, OfferCombination, OfferMatrix, SellerOffers, builder::build_matrix,
        pruning::prune_offers,
    },
    plan::{PlanError, PurchasePlan},
    shipping::{ShippingError, ShippingSchedule, ShippingTier, ShippingTierTable},
    solution::{PathStep, SellerAssignment, Solution},
    solvers::{
        Solver, SolverError,
        milp::MilpSolver,
        path::{PathSolver, ShippingBasis},
    },
};
