//! Cartwright
//!
//! Cartwright finds the cheapest way to buy a list of items from marketplace sellers, where each
//! seller charges shipping in steps that depend on how much is bought from them.
//!
//! Listings are folded into a seller × item [`OfferMatrix`](offers::OfferMatrix), dominated
//! sellers are pruned, and a [`Solver`](solvers::Solver) assigns every desired item to one
//! seller against a [`ShippingTierTable`](shipping::ShippingTierTable).

pub mod countries;
pub mod fixtures;
pub mod items;
pub mod listings;
pub mod offers;
pub mod plan;
pub mod prelude;
pub mod shipping;
pub mod solution;
pub mod solvers;
