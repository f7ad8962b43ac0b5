//! Solutions

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::{countries::Country, items::ItemKey};

/// One item of a solution path: who it is bought from and what it adds to the total.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    /// Item key
    pub item: ItemKey,

    /// Item display name
    pub item_name: String,

    /// Seller the item is bought from
    pub seller: String,

    /// Seller origin country
    pub country: Country,

    /// Item price
    pub price: Decimal,

    /// Shipping charged when this step was added
    pub shipping: Decimal,

    /// Offer link, if known
    pub link: Option<String>,
}

/// Everything bought from a single seller.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerAssignment {
    /// Seller identifier
    pub seller: String,

    /// Seller origin country
    pub country: Country,

    /// Items bought from this seller, in item order
    pub items: SmallVec<[ItemKey; 8]>,

    /// Sum of item prices
    pub goods: Decimal,

    /// Sum of shipping charged for this seller's steps
    pub shipping: Decimal,
}

/// Minimum-cost seller assignment found by a solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    steps: Vec<PathStep>,
    assignments: Vec<SellerAssignment>,
    total_cost: Decimal,
    excluded_sellers: Vec<String>,
}

impl Solution {
    /// Build a solution from its path, grouping steps by seller in order of first appearance.
    pub fn new(steps: Vec<PathStep>, total_cost: Decimal, excluded_sellers: Vec<String>) -> Self {
        let mut assignments: Vec<SellerAssignment> = Vec::new();

        for step in &steps {
            if let Some(assignment) = assignments.iter_mut().find(|a| a.seller == step.seller) {
                assignment.items.push(step.item.clone());
                assignment.goods += step.price;
                assignment.shipping += step.shipping;
            } else {
                assignments.push(SellerAssignment {
                    seller: step.seller.clone(),
                    country: step.country.clone(),
                    items: SmallVec::from_elem(step.item.clone(), 1),
                    goods: step.price,
                    shipping: step.shipping,
                });
            }
        }

        Self {
            steps,
            assignments,
            total_cost,
            excluded_sellers,
        }
    }

    /// Path steps in item order.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Seller chosen for each item, in item order.
    pub fn seller_path(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.seller.as_str()).collect()
    }

    /// Per-seller groups, in order of first appearance on the path.
    pub fn assignments(&self) -> &[SellerAssignment] {
        &self.assignments
    }

    /// Items bought from a seller.
    pub fn items_for(&self, seller: &str) -> Option<&[ItemKey]> {
        self.assignments
            .iter()
            .find(|assignment| assignment.seller == seller)
            .map(|assignment| assignment.items.as_slice())
    }

    /// Seller an item is bought from.
    pub fn seller_for(&self, item: &ItemKey) -> Option<&str> {
        self.steps
            .iter()
            .find(|step| &step.item == item)
            .map(|step| step.seller.as_str())
    }

    /// Total cost of goods and shipping.
    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    /// Sum of item prices.
    pub fn goods_total(&self) -> Decimal {
        self.steps.iter().map(|step| step.price).sum()
    }

    /// Sum of shipping charges.
    pub fn shipping_total(&self) -> Decimal {
        self.steps.iter().map(|step| step.shipping).sum()
    }

    /// Sellers left out because their country had no viable shipping.
    pub fn excluded_sellers(&self) -> &[String] {
        &self.excluded_sellers
    }

    /// Whether the solution covers no items.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
