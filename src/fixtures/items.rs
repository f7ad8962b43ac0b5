//! Item Fixtures

use serde::Deserialize;

/// Wrapper for desired items in YAML
#[derive(Debug, Deserialize)]
pub struct ItemsFixture {
    /// Desired item names
    pub items: Vec<String>,
}
