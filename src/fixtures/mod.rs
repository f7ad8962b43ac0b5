//! Fixtures
//!
//! Loads listing, shipping and desired-item sets from disk. Named sets live under a base path
//! (`./fixtures` by default) as `listings/<name>.yml`, `shipping/<name>.yml` and
//! `items/<name>.yml`. The `read_*` functions load a single file by path and also accept the
//! JSON shapes produced by the harvesting scripts.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    fixtures::{items::ItemsFixture, listings::ListingsFixture, shipping::ShippingFixture},
    items::DesiredItems,
    listings::{Listing, dedup_listings},
    shipping::{ShippingError, ShippingTierTable},
};

pub mod items;
pub mod listings;
pub mod shipping;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Shipping tiers rejected by the tier model
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

/// Fixture
#[derive(Debug, Default)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    listings: Vec<Listing>,
    tiers: ShippingTierTable,
    items: DesiredItems,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load listings from `listings/<name>.yml`, appending to any already loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_listings(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let path = self.set_path("listings", name);
        let fixture: ListingsFixture = serde_norway::from_str(&read(&path)?)?;

        self.listings.extend(fixture.listings);

        Ok(self)
    }

    /// Load shipping tiers from `shipping/<name>.yml`, replacing any countries already loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a tier table is malformed.
    pub fn load_shipping(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let path = self.set_path("shipping", name);
        let fixture: ShippingFixture = serde_norway::from_str(&read(&path)?)?;

        fixture.insert_into(&mut self.tiers)?;

        Ok(self)
    }

    /// Load desired items from `items/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_items(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let path = self.set_path("items", name);
        let fixture: ItemsFixture = serde_norway::from_str(&read(&path)?)?;

        for item in &fixture.items {
            self.items.insert(item);
        }

        Ok(self)
    }

    /// Load a complete fixture set (listings, shipping and items with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_listings(name)?
            .load_shipping(name)?
            .load_items(name)?;

        Ok(fixture)
    }

    /// Loaded listings, exact duplicates removed.
    pub fn listings(&self) -> Vec<Listing> {
        dedup_listings(self.listings.iter().cloned())
    }

    /// Loaded shipping tiers.
    pub fn tiers(&self) -> &ShippingTierTable {
        &self.tiers
    }

    /// Loaded desired items.
    pub fn items(&self) -> &DesiredItems {
        &self.items
    }

    fn set_path(&self, category: &str, name: &str) -> PathBuf {
        self.base_path.join(category).join(format!("{name}.yml"))
    }
}

/// Read listings from a YAML fixture or a JSON array of listings.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_listings(path: &Path) -> Result<Vec<Listing>, FixtureError> {
    let contents = read(path)?;

    let listings = if is_json(path) {
        serde_json::from_str::<Vec<Listing>>(&contents)?
    } else {
        serde_norway::from_str::<ListingsFixture>(&contents)?.listings
    };

    debug!(path = %path.display(), listings = listings.len(), "read listings");

    Ok(dedup_listings(listings))
}

/// Read shipping tiers from a YAML fixture or a JSON price-list snapshot.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a tier table is malformed.
pub fn read_shipping(path: &Path) -> Result<ShippingTierTable, FixtureError> {
    let contents = read(path)?;

    if is_json(path) {
        return Ok(ShippingTierTable::from_json_snapshot(&contents)?);
    }

    let mut tiers = ShippingTierTable::new();

    serde_norway::from_str::<ShippingFixture>(&contents)?.insert_into(&mut tiers)?;

    Ok(tiers)
}

/// Read desired item names from a YAML fixture, or plain text with one name per line.
///
/// Blank lines and lines starting with `#` are skipped in plain text.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_items(path: &Path) -> Result<DesiredItems, FixtureError> {
    let contents = read(path)?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));

    if is_yaml {
        let fixture: ItemsFixture = serde_norway::from_str(&contents)?;

        return Ok(fixture.items.iter().map(String::as_str).collect());
    }

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

fn read(path: &Path) -> Result<String, FixtureError> {
    fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use tempfile::TempDir;
    use testresult::TestResult;

    use crate::{countries::Country, items::ItemKey};

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_loads_listings_shipping_and_items() -> TestResult {
        let fixture = Fixture::from_set("split")?;

        assert_eq!(fixture.listings().len(), 4);
        assert_eq!(fixture.items().len(), 2);
        assert!(fixture.tiers().contains(&Country::new("Germany")));

        Ok(())
    }

    #[test]
    fn fixture_with_custom_base_path() -> TestResult {
        let dir = TempDir::new()?;

        write_fixture(
            dir.path(),
            "listings",
            "tiny",
            "listings:\n  - { seller: s, item: Mox, price: '2.50', country: Malta, link: 'https://example.test/mox' }\n  - { seller: s, item: Mox, price: '2.50', country: Malta }\n",
        )?;
        write_fixture(
            dir.path(),
            "shipping",
            "tiny",
            "shipping:\n  Malta:\n    - { price: '1.20', maxValue: '25' }\n",
        )?;
        write_fixture(dir.path(), "items", "tiny", "items: [Mox, mox]\n")?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture
            .load_listings("tiny")?
            .load_shipping("tiny")?
            .load_items("tiny")?;

        let listings = fixture.listings();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings.first().map(|l| l.price), Some(dec!(2.50)));
        assert_eq!(fixture.items().len(), 1);
        assert!(fixture.items().contains(&ItemKey::new("MOX")));
        assert_eq!(
            fixture.tiers().shipping_delta(&Country::new("malta"), dec!(0), dec!(2.5), false)?,
            dec!(1.20)
        );

        Ok(())
    }

    #[test]
    fn missing_fixture_reports_the_path() {
        let mut fixture = Fixture::with_base_path("./does-not-exist");

        let result = fixture.load_listings("nope");

        assert!(matches!(
            result,
            Err(FixtureError::Io { path, .. }) if path.ends_with("listings/nope.yml")
        ));
    }

    #[test]
    fn reads_json_listings_and_snapshot() -> TestResult {
        let dir = TempDir::new()?;
        let listings_path = dir.path().join("listings.json");
        let shipping_path = dir.path().join("shipping.json");

        fs::write(
            &listings_path,
            r#"[{"seller": "s", "card_name": "Mox", "price": "3.00", "country": "Germany"}]"#,
        )?;
        fs::write(
            &shipping_path,
            r#"{"GERMANY": [{"price": 1.5, "maxValue": 50}], "MALTA": {"error": "no route"}}"#,
        )?;

        let listings = read_listings(&listings_path)?;
        let tiers = read_shipping(&shipping_path)?;

        assert_eq!(listings.len(), 1);
        assert_eq!(tiers.len(), 1);
        assert!(!tiers.contains(&Country::new("Malta")));

        Ok(())
    }

    #[test]
    fn reads_plain_text_items() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("wants.txt");

        fs::write(&path, "# wants\nBlack Lotus\n\n  sol ring \n")?;

        let items = read_items(&path)?;

        assert_eq!(items.len(), 2);
        assert_eq!(items.display_name(&ItemKey::new("sol ring")), Some("sol ring"));

        Ok(())
    }

    #[test]
    fn malformed_shipping_fixture_is_rejected() -> TestResult {
        let dir = TempDir::new()?;

        write_fixture(
            dir.path(),
            "shipping",
            "bad",
            "shipping:\n  Germany:\n    - { price: '9', maxValue: '20' }\n    - { price: '3', maxValue: '100' }\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        assert!(matches!(
            fixture.load_shipping("bad"),
            Err(FixtureError::Shipping(ShippingError::MalformedTierTable { .. }))
        ));

        Ok(())
    }
}
