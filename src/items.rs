//! Items

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Normalized item identity.
///
/// Item names are compared case-insensitively with surrounding whitespace trimmed and internal
/// whitespace runs collapsed, so `" Sol  Ring"` and `"sol ring"` name the same item. Ordering
/// is lexicographic on the normalized form, which is the order the solvers process items in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Normalize an item name into its key.
    pub fn new(name: &str) -> Self {
        let normalized = name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        Self(normalized)
    }

    /// The normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ItemKey {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&str> for ItemKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of items a shopper wants, in solver order.
///
/// Each key keeps the first display spelling it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredItems {
    items: BTreeMap<ItemKey, String>,
}

impl DesiredItems {
    /// Create an empty set of desired items.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item by display name. Returns `false` if an equivalent item was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = ItemKey::new(name);

        if key.as_str().is_empty() || self.items.contains_key(&key) {
            return false;
        }

        self.items.insert(key, name.trim().to_string());

        true
    }

    /// Whether the item is desired.
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.contains_key(key)
    }

    /// Display name for a desired item.
    pub fn display_name(&self, key: &ItemKey) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Iterate over `(key, display name)` pairs in solver order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &str)> {
        self.items.iter().map(|(key, name)| (key, name.as_str()))
    }

    /// Iterate over keys in solver order.
    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.keys()
    }

    /// Number of desired items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are desired.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keep only the items for which `offered` returns true, returning the display names of
    /// the items that were dropped.
    pub fn retain_offered(&mut self, mut offered: impl FnMut(&ItemKey) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();

        self.items.retain(|key, name| {
            let keep = offered(key);

            if !keep {
                dropped.push(name.clone());
            }

            keep
        });

        dropped
    }
}

impl<'a> FromIterator<&'a str> for DesiredItems {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut items = Self::new();

        for name in iter {
            items.insert(name);
        }

        items
    }
}

impl FromIterator<String> for DesiredItems {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut items = Self::new();

        for name in iter {
            items.insert(&name);
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_ignores_case_and_whitespace() {
        assert_eq!(ItemKey::new("  Sol   Ring "), ItemKey::new("sol ring"));
        assert_eq!(ItemKey::new("Mishra's Bauble").as_str(), "mishra's bauble");
    }

    #[test]
    fn desired_items_are_ordered_by_normalized_key() {
        let items: DesiredItems = ["Zuran Orb", "arcane signet", "Brainstorm"]
            .into_iter()
            .collect();

        let keys: Vec<&str> = items.keys().map(ItemKey::as_str).collect();

        assert_eq!(keys, vec!["arcane signet", "brainstorm", "zuran orb"]);
    }

    #[test]
    fn desired_items_keep_first_display_name() {
        let mut items = DesiredItems::new();

        assert!(items.insert("Sol Ring"));
        assert!(!items.insert("SOL RING"));
        assert!(!items.insert("   "));

        assert_eq!(items.len(), 1);
        assert_eq!(items.display_name(&ItemKey::new("sol ring")), Some("Sol Ring"));
    }

    #[test]
    fn retain_offered_reports_dropped_items() {
        let mut items: DesiredItems = ["Ponder", "Preordain"].into_iter().collect();

        let dropped = items.retain_offered(|key| key.as_str() == "ponder");

        assert_eq!(dropped, vec!["Preordain".to_string()]);
        assert_eq!(items.len(), 1);
        assert!(items.contains(&ItemKey::new("Ponder")));
    }
}
