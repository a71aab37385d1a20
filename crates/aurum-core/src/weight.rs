//! Gold weighting table
//!
//! Maps an item kind to its fractional gold value. Every counter in
//! the tracker goes through [`WeightTable::tally`]; items without a
//! weighting contribute nothing.

use std::collections::HashMap;
use std::fmt;

/// Item kind identifier
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item({})", self.0)
    }
}

/// One inventory slot's contents
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        ItemStack {
            item: ItemId::new(item),
            count,
        }
    }
}

/// Default weightings, in gold units per item
const DEFAULT_WEIGHTS: &[(&str, f64)] = &[
    ("gold_block", 9.0),
    ("raw_gold_block", 9.0),
    ("gold_ore", 1.0),
    ("deepslate_gold_ore", 1.0),
    ("nether_gold_ore", 1.0),
    ("raw_gold", 1.0),
    ("gold_ingot", 1.0),
    ("gold_nugget", 0.1),
];

/// Item kind to gold value lookup
#[derive(Clone, Debug)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    /// Build a table from explicit weightings
    pub fn from_weights(weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        WeightTable {
            weights: weights.into_iter().collect(),
        }
    }

    /// Weight of one item, zero when untracked
    #[inline]
    pub fn weight(&self, item: &ItemId) -> f64 {
        self.weights.get(item.as_str()).copied().unwrap_or(0.0)
    }

    /// Whether the item carries any gold value
    #[inline]
    pub fn is_tracked(&self, item: &ItemId) -> bool {
        self.weights.contains_key(item.as_str())
    }

    /// Sum of weight x count over a set of slots
    pub fn tally<'a>(&self, slots: impl IntoIterator<Item = &'a ItemStack>) -> f64 {
        slots
            .into_iter()
            .map(|slot| self.weight(&slot.item) * slot.count as f64)
            .sum()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        WeightTable::from_weights(
            DEFAULT_WEIGHTS
                .iter()
                .map(|&(item, weight)| (item.to_string(), weight)),
        )
    }
}
