//! Item catalog: item kinds, sort categories, and the ground truth between them.
//!
//! Also home of the [`KindBag`], the shuffle bag that decides which kind is
//! shown next during training and which kind each spawned item gets.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A kind of recyclable item in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Aluminium drink can.
    SodaCan,
    /// Scrap of paper.
    Note,
    /// Plastic bottle.
    WaterBottle,
}

impl ItemKind {
    /// Every catalog entry, in catalog order.
    pub const ALL: [ItemKind; 3] = [ItemKind::SodaCan, ItemKind::Note, ItemKind::WaterBottle];

    /// The category this kind actually belongs to.
    pub fn ground_truth(self) -> Category {
        match self {
            ItemKind::SodaCan => Category::Metal,
            ItemKind::Note => Category::Paper,
            ItemKind::WaterBottle => Category::Plastic,
        }
    }

    /// Name used in snapshots and on screen.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::SodaCan => "sodaCan",
            ItemKind::Note => "note",
            ItemKind::WaterBottle => "waterBottle",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown item kind '{}'", s))
    }
}

/// A sort destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Metal,
    Paper,
    Plastic,
}

impl Category {
    /// Every category, in bin order.
    pub const ALL: [Category; 3] = [Category::Metal, Category::Paper, Category::Plastic];

    /// Name used in snapshots and on screen.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Metal => "metal",
            Category::Paper => "paper",
            Category::Plastic => "plastic",
        }
    }

    /// Position of this category in [`Category::ALL`].
    pub fn index(self) -> usize {
        match self {
            Category::Metal => 0,
            Category::Paper => 1,
            Category::Plastic => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Shuffle bag over the catalog.
///
/// Kinds are drawn uniformly without replacement; an empty bag is refilled
/// with every kind before the next draw. Any window of `ItemKind::ALL.len()`
/// draws aligned to a refill contains every kind exactly once.
#[derive(Debug, Clone, Default)]
pub struct KindBag {
    remaining: Vec<ItemKind>,
}

impl KindBag {
    /// Create a full bag.
    pub fn new() -> Self {
        Self {
            remaining: ItemKind::ALL.to_vec(),
        }
    }

    /// Kinds left before the next refill.
    pub fn remaining(&self) -> &[ItemKind] {
        &self.remaining
    }

    /// Draw the next kind.
    pub fn draw(&mut self, rng: &mut impl Rng) -> ItemKind {
        if self.remaining.is_empty() {
            self.remaining = ItemKind::ALL.to_vec();
        }
        let index = rng.random_range(0..self.remaining.len());
        self.remaining.swap_remove(index)
    }
}
