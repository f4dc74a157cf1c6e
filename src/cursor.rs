//! Deck position and advance policies.

use crate::dataset::WordDataset;
use crate::error::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Position in the deck: a family and an entry within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    pub family_index: usize,
    pub entry_index: usize,
}

impl Cursor {
    pub const fn new(family_index: usize, entry_index: usize) -> Self {
        Self {
            family_index,
            entry_index,
        }
    }

    /// True when both indices are in range for `dataset`.
    pub fn is_valid(&self, dataset: &WordDataset) -> bool {
        self.family_index < dataset.family_count()
            && self.entry_index < dataset.entry_count(self.family_index)
    }
}

/// Point the cursor at the first entry of `key`.
///
/// Fails with `UnknownFamily` without touching anything when `key` is absent.
pub fn select_family(_cursor: Cursor, dataset: &WordDataset, key: &str) -> Result<Cursor> {
    let family_index = dataset.index_of(key)?;
    Ok(Cursor::new(family_index, 0))
}

/// How a policy's upcoming positions should be sampled for prefetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Positions follow one another; walking them eventually returns to the start.
    Walk,
    /// Every draw is independent of the previous cursor.
    Independent,
}

/// Which advance policy a deck uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Sequential,
    Random,
}

impl PolicyKind {
    /// Build the policy. `seed` only affects `Random`.
    pub fn build(self, seed: Option<u64>) -> Box<dyn AdvancePolicy> {
        match self {
            PolicyKind::Sequential => Box::new(Sequential),
            PolicyKind::Random => Box::new(match seed {
                Some(seed) => RandomOrder::seeded(seed),
                None => RandomOrder::new(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PolicyKind::Sequential => "Sequential",
            PolicyKind::Random => "Game mode",
        }
    }
}

/// Strategy for choosing the next card.
pub trait AdvancePolicy {
    /// Starting position for a freshly loaded deck.
    fn init(&mut self, dataset: &WordDataset) -> Cursor;

    /// Position following `cursor`.
    fn advance(&mut self, cursor: Cursor, dataset: &WordDataset) -> Cursor;

    fn sampling(&self) -> Sampling;

    fn kind(&self) -> PolicyKind;
}

/// Families in document order, entries in list order, wrapping at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl AdvancePolicy for Sequential {
    fn init(&mut self, _dataset: &WordDataset) -> Cursor {
        Cursor::new(0, 0)
    }

    fn advance(&mut self, cursor: Cursor, dataset: &WordDataset) -> Cursor {
        let entry_index = cursor.entry_index + 1;
        if entry_index < dataset.entry_count(cursor.family_index) {
            return Cursor::new(cursor.family_index, entry_index);
        }
        let family_count = dataset.family_count().max(1);
        Cursor::new((cursor.family_index + 1) % family_count, 0)
    }

    fn sampling(&self) -> Sampling {
        Sampling::Walk
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Sequential
    }
}

/// Uniformly random family, then uniformly random entry ("game mode").
///
/// Repeats are possible, including the same card twice in a row.
#[derive(Debug, Clone)]
pub struct RandomOrder {
    rng: SmallRng,
}

impl RandomOrder {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn draw(&mut self, dataset: &WordDataset) -> Cursor {
        let family_count = dataset.family_count();
        if family_count == 0 {
            return Cursor::default();
        }
        let family_index = self.rng.gen_range(0..family_count);
        let entry_count = dataset.entry_count(family_index);
        let entry_index = if entry_count == 0 {
            0
        } else {
            self.rng.gen_range(0..entry_count)
        };
        Cursor::new(family_index, entry_index)
    }
}

impl Default for RandomOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvancePolicy for RandomOrder {
    fn init(&mut self, dataset: &WordDataset) -> Cursor {
        self.draw(dataset)
    }

    fn advance(&mut self, _cursor: Cursor, dataset: &WordDataset) -> Cursor {
        self.draw(dataset)
    }

    fn sampling(&self) -> Sampling {
        Sampling::Independent
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Random
    }
}
