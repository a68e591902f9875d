mod memory;

pub use memory::MemoryStore;

use bigdecimal::{BigDecimal, RoundingMode};

use crate::error::StorageError;
use crate::model::{Dish, AMOUNT_SCALE};

/// Where an inserted ingredient gets its `dish_id` from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Persisted(i32),
    /// Index of an `InsertDish` in the same change set.
    Pending(usize),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DishRow {
    pub title: String,
    pub notes: Option<String>,
    pub stars: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientRow {
    pub description: String,
    pub unit_of_measure: String,
    pub amount: BigDecimal,
}

impl IngredientRow {
    /// The row as a `numeric(5,2)` column keeps it.
    pub fn stored(&self) -> IngredientRow {
        IngredientRow {
            amount: round_to_scale(&self.amount, AMOUNT_SCALE),
            ..self.clone()
        }
    }
}

/// Rounds like PostgreSQL `numeric`: half away from zero.
pub fn round_to_scale(value: &BigDecimal, scale: u32) -> BigDecimal {
    value.with_scale_round(i64::from(scale), RoundingMode::HalfUp)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    InsertDish(DishRow),
    InsertIngredient {
        parent: ParentRef,
        row: IngredientRow,
    },
    UpdateDish {
        id: i32,
        row: DishRow,
    },
    UpdateIngredient {
        id: i32,
        dish_id: i32,
        row: IngredientRow,
    },
    DeleteIngredient(i32),
    DeleteDish(i32),
}

impl Change {
    fn rank(&self) -> u8 {
        match self {
            Change::InsertDish(_) => 0,
            Change::InsertIngredient { .. } => 1,
            Change::UpdateDish { .. } => 2,
            Change::UpdateIngredient { .. } => 3,
            Change::DeleteIngredient(_) => 4,
            Change::DeleteDish(_) => 5,
        }
    }
}

/// Pending writes of one save, applied atomically and in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the position of the change, usable as a [`ParentRef::Pending`].
    pub fn push(&mut self, change: Change) -> usize {
        self.changes.push(change);
        self.changes.len() - 1
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Inserts must land before anything that references them, ingredient deletes
    /// before dish deletes. Callers push in that order; this checks it.
    pub fn is_ordered(&self) -> bool {
        self.changes
            .windows(2)
            .all(|pair| pair[0].rank() <= pair[1].rank())
    }
}

/// Generated keys of a commit, one slot per change (only inserts get `Some`).
pub type Receipt = Vec<Option<i32>>;

/// Durable storage for dishes and their ingredients.
pub trait Store {
    /// Applies every change or none of them.
    fn commit(&mut self, changes: &ChangeSet) -> Result<Receipt, StorageError>;

    /// Committed dishes whose title contains `needle` (case-sensitive), ordered by id,
    /// with their ingredients loaded.
    fn dishes_with_title_containing(&mut self, needle: &str) -> Result<Vec<Dish>, StorageError>;

    fn find_dish(&mut self, id: i32) -> Result<Option<Dish>, StorageError>;
}
