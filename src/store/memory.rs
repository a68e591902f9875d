use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::{debug, trace_span};

use super::{Change, ChangeSet, DishRow, IngredientRow, ParentRef, Receipt, Store};
use crate::error::StorageError;
use crate::model::{Dish, DishIngredient};

#[derive(Debug, Clone, Default)]
struct Tables {
    dishes: BTreeMap<i32, DishRow>,
    ingredients: BTreeMap<i32, (i32, IngredientRow)>,
    next_dish_id: i32,
    next_ingredient_id: i32,
}

/// In-process store with the same relational rules as the PostgreSQL schema:
/// serial keys, the `dish_id` foreign key and its cascade, `numeric(5,2)` rounding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dish_count(&self) -> usize {
        self.tables.dishes.len()
    }

    pub fn ingredient_count(&self) -> usize {
        self.tables.ingredients.len()
    }

    fn load(&self, ids: impl IntoIterator<Item = i32>) -> Vec<Dish> {
        let ids: Vec<i32> = ids.into_iter().collect();
        let mut ingredients = self
            .tables
            .ingredients
            .iter()
            .filter(|(_, (dish_id, _))| ids.contains(dish_id))
            .map(|(id, (dish_id, row))| DishIngredient {
                id: Some(*id),
                description: row.description.clone(),
                unit_of_measure: row.unit_of_measure.clone(),
                amount: row.amount.clone(),
                dish_id: Some(*dish_id),
            })
            .into_group_map_by(|ingredient| ingredient.dish_id);

        ids.into_iter()
            .filter_map(|id| {
                self.tables.dishes.get(&id).map(|row| Dish {
                    id: Some(id),
                    title: row.title.clone(),
                    notes: row.notes.clone(),
                    stars: row.stars,
                    ingredients: ingredients.remove(&Some(id)).unwrap_or_default(),
                })
            })
            .collect()
    }
}

impl Tables {
    fn apply(&mut self, change: &Change, receipt: &Receipt) -> Result<Option<i32>, StorageError> {
        match change {
            Change::InsertDish(row) => {
                self.next_dish_id += 1;
                self.dishes.insert(self.next_dish_id, row.clone());
                Ok(Some(self.next_dish_id))
            }
            Change::InsertIngredient { parent, row } => {
                let dish_id = match parent {
                    ParentRef::Persisted(id) => Some(*id),
                    ParentRef::Pending(index) => receipt.get(*index).copied().flatten(),
                    ParentRef::None => None,
                };
                let dish_id = self.existing_dish(dish_id)?;

                self.next_ingredient_id += 1;
                self.ingredients
                    .insert(self.next_ingredient_id, (dish_id, row.stored()));
                Ok(Some(self.next_ingredient_id))
            }
            Change::UpdateDish { id, row } => {
                let current = self.dishes.get_mut(id).ok_or(StorageError::NotFound {
                    table: "dishes",
                    id: *id,
                })?;
                *current = row.clone();
                Ok(None)
            }
            Change::UpdateIngredient { id, dish_id, row } => {
                let dish_id = self.existing_dish(Some(*dish_id))?;
                let current = self.ingredients.get_mut(id).ok_or(StorageError::NotFound {
                    table: "dish_ingredients",
                    id: *id,
                })?;
                *current = (dish_id, row.stored());
                Ok(None)
            }
            Change::DeleteIngredient(id) => {
                self.ingredients
                    .remove(id)
                    .ok_or(StorageError::NotFound {
                        table: "dish_ingredients",
                        id: *id,
                    })?;
                Ok(None)
            }
            Change::DeleteDish(id) => {
                self.dishes.remove(id).ok_or(StorageError::NotFound {
                    table: "dishes",
                    id: *id,
                })?;
                // ON DELETE CASCADE
                self.ingredients.retain(|_, (dish_id, _)| dish_id != id);
                Ok(None)
            }
        }
    }

    fn existing_dish(&self, dish_id: Option<i32>) -> Result<i32, StorageError> {
        dish_id
            .filter(|id| self.dishes.contains_key(id))
            .ok_or(StorageError::ForeignKey {
                table: "dish_ingredients",
                references: "dishes",
                id: dish_id,
            })
    }
}

impl Store for MemoryStore {
    fn commit(&mut self, changes: &ChangeSet) -> Result<Receipt, StorageError> {
        let span = trace_span!("memory commit", changes = changes.len());
        let _guard = span.enter();

        debug_assert!(changes.is_ordered());

        // Work on a copy so a failure leaves the committed tables untouched.
        let mut tables = self.tables.clone();
        let mut receipt = Receipt::with_capacity(changes.len());
        for change in changes.changes() {
            let generated = tables.apply(change, &receipt)?;
            receipt.push(generated);
        }

        self.tables = tables;
        debug!("Committed {} changes", receipt.len());
        Ok(receipt)
    }

    fn dishes_with_title_containing(&mut self, needle: &str) -> Result<Vec<Dish>, StorageError> {
        let ids: Vec<i32> = self
            .tables
            .dishes
            .iter()
            .filter(|(_, row)| row.title.contains(needle))
            .map(|(id, _)| *id)
            .collect();

        Ok(self.load(ids))
    }

    fn find_dish(&mut self, id: i32) -> Result<Option<Dish>, StorageError> {
        Ok(self.load([id]).pop())
    }
}
