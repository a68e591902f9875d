use tracing::trace;

use super::validate::{self, DISH, INGREDIENT};
use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{Dish, DishIngredient};
use crate::store::{Change, ChangeSet, DishRow, IngredientRow, ParentRef, Receipt};

/// Handle to a dish tracked by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DishKey(usize);

/// Handle to an ingredient added on its own, outside any dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IngredientKey(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Unchanged,
    Deleted,
}

#[derive(Debug)]
struct Entry {
    dish: Dish,
    /// Values as last committed; `None` while the dish is only added.
    original: Option<Dish>,
    state: EntryState,
}

#[derive(Debug)]
struct LooseIngredient {
    ingredient: DishIngredient,
    saved: bool,
}

/// What each change of a plan writes back to once committed.
#[derive(Debug, Clone, Copy)]
enum Target {
    Dish(usize),
    DishIngredient(usize, usize),
    Ingredient(usize),
    Nothing,
}

/// A validated change set plus where its generated keys go.
#[derive(Debug)]
pub struct Plan {
    pub changes: ChangeSet,
    targets: Vec<Target>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[derive(Default)]
struct Buckets {
    insert_dishes: Vec<(Change, Target)>,
    insert_ingredients: Vec<(Change, Target)>,
    update_dishes: Vec<(Change, Target)>,
    update_ingredients: Vec<(Change, Target)>,
    delete_ingredients: Vec<(Change, Target)>,
    delete_dishes: Vec<(Change, Target)>,
}

impl Buckets {
    fn into_plan(self) -> Plan {
        let mut changes = ChangeSet::new();
        let mut targets = Vec::new();
        for (change, target) in self
            .insert_dishes
            .into_iter()
            .chain(self.insert_ingredients)
            .chain(self.update_dishes)
            .chain(self.update_ingredients)
            .chain(self.delete_ingredients)
            .chain(self.delete_dishes)
        {
            changes.push(change);
            targets.push(target);
        }
        Plan { changes, targets }
    }
}

fn dish_row(dish: &Dish) -> DishRow {
    DishRow {
        title: dish.title.clone(),
        notes: dish.notes.clone(),
        stars: dish.stars,
    }
}

fn ingredient_row(ingredient: &DishIngredient) -> IngredientRow {
    IngredientRow {
        description: ingredient.description.clone(),
        unit_of_measure: ingredient.unit_of_measure.clone(),
        amount: ingredient.amount.clone(),
    }
}

/// Identity map and change tracking for one session.
#[derive(Debug, Default)]
pub struct Tracker {
    // Detached entries stay as `None` so keys are never reused.
    dishes: Vec<Option<Entry>>,
    ingredients: Vec<LooseIngredient>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dish: Dish) -> DishKey {
        self.push(Entry {
            dish,
            original: None,
            state: EntryState::Added,
        })
    }

    /// Starts tracking a dish that already exists in storage.
    pub fn attach(&mut self, dish: Dish) -> Result<DishKey, ValidationError> {
        if dish.id.is_none() {
            return Err(ValidationError::new(
                DISH,
                "id",
                ValidationErrorKind::Required,
            ));
        }

        // Already tracked: hand out the existing key.
        if let Some(index) = self.dishes.iter().position(|entry| {
            entry
                .as_ref()
                .and_then(|entry| entry.original.as_ref())
                .is_some_and(|original| original.id == dish.id)
        }) {
            return Ok(DishKey(index));
        }

        Ok(self.push(Entry {
            original: Some(dish.clone()),
            dish,
            state: EntryState::Unchanged,
        }))
    }

    fn push(&mut self, entry: Entry) -> DishKey {
        self.dishes.push(Some(entry));
        DishKey(self.dishes.len() - 1)
    }

    pub fn add_ingredient(&mut self, ingredient: DishIngredient) -> IngredientKey {
        self.ingredients.push(LooseIngredient {
            ingredient,
            saved: false,
        });
        IngredientKey(self.ingredients.len() - 1)
    }

    fn entry(&self, key: DishKey) -> Option<&Entry> {
        self.dishes.get(key.0).and_then(Option::as_ref)
    }

    pub fn dish(&self, key: DishKey) -> Option<&Dish> {
        self.entry(key).map(|entry| &entry.dish)
    }

    pub fn dish_mut(&mut self, key: DishKey) -> Option<&mut Dish> {
        self.dishes
            .get_mut(key.0)
            .and_then(Option::as_mut)
            .map(|entry| &mut entry.dish)
    }

    pub fn state(&self, key: DishKey) -> Option<EntryState> {
        self.entry(key).map(|entry| entry.state)
    }

    pub fn ingredient(&self, key: IngredientKey) -> Option<&DishIngredient> {
        self.ingredients.get(key.0).map(|loose| &loose.ingredient)
    }

    /// Added dishes are simply forgotten; persisted ones are deleted on the next save.
    pub fn remove(&mut self, key: DishKey) -> bool {
        let Some(slot) = self.dishes.get_mut(key.0) else {
            return false;
        };

        match slot.as_ref().map(|entry| entry.state) {
            Some(EntryState::Added) => {
                *slot = None;
                true
            }
            Some(EntryState::Unchanged) => {
                if let Some(entry) = slot.as_mut() {
                    entry.state = EntryState::Deleted;
                }
                true
            }
            Some(EntryState::Deleted) | None => false,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.ingredients.iter().any(|loose| !loose.saved)
            || self.dishes.iter().flatten().any(|entry| match entry.state {
                EntryState::Added | EntryState::Deleted => true,
                EntryState::Unchanged => entry
                    .original
                    .as_ref()
                    .map_or(true, |original| is_modified(&entry.dish, original)),
            })
    }

    /// Validates every pending write and orders them into one change set.
    pub fn plan(&self) -> Result<Plan, ValidationError> {
        let mut buckets = Buckets::default();

        for (index, entry) in self.dishes.iter().enumerate() {
            let Some(entry) = entry else { continue };

            match (entry.state, &entry.original) {
                (EntryState::Added, _) => plan_insert(&mut buckets, index, &entry.dish)?,
                (EntryState::Unchanged, Some(original)) => {
                    plan_update(&mut buckets, index, &entry.dish, original)?
                }
                (EntryState::Deleted, Some(original)) => {
                    let id = original_id(original)?;
                    buckets
                        .delete_dishes
                        .push((Change::DeleteDish(id), Target::Dish(index)));
                }
                (EntryState::Unchanged | EntryState::Deleted, None) => {}
            }
        }

        for (index, loose) in self.ingredients.iter().enumerate() {
            if loose.saved {
                continue;
            }
            let ingredient = &loose.ingredient;
            validate::unset_key(INGREDIENT, ingredient.id)?;
            validate::ingredient_columns(ingredient)?;

            let parent = ingredient
                .dish_id
                .map(ParentRef::Persisted)
                .unwrap_or(ParentRef::None);
            buckets.insert_ingredients.push((
                Change::InsertIngredient {
                    parent,
                    row: ingredient_row(ingredient),
                },
                Target::Ingredient(index),
            ));
        }

        let plan = buckets.into_plan();
        trace!("Planned {} changes", plan.changes.len());
        Ok(plan)
    }

    /// Writes generated keys back and makes the committed values the new baseline.
    pub fn complete(&mut self, plan: Plan, receipt: Receipt) {
        for (target, generated) in plan.targets.into_iter().zip(receipt) {
            let Some(id) = generated else { continue };
            match target {
                Target::Dish(index) => {
                    if let Some(entry) = self.dishes[index].as_mut() {
                        entry.dish.id = Some(id);
                    }
                }
                Target::DishIngredient(index, position) => {
                    if let Some(ingredient) = self.dishes[index]
                        .as_mut()
                        .and_then(|entry| entry.dish.ingredients.get_mut(position))
                    {
                        ingredient.id = Some(id);
                    }
                }
                Target::Ingredient(index) => {
                    let loose = &mut self.ingredients[index];
                    loose.ingredient.id = Some(id);
                    loose.saved = true;
                }
                Target::Nothing => {}
            }
        }

        for slot in self.dishes.iter_mut() {
            let Some(entry) = slot.as_mut() else { continue };
            if entry.state == EntryState::Deleted {
                *slot = None;
                continue;
            }

            let dish_id = entry.dish.id;
            for ingredient in entry.dish.ingredients.iter_mut() {
                ingredient.dish_id = dish_id;
            }
            entry.state = EntryState::Unchanged;
            entry.original = Some(entry.dish.clone());
        }
    }
}

fn original_id(original: &Dish) -> Result<i32, ValidationError> {
    original
        .id
        .ok_or_else(|| ValidationError::new(DISH, "id", ValidationErrorKind::Required))
}

fn known_ingredient(original: &Dish, id: i32) -> Option<&DishIngredient> {
    original
        .ingredients
        .iter()
        .find(|known| known.id == Some(id))
}

/// Ingredients are matched by key, so reordering the list is not a change.
fn is_modified(current: &Dish, original: &Dish) -> bool {
    if current.id != original.id || !current.same_columns(original) {
        return true;
    }

    let changed = current.ingredients.iter().any(|ingredient| match ingredient.id {
        None => true,
        Some(id) => known_ingredient(original, id)
            .map_or(true, |known| !known.same_columns(ingredient)),
    });
    let dropped = original.ingredients.iter().any(|known| {
        !current
            .ingredients
            .iter()
            .any(|ingredient| ingredient.id == known.id)
    });
    changed || dropped
}

fn plan_insert(buckets: &mut Buckets, index: usize, dish: &Dish) -> Result<(), ValidationError> {
    validate::unset_key(DISH, dish.id)?;
    validate::dish_columns(dish)?;

    let pending = buckets.insert_dishes.len();
    buckets
        .insert_dishes
        .push((Change::InsertDish(dish_row(dish)), Target::Dish(index)));

    for (position, ingredient) in dish.ingredients.iter().enumerate() {
        validate::unset_key(INGREDIENT, ingredient.id)?;
        validate::ingredient_columns(ingredient)?;
        buckets.insert_ingredients.push((
            Change::InsertIngredient {
                parent: ParentRef::Pending(pending),
                row: ingredient_row(ingredient),
            },
            Target::DishIngredient(index, position),
        ));
    }
    Ok(())
}

fn plan_update(
    buckets: &mut Buckets,
    index: usize,
    dish: &Dish,
    original: &Dish,
) -> Result<(), ValidationError> {
    let id = original_id(original)?;
    validate::unchanged_key(DISH, id, dish.id)?;

    if !dish.same_columns(original) {
        validate::dish_columns(dish)?;
        buckets.update_dishes.push((
            Change::UpdateDish {
                id,
                row: dish_row(dish),
            },
            Target::Nothing,
        ));
    }

    for (position, ingredient) in dish.ingredients.iter().enumerate() {
        match ingredient.id {
            None => {
                validate::ingredient_columns(ingredient)?;
                buckets.insert_ingredients.push((
                    Change::InsertIngredient {
                        parent: ParentRef::Persisted(id),
                        row: ingredient_row(ingredient),
                    },
                    Target::DishIngredient(index, position),
                ));
            }
            Some(ingredient_id) => {
                // A key from elsewhere would move another dish's row here.
                let known = known_ingredient(original, ingredient_id).ok_or_else(|| {
                    ValidationError::new(
                        INGREDIENT,
                        "id",
                        ValidationErrorKind::UnknownKey { id: ingredient_id },
                    )
                })?;
                if known.same_columns(ingredient) {
                    continue;
                }
                validate::ingredient_columns(ingredient)?;
                buckets.update_ingredients.push((
                    Change::UpdateIngredient {
                        id: ingredient_id,
                        dish_id: id,
                        row: ingredient_row(ingredient),
                    },
                    Target::Nothing,
                ));
            }
        }
    }

    for dropped in original.ingredients.iter().filter_map(|known| known.id) {
        if !dish.ingredients.iter().any(|current| current.id == Some(dropped)) {
            buckets
                .delete_ingredients
                .push((Change::DeleteIngredient(dropped), Target::Nothing));
        }
    }
    Ok(())
}
