//! Unit of work over a [`Store`].
//!
//! Dishes handed to a session are tracked in memory. Nothing reaches storage until
//! [`Session::save`], which validates every pending row and commits them in one
//! transaction. Queries always read committed state.

mod tracker;
mod validate;

pub use tracker::{DishKey, EntryState, IngredientKey};

use tracing::{debug, info, trace_span};

use crate::config::DatabaseConfig;
use crate::database::connection::{establish_pooled_connection, PgPool};
use crate::database::pg_store::PgStore;
use crate::error::Result;
use crate::model::{Dish, DishIngredient};
use crate::store::Store;
use tracker::Tracker;

pub struct Session<S: Store> {
    store: S,
    tracker: Tracker,
}

impl Session<PgStore> {
    /// Opens a session on its own pooled PostgreSQL connection.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = establish_pooled_connection(config)?;
        Self::open(&pool)
    }

    pub fn open(pool: &PgPool) -> Result<Self> {
        Ok(Self::new(PgStore::from_pool(pool)?))
    }
}

impl<S: Store> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tracker: Tracker::new(),
        }
    }

    /// Stages a new dish, with its ingredients, for insertion.
    pub fn add(&mut self, dish: Dish) -> DishKey {
        self.tracker.add(dish)
    }

    /// Stages an ingredient on its own; `dish_id` must name a saved dish.
    pub fn add_ingredient(&mut self, ingredient: DishIngredient) -> IngredientKey {
        self.tracker.add_ingredient(ingredient)
    }

    /// Tracks a dish loaded from storage so later edits are saved.
    pub fn attach(&mut self, dish: Dish) -> Result<DishKey> {
        Ok(self.tracker.attach(dish)?)
    }

    pub fn dish(&self, key: DishKey) -> Option<&Dish> {
        self.tracker.dish(key)
    }

    pub fn dish_mut(&mut self, key: DishKey) -> Option<&mut Dish> {
        self.tracker.dish_mut(key)
    }

    pub fn state(&self, key: DishKey) -> Option<EntryState> {
        self.tracker.state(key)
    }

    pub fn ingredient(&self, key: IngredientKey) -> Option<&DishIngredient> {
        self.tracker.ingredient(key)
    }

    /// Marks a dish for deletion. Returns false if it is not tracked or already removed.
    pub fn remove(&mut self, key: DishKey) -> bool {
        self.tracker.remove(key)
    }

    pub fn has_changes(&self) -> bool {
        self.tracker.has_changes()
    }

    /// Applies every staged change atomically and returns how many rows were written.
    /// On failure nothing is written and the changes stay staged.
    pub fn save(&mut self) -> Result<usize> {
        let span = trace_span!("saving changes");
        let _guard = span.enter();

        let plan = self.tracker.plan()?;
        if plan.is_empty() {
            debug!("Nothing to save");
            return Ok(0);
        }

        let receipt = self.store.commit(&plan.changes)?;
        let written = receipt.len();
        self.tracker.complete(plan, receipt);

        info!("Saved {written} changes");
        Ok(written)
    }

    /// Committed dishes whose title contains `needle`.
    pub fn query(&mut self, needle: &str) -> Result<Vec<Dish>> {
        Ok(self.store.dishes_with_title_containing(needle)?)
    }

    pub fn find(&mut self, id: i32) -> Result<Option<Dish>> {
        Ok(self.store.find_dish(id)?)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
