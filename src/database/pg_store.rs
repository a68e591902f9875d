use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::{debug, trace, trace_span};

use super::connection::{PgPool, PgPooledConnection};
use super::models::dish::{DishRecord, DishValues};
use super::models::dish_ingredient::{DishIngredientRecord, DishIngredientValues};
use crate::error::StorageError;
use crate::model::{Dish, DishIngredient};
use crate::store::{Change, ChangeSet, ParentRef, Receipt, Store};

/// [`Store`] backed by one pooled PostgreSQL connection, held for the store's lifetime.
pub struct PgStore {
    connection: PgPooledConnection,
}

impl PgStore {
    pub fn new(connection: PgPooledConnection) -> Self {
        Self { connection }
    }

    pub fn from_pool(pool: &PgPool) -> Result<Self, StorageError> {
        trace!("Checking out connection");
        Ok(Self::new(pool.get()?))
    }
}

fn apply(
    connection: &mut PgConnection,
    change: &Change,
    receipt: &Receipt,
) -> Result<Option<i32>, StorageError> {
    use crate::database::schema::{dish_ingredients, dishes};

    match change {
        Change::InsertDish(row) => {
            let id = diesel::insert_into(dishes::table)
                .values(DishValues::from(row))
                .returning(dishes::id)
                .get_result(connection)?;
            Ok(Some(id))
        }
        Change::InsertIngredient { parent, row } => {
            let dish_id = match parent {
                ParentRef::Persisted(id) => Some(*id),
                ParentRef::Pending(index) => receipt.get(*index).copied().flatten(),
                ParentRef::None => None,
            };
            // dish_id is NOT NULL; an orphan never reaches the database.
            let dish_id = dish_id.ok_or(StorageError::ForeignKey {
                table: "dish_ingredients",
                references: "dishes",
                id: None,
            })?;

            let id = diesel::insert_into(dish_ingredients::table)
                .values(DishIngredientValues::from_row(row, dish_id))
                .returning(dish_ingredients::id)
                .get_result(connection)?;
            Ok(Some(id))
        }
        Change::UpdateDish { id, row } => {
            let updated = diesel::update(dishes::table.find(*id))
                .set(DishValues::from(row))
                .execute(connection)?;
            expect_one(updated, "dishes", *id)
        }
        Change::UpdateIngredient { id, dish_id, row } => {
            let updated = diesel::update(dish_ingredients::table.find(*id))
                .set(DishIngredientValues::from_row(row, *dish_id))
                .execute(connection)?;
            expect_one(updated, "dish_ingredients", *id)
        }
        Change::DeleteIngredient(id) => {
            let deleted =
                diesel::delete(dish_ingredients::table.find(*id)).execute(connection)?;
            expect_one(deleted, "dish_ingredients", *id)
        }
        Change::DeleteDish(id) => {
            let deleted = diesel::delete(dishes::table.find(*id)).execute(connection)?;
            expect_one(deleted, "dishes", *id)
        }
    }
}

fn expect_one(affected: usize, table: &'static str, id: i32) -> Result<Option<i32>, StorageError> {
    if affected == 0 {
        Err(StorageError::NotFound { table, id })
    } else {
        Ok(None)
    }
}

fn with_ingredients(
    connection: &mut PgConnection,
    records: Vec<DishRecord>,
) -> Result<Vec<Dish>, StorageError> {
    use crate::database::schema::dish_ingredients;

    let ingredients = DishIngredientRecord::belonging_to(&records)
        .select(DishIngredientRecord::as_select())
        .order(dish_ingredients::id)
        .load(connection)?;

    let dishes = ingredients
        .grouped_by(&records)
        .into_iter()
        .zip(records)
        .map(|(ingredients, record)| {
            let mut dish = Dish::from(record);
            dish.ingredients = ingredients.into_iter().map(DishIngredient::from).collect();
            dish
        })
        .collect();

    Ok(dishes)
}

/// `LIKE` pattern matching `needle` literally anywhere in the value.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Store for PgStore {
    fn commit(&mut self, changes: &ChangeSet) -> Result<Receipt, StorageError> {
        let span = trace_span!("postgres commit", changes = changes.len());
        let _guard = span.enter();

        debug_assert!(changes.is_ordered());

        let receipt = self
            .connection
            .build_transaction()
            .run(|connection| {
                let mut receipt = Receipt::with_capacity(changes.len());
                for change in changes.changes() {
                    let generated = apply(connection, change, &receipt)?;
                    receipt.push(generated);
                }
                Ok::<_, StorageError>(receipt)
            })?;

        debug!("Committed {} changes", receipt.len());
        Ok(receipt)
    }

    fn dishes_with_title_containing(&mut self, needle: &str) -> Result<Vec<Dish>, StorageError> {
        use crate::database::schema::dishes;

        let span = trace_span!("querying dishes by title", needle);
        let _guard = span.enter();

        let records = dishes::table
            .filter(dishes::title.like(contains_pattern(needle)))
            .order(dishes::id)
            .select(DishRecord::as_select())
            .load(&mut self.connection)?;

        trace!("Found {} dishes", records.len());
        with_ingredients(&mut self.connection, records)
    }

    fn find_dish(&mut self, id: i32) -> Result<Option<Dish>, StorageError> {
        use crate::database::schema::dishes;

        let record = dishes::table
            .find(id)
            .select(DishRecord::as_select())
            .first(&mut self.connection)
            .optional()?;

        match record {
            Some(record) => Ok(with_ingredients(&mut self.connection, vec![record])?.pop()),
            None => Ok(None),
        }
    }
}
