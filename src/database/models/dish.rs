use diesel::prelude::*;
use lombok::AllArgsConstructor;

use crate::model::Dish;
use crate::store::DishRow;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::dishes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DishRecord {
    pub id: i32,
    pub title: String,
    pub notes: Option<String>,
    pub stars: Option<i32>,
}

#[derive(Insertable, AsChangeset, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::dishes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
// Nullable columns are written as NULL, not skipped
#[diesel(treat_none_as_null = true)]
pub struct DishValues {
    pub title: String,
    pub notes: Option<String>,
    pub stars: Option<i32>,
}

impl From<&DishRow> for DishValues {
    fn from(row: &DishRow) -> Self {
        DishValues::new(row.title.clone(), row.notes.clone(), row.stars)
    }
}

impl From<DishRecord> for Dish {
    fn from(record: DishRecord) -> Self {
        Dish {
            id: Some(record.id),
            title: record.title,
            notes: record.notes,
            stars: record.stars,
            ingredients: Vec::new(),
        }
    }
}
