use bigdecimal::BigDecimal;
use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::dish::DishRecord;
use crate::model::DishIngredient;
use crate::store::IngredientRow;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(DishRecord, foreign_key = dish_id))]
#[diesel(table_name = crate::database::schema::dish_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DishIngredientRecord {
    pub id: i32,
    pub description: String,
    pub unit_of_measure: String,
    pub amount: BigDecimal,
    pub dish_id: i32,
}

#[derive(Insertable, AsChangeset, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::dish_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DishIngredientValues {
    pub description: String,
    pub unit_of_measure: String,
    pub amount: BigDecimal,
    pub dish_id: i32,
}

impl DishIngredientValues {
    pub fn from_row(row: &IngredientRow, dish_id: i32) -> Self {
        DishIngredientValues::new(
            row.description.clone(),
            row.unit_of_measure.clone(),
            row.amount.clone(),
            dish_id,
        )
    }
}

impl From<DishIngredientRecord> for DishIngredient {
    fn from(record: DishIngredientRecord) -> Self {
        DishIngredient {
            id: Some(record.id),
            description: record.description,
            unit_of_measure: record.unit_of_measure,
            amount: record.amount,
            dish_id: Some(record.dish_id),
        }
    }
}
