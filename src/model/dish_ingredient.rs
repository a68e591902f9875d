use bigdecimal::BigDecimal;

/// One ingredient line of a [`Dish`](super::Dish).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DishIngredient {
    pub id: Option<i32>,
    pub description: String,
    pub unit_of_measure: String,
    pub amount: BigDecimal,
    /// Filled in from the owning dish on save when the ingredient lives in `Dish::ingredients`.
    pub dish_id: Option<i32>,
}

impl DishIngredient {
    pub fn new(
        description: impl Into<String>,
        unit_of_measure: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        Self {
            description: description.into(),
            unit_of_measure: unit_of_measure.into(),
            amount,
            ..Self::default()
        }
    }

    pub fn for_dish(mut self, dish_id: i32) -> Self {
        self.dish_id = Some(dish_id);
        self
    }

    /// Same column values, ignoring keys.
    pub(crate) fn same_columns(&self, other: &DishIngredient) -> bool {
        self.description == other.description
            && self.unit_of_measure == other.unit_of_measure
            && self.amount == other.amount
    }
}
