mod dish;
mod dish_ingredient;

pub use dish::Dish;
pub use dish_ingredient::DishIngredient;

pub const TITLE_MAX_LEN: usize = 100;
pub const NOTES_MAX_LEN: usize = 1000;
pub const DESCRIPTION_MAX_LEN: usize = 100;
pub const UNIT_OF_MEASURE_MAX_LEN: usize = 50;

/// `amount` is stored as `numeric(5,2)`.
pub const AMOUNT_PRECISION: u32 = 5;
pub const AMOUNT_SCALE: u32 = 2;
