pub mod dish;
pub mod dish_ingredient;
