use bigdecimal::BigDecimal;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{
    Dish, DishIngredient, AMOUNT_PRECISION, AMOUNT_SCALE, DESCRIPTION_MAX_LEN, NOTES_MAX_LEN,
    TITLE_MAX_LEN, UNIT_OF_MEASURE_MAX_LEN,
};
use crate::store::round_to_scale;

pub const DISH: &str = "Dish";
pub const INGREDIENT: &str = "DishIngredient";

fn max_length(
    entity: &'static str,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    // varchar(n) counts characters, not bytes
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::new(
            entity,
            field,
            ValidationErrorKind::TooLong { max, actual },
        ));
    }
    Ok(())
}

/// `numeric(p,s)` rounds to `s` places, then needs the integral part to fit in `p - s` digits.
fn fits_numeric(value: &BigDecimal, precision: u32, scale: u32) -> bool {
    let limit = BigDecimal::from(10u64.pow(precision - scale));
    round_to_scale(value, scale).abs() < limit
}

pub fn dish_columns(dish: &Dish) -> Result<(), ValidationError> {
    max_length(DISH, "title", &dish.title, TITLE_MAX_LEN)?;
    if let Some(notes) = &dish.notes {
        max_length(DISH, "notes", notes, NOTES_MAX_LEN)?;
    }
    Ok(())
}

pub fn ingredient_columns(ingredient: &DishIngredient) -> Result<(), ValidationError> {
    max_length(
        INGREDIENT,
        "description",
        &ingredient.description,
        DESCRIPTION_MAX_LEN,
    )?;
    max_length(
        INGREDIENT,
        "unit_of_measure",
        &ingredient.unit_of_measure,
        UNIT_OF_MEASURE_MAX_LEN,
    )?;
    if !fits_numeric(&ingredient.amount, AMOUNT_PRECISION, AMOUNT_SCALE) {
        return Err(ValidationError::new(
            INGREDIENT,
            "amount",
            ValidationErrorKind::OutOfRange {
                precision: AMOUNT_PRECISION,
                scale: AMOUNT_SCALE,
            },
        ));
    }
    Ok(())
}

pub fn unset_key(entity: &'static str, id: Option<i32>) -> Result<(), ValidationError> {
    match id {
        Some(_) => Err(ValidationError::new(
            entity,
            "id",
            ValidationErrorKind::PresetKey,
        )),
        None => Ok(()),
    }
}

pub fn unchanged_key(
    entity: &'static str,
    original: i32,
    current: Option<i32>,
) -> Result<(), ValidationError> {
    if current == Some(original) {
        return Ok(());
    }
    Err(ValidationError::new(
        entity,
        "id",
        ValidationErrorKind::KeyModified {
            from: original,
            to: current,
        },
    ))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn title_at_limit_is_accepted() {
        let dish = Dish::new("a".repeat(TITLE_MAX_LEN));
        assert!(dish_columns(&dish).is_ok());
    }

    #[test]
    fn title_over_limit_is_rejected() {
        let dish = Dish::new("a".repeat(TITLE_MAX_LEN + 1));
        let err = dish_columns(&dish).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(
            err.kind,
            ValidationErrorKind::TooLong {
                max: 100,
                actual: 101
            }
        );
    }

    #[test]
    fn length_counts_characters() {
        let dish = Dish::new("é".repeat(TITLE_MAX_LEN));
        assert!(dish_columns(&dish).is_ok());
    }

    #[test]
    fn empty_text_is_not_missing() {
        assert!(dish_columns(&Dish::new("")).is_ok());
        assert!(ingredient_columns(&DishIngredient::new("", "", amount("1"))).is_ok());
    }

    #[test]
    fn long_notes_are_rejected() {
        let dish = Dish::new("Soup").with_notes("n".repeat(NOTES_MAX_LEN + 1));
        assert_eq!(dish_columns(&dish).unwrap_err().field, "notes");
    }

    #[test]
    fn amount_fits_numeric_5_2() {
        assert!(fits_numeric(&amount("999.99"), 5, 2));
        assert!(fits_numeric(&amount("-999.99"), 5, 2));
        assert!(fits_numeric(&amount("0.001"), 5, 2));
        assert!(!fits_numeric(&amount("1000"), 5, 2));
        assert!(!fits_numeric(&amount("999.999"), 5, 2));
    }

    #[test]
    fn long_unit_of_measure_is_rejected() {
        let ingredient = DishIngredient::new("Oats", "u".repeat(51), amount("1"));
        let err = ingredient_columns(&ingredient).unwrap_err();
        assert_eq!(err.field, "unit_of_measure");
    }

    #[test]
    fn modified_key_is_reported() {
        let err = unchanged_key(DISH, 3, Some(4)).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::KeyModified {
                from: 3,
                to: Some(4)
            }
        );
    }
}
