use std::str::FromStr;

use bigdecimal::BigDecimal;
use cookbook::{
    Dish, DishIngredient, EntryState, Error, MemoryStore, Session, ValidationErrorKind,
};

fn session() -> Session<MemoryStore> {
    Session::new(MemoryStore::new())
}

fn porridge() -> Dish {
    Dish::new("Breakfast porridge")
        .with_notes("This is so good")
        .with_stars(4)
}

fn amount(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

#[test]
fn save_assigns_unique_ids() {
    let mut session = session();
    let first = session.add(porridge());
    let second = session.add(Dish::new("Lentil soup"));

    assert_eq!(session.dish(first).unwrap().id, None);
    assert_eq!(session.save().unwrap(), 2);

    let first_id = session.dish(first).unwrap().id.unwrap();
    let second_id = session.dish(second).unwrap().id.unwrap();
    assert_ne!(first_id, second_id);
}

#[test]
fn add_is_invisible_until_save() {
    let mut session = session();
    session.add(porridge());

    assert!(session.query("porridge").unwrap().is_empty());
    session.save().unwrap();
    assert_eq!(session.query("porridge").unwrap().len(), 1);
}

#[test]
fn query_returns_only_matching_dish() {
    let mut session = session();
    let key = session.add(porridge());
    session.add(Dish::new("Lentil soup"));
    session.save().unwrap();

    let found = session.query("porridge").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, session.dish(key).unwrap().id);
    assert_eq!(found[0].notes.as_deref(), Some("This is so good"));
}

#[test]
fn update_is_visible_only_after_save() {
    let mut session = session();
    let key = session.add(porridge());
    session.save().unwrap();

    session.dish_mut(key).unwrap().stars = Some(5);
    assert!(session.has_changes());
    assert_eq!(session.query("porridge").unwrap()[0].stars, Some(4));

    assert_eq!(session.save().unwrap(), 1);
    assert_eq!(session.query("porridge").unwrap()[0].stars, Some(5));
    assert!(!session.has_changes());
}

#[test]
fn remove_takes_effect_on_save() {
    let mut session = session();
    let key = session.add(porridge());
    session.save().unwrap();

    assert!(session.remove(key));
    assert_eq!(session.state(key), Some(EntryState::Deleted));
    assert_eq!(session.query("porridge").unwrap().len(), 1);

    session.save().unwrap();
    assert!(session.query("porridge").unwrap().is_empty());
    assert!(session.dish(key).is_none());
}

#[test]
fn walkthrough_scenario() {
    let mut session = session();
    let key = session.add(Dish::new("Breakfast porridge").with_stars(4));
    session.save().unwrap();
    assert_eq!(session.dish(key).unwrap().id, Some(1));

    let found = session.query("porridge").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(1));

    session.dish_mut(key).unwrap().stars = Some(5);
    session.save().unwrap();
    assert_eq!(session.query("porridge").unwrap()[0].stars, Some(5));

    session.remove(key);
    session.save().unwrap();
    assert!(session.query("porridge").unwrap().is_empty());
}

#[test]
fn orphan_ingredient_fails_with_foreign_key_error() {
    let mut session = session();
    session.add_ingredient(DishIngredient::new("Oats", "g", amount("80")));

    match session.save() {
        Err(Error::Storage(err)) => assert!(err.is_foreign_key_violation()),
        other => panic!("expected storage error, got {other:?}"),
    }
}

#[test]
fn ingredient_for_unknown_dish_fails_with_foreign_key_error() {
    let mut session = session();
    session.add_ingredient(DishIngredient::new("Oats", "g", amount("80")).for_dish(99));

    assert!(matches!(
        session.save(),
        Err(Error::Storage(err)) if err.is_foreign_key_violation()
    ));
}

#[test]
fn ingredient_added_for_saved_dish() {
    let mut session = session();
    let dish = session.add(porridge());
    session.save().unwrap();
    let dish_id = session.dish(dish).unwrap().id.unwrap();

    let ingredient =
        session.add_ingredient(DishIngredient::new("Oats", "g", amount("80")).for_dish(dish_id));
    session.save().unwrap();

    assert!(session.ingredient(ingredient).unwrap().id.is_some());
    let loaded = session.find(dish_id).unwrap().unwrap();
    assert_eq!(loaded.ingredients.len(), 1);
    assert_eq!(loaded.ingredients[0].description, "Oats");
}

#[test]
fn long_title_fails_validation() {
    let mut session = session();
    session.add(Dish::new("x".repeat(101)));

    match session.save() {
        Err(Error::Validation(err)) => {
            assert_eq!(err.field, "title");
            assert_eq!(
                err.kind,
                ValidationErrorKind::TooLong {
                    max: 100,
                    actual: 101
                }
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(session.store().dish_count(), 0);
}

#[test]
fn failed_save_keeps_changes_staged() {
    let mut session = session();
    let key = session.add(Dish::new("x".repeat(101)));
    assert!(session.save().is_err());

    session.dish_mut(key).unwrap().title = "Short".to_owned();
    assert_eq!(session.save().unwrap(), 1);
    assert_eq!(session.query("Short").unwrap().len(), 1);
}

#[test]
fn failed_save_writes_nothing() {
    let mut session = session();
    session.add(porridge());
    session.add_ingredient(DishIngredient::new("Oats", "g", amount("80")));

    assert!(session.save().is_err());
    assert_eq!(session.store().dish_count(), 0);
}

#[test]
fn amount_out_of_range_fails_validation() {
    let mut session = session();
    session.add(porridge().with_ingredient(DishIngredient::new("Oats", "g", amount("1000"))));

    assert!(matches!(
        session.save(),
        Err(Error::Validation(err)) if err.field == "amount"
    ));
}

#[test]
fn dish_graph_is_saved_and_loaded_together() {
    let mut session = session();
    let key = session.add(
        porridge()
            .with_ingredient(DishIngredient::new("Oats", "g", amount("80")))
            .with_ingredient(DishIngredient::new("Milk", "ml", amount("250.50"))),
    );
    assert_eq!(session.save().unwrap(), 3);

    let dish = session.dish(key).unwrap();
    assert!(dish
        .ingredients
        .iter()
        .all(|ingredient| ingredient.id.is_some() && ingredient.dish_id == dish.id));

    let loaded = session.query("porridge").unwrap().remove(0);
    assert_eq!(loaded.ingredients.len(), 2);
    assert_eq!(loaded.ingredients[1].amount, amount("250.5"));
}

#[test]
fn removing_dish_removes_its_ingredients() {
    let mut session = session();
    let key = session.add(porridge().with_ingredient(DishIngredient::new("Oats", "g", amount("80"))));
    session.save().unwrap();

    session.remove(key);
    session.save().unwrap();
    assert_eq!(session.store().ingredient_count(), 0);
}

#[test]
fn attached_dish_changes_are_saved() {
    let mut seed = session();
    seed.add(porridge().with_ingredient(DishIngredient::new("Oats", "g", amount("80"))));
    seed.save().unwrap();

    // A fresh session over the same committed data tracks nothing yet.
    let mut session = Session::new(seed.into_store());
    let loaded = session.query("porridge").unwrap().remove(0);
    let key = session.attach(loaded).unwrap();
    assert!(!session.has_changes());

    let dish = session.dish_mut(key).unwrap();
    dish.ingredients[0].amount = amount("90");
    dish.ingredients
        .push(DishIngredient::new("Salt", "pinch", amount("1")));
    assert_eq!(session.save().unwrap(), 2);

    let reloaded = session.query("porridge").unwrap().remove(0);
    assert_eq!(reloaded.ingredients.len(), 2);
    assert_eq!(reloaded.ingredients[0].amount, amount("90"));
}

#[test]
fn removing_unsaved_dish_never_reaches_storage() {
    let mut session = session();
    let key = session.add(porridge());
    assert!(session.remove(key));

    assert_eq!(session.save().unwrap(), 0);
    assert_eq!(session.store().dish_count(), 0);
}

#[test]
fn amount_is_stored_at_two_decimal_places() {
    let mut session = session();
    session.add(porridge().with_ingredient(DishIngredient::new("Oats", "g", amount("80.257"))));
    session.save().unwrap();

    let loaded = session.query("porridge").unwrap().remove(0);
    assert_eq!(loaded.ingredients[0].amount, amount("80.26"));
}

#[test]
fn empty_text_columns_are_saved() {
    let mut session = session();
    let key = session.add(Dish::new("").with_ingredient(DishIngredient::new("", "", amount("1"))));
    assert_eq!(session.save().unwrap(), 2);

    let id = session.dish(key).unwrap().id.unwrap();
    let loaded = session.find(id).unwrap().unwrap();
    assert_eq!(loaded.title, "");
    assert_eq!(loaded.ingredients[0].description, "");
}

#[test]
fn reordered_ingredients_save_nothing() {
    let mut session = session();
    let key = session.add(
        porridge()
            .with_ingredient(DishIngredient::new("Oats", "g", amount("80")))
            .with_ingredient(DishIngredient::new("Milk", "ml", amount("250"))),
    );
    session.save().unwrap();

    session.dish_mut(key).unwrap().ingredients.reverse();
    assert!(!session.has_changes());
    assert_eq!(session.save().unwrap(), 0);
}

#[test]
fn ingredient_taken_from_another_dish_is_rejected() {
    let mut session = session();
    let porridge_key = session.add(porridge());
    let soup_key =
        session.add(Dish::new("Lentil soup").with_ingredient(DishIngredient::new("Lentils", "g", amount("200"))));
    session.save().unwrap();

    let lentils = session.dish(soup_key).unwrap().ingredients[0].clone();
    session.dish_mut(porridge_key).unwrap().ingredients.push(lentils);

    assert!(matches!(
        session.save(),
        Err(Error::Validation(err)) if matches!(err.kind, ValidationErrorKind::UnknownKey { .. })
    ));
    let soup_id = session.dish(soup_key).unwrap().id.unwrap();
    assert_eq!(session.find(soup_id).unwrap().unwrap().ingredients.len(), 1);
}
