use super::DishIngredient;

/// A recipe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dish {
    /// Assigned by the database on first save.
    pub id: Option<i32>,
    pub title: String,
    pub notes: Option<String>,
    pub stars: Option<i32>,
    pub ingredients: Vec<DishIngredient>,
}

impl Dish {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_stars(mut self, stars: i32) -> Self {
        self.stars = Some(stars);
        self
    }

    pub fn with_ingredient(mut self, ingredient: DishIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// Same column values, ignoring the key and the ingredient collection.
    pub(crate) fn same_columns(&self, other: &Dish) -> bool {
        self.title == other.title
            && self.notes == other.notes
            && self.stars == other.stars
    }
}
