#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

pub use config::{DatabaseConfig, Settings};
pub use error::{ConfigError, Error, Result, StorageError, ValidationError, ValidationErrorKind};
pub use model::{Dish, DishIngredient};
pub use session::{DishKey, EntryState, IngredientKey, Session};
pub use store::{MemoryStore, Store};
