use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the cookbook can surface to its caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Settings could not be turned into a usable connection configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("connection string '{0}' is missing")]
    MissingConnectionString(String),
}

/// A row was rejected before being written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}.{field}: {kind}")]
pub struct ValidationError {
    pub entity: &'static str,
    pub field: &'static str,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(entity: &'static str, field: &'static str, kind: ValidationErrorKind) -> Self {
        Self {
            entity,
            field,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Required,
    TooLong { max: usize, actual: usize },
    OutOfRange { precision: u32, scale: u32 },
    PresetKey,
    KeyModified { from: i32, to: Option<i32> },
    UnknownKey { id: i32 },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "value is required"),
            Self::TooLong { max, actual } => {
                write!(f, "length {actual} exceeds maximum of {max}")
            }
            Self::OutOfRange { precision, scale } => {
                write!(f, "value does not fit numeric({precision},{scale})")
            }
            Self::PresetKey => write!(f, "key is generated on save and must be unset"),
            Self::KeyModified { from, to } => match to {
                Some(to) => write!(f, "key changed from {from} to {to}"),
                None => write!(f, "key {from} was cleared"),
            },
            Self::UnknownKey { id } => write!(f, "key {id} does not belong to this dish"),
        }
    }
}

/// The storage backend refused or failed to apply an operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("{table} row references missing {references} row {id:?}")]
    ForeignKey {
        table: &'static str,
        references: &'static str,
        id: Option<i32>,
    },

    #[error("{table} row {id} does not exist")]
    NotFound { table: &'static str, id: i32 },

    #[error("database: {0}")]
    Database(#[from] diesel::result::Error),
}

impl StorageError {
    /// True when the failure comes from a broken reference between rows.
    pub fn is_foreign_key_violation(&self) -> bool {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match self {
            Self::ForeignKey { .. } => true,
            Self::Database(DieselError::DatabaseError(kind, _)) => matches!(
                kind,
                DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::NotNullViolation
            ),
            _ => false,
        }
    }
}
