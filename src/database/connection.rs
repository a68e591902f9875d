use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::{trace, trace_span};

use crate::config::DatabaseConfig;
use crate::error::StorageError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn establish_pooled_connection(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
    let span = trace_span!("establishing pooled connection");
    let _guard = span.enter();

    trace!("Creating manager");
    let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());

    trace!("Creating pool");
    let pool = Pool::builder()
        .max_size(config.pool_size.max(1))
        .build(manager)?;

    Ok(pool)
}
