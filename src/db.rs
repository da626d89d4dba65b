use crate::error::ServiceError;
use actix_web::web;
use anyhow::{anyhow, Result};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::info;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

embed_migrations!();

pub fn create_connection_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().build(manager)?;
    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let conn = pool.get()?;
    embedded_migrations::run(&*conn).map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations are up to date");
    Ok(())
}

/// Runs a diesel closure on the blocking thread pool with a pooled connection.
pub async fn run<F, T>(pool: &DbPool, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&PgConnection) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    web::block(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await
    .map_err(ServiceError::from)
}

/// Connection for tests that talk to a live database.
#[cfg(test)]
pub fn create_connection() -> PgConnection {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let conn = PgConnection::establish(&database_url).expect("Failed to connect");
    embedded_migrations::run(&conn).expect("Failed to run migrations");
    conn
}

#[cfg(test)]
#[derive(Debug)]
struct TestTransaction;

#[cfg(test)]
impl r2d2::CustomizeConnection<PgConnection, r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        conn.begin_test_transaction().map_err(r2d2::Error::QueryError)
    }
}

/// Single-connection pool for route tests. Its connection sits in a test
/// transaction, so nothing a handler writes outlives the pool. Release any
/// fixture connection before calling a handler.
#[cfg(test)]
pub fn create_test_pool() -> DbPool {
    drop(create_connection());
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    r2d2::Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .expect("Failed to create test pool")
}

/// Pool that never connects until a handler actually asks for a connection.
#[cfg(test)]
pub fn unconnected_pool() -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new("postgres://localhost/unreachable");
    r2d2::Pool::builder().build_unchecked(manager)
}
