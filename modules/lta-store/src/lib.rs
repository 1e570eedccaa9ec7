pub mod claim;
pub mod filter;
pub mod patch;
pub mod status;
pub mod store;
pub mod testutil;

pub use store::Store;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect a pool and run embedded migrations as a single startup step.
pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
