use anyhow::Context;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

    let pool: Pool<Postgres> = PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // runs all pending migrations; no-op if up-to-date
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations applied");

    Ok(())
}
