use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS my_goods (
        pet           TEXT        NOT NULL,
        product_id    TEXT        NOT NULL,
        title         TEXT        NOT NULL,
        link          TEXT        NOT NULL,
        image         TEXT        NOT NULL,
        is_favorite   BOOLEAN     NOT NULL DEFAULT FALSE,
        is_latest     BOOLEAN     NOT NULL DEFAULT FALSE,
        price         TEXT        NOT NULL,
        search_word   TEXT        NOT NULL,
        shopping_mall TEXT        NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (pet, product_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS my_goods_latest_idx ON my_goods (pet, is_latest, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS search_words (
        pet        TEXT        NOT NULL,
        word       TEXT        NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (pet, word)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pet_keywords (
        pet        TEXT        PRIMARY KEY,
        keywords   TEXT[]      NOT NULL DEFAULT '{}',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates the goods, search-word and pet-keyword tables if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
