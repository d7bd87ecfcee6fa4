//! Schema migrations for the product catalog.
//!
//! All statements are idempotent so `tilebase init` can run any number of
//! times. Categorization columns live on the product row itself (one current
//! assignment per product, overwritten on recategorization) and the FTS5
//! table indexes title, description, and the curated RAG keyword text.

use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            sku TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            material TEXT,
            size TEXT,
            finish TEXT,
            price REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dedup_hash TEXT NOT NULL,
            category TEXT,
            subcategory TEXT,
            complexity TEXT,
            rag_keywords TEXT NOT NULL DEFAULT '[]',
            application_areas TEXT NOT NULL DEFAULT '[]',
            related_categories TEXT NOT NULL DEFAULT '[]',
            categorized_at INTEGER
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='products_fts'",
    )
    .fetch_one(&pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE products_fts USING fts5(
                sku UNINDEXED,
                title,
                description,
                rag_text
            )
            "#,
        )
        .execute(&pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_subcategory ON products(subcategory)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_updated_at ON products(updated_at DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
