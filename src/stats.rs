//! Catalog statistics and health overview.
//!
//! Quick summary of what's in the catalog: product counts, categorization
//! coverage, and a per-category breakdown. Used by `tilebase stats` to give
//! confidence that ingest and categorize runs are working as expected, and
//! to surface how many products fell through to `unknown` (taxonomy-review
//! candidates).

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-category breakdown of product counts.
struct CategoryStats {
    category: String,
    product_count: i64,
    advanced_count: i64,
}

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;

    let total_categorized: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE categorized_at IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let total_unknown: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category = 'unknown'")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("tilebase — Catalog Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Products:     {}", total_products);
    println!(
        "  Categorized:  {} / {} ({}%)",
        total_categorized,
        total_products,
        if total_products > 0 {
            (total_categorized * 100) / total_products
        } else {
            0
        }
    );
    println!("  Unknown:      {}", total_unknown);

    let category_rows = sqlx::query(
        r#"
        SELECT
            category,
            COUNT(*) AS product_count,
            SUM(CASE WHEN complexity = 'advanced' THEN 1 ELSE 0 END) AS advanced_count
        FROM products
        WHERE category IS NOT NULL
        GROUP BY category
        ORDER BY product_count DESC, category ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let category_stats: Vec<CategoryStats> = category_rows
        .iter()
        .map(|row| CategoryStats {
            category: row.get("category"),
            product_count: row.get("product_count"),
            advanced_count: row.get("advanced_count"),
        })
        .collect();

    if !category_stats.is_empty() {
        println!();
        println!("  By category:");
        println!(
            "  {:<28} {:>8} {:>10}",
            "CATEGORY", "PRODUCTS", "ADVANCED"
        );
        println!("  {}", "-".repeat(48));

        for s in &category_stats {
            println!(
                "  {:<28} {:>8} {:>10}",
                s.category, s.product_count, s.advanced_count
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
