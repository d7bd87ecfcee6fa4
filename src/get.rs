//! Product retrieval by SKU.
//!
//! Fetches a full product row and its category assignment from the catalog.
//! Used by the `tilebase get` CLI command.

use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Full product view: raw fields plus the categorization columns.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub sku: String,
    pub title: String,
    pub description: String,
    pub material: Option<String>,
    pub size: Option<String>,
    pub finish: Option<String>,
    pub price: Option<f64>,
    pub created_at: String, // ISO8601
    pub updated_at: String, // ISO8601
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub complexity: Option<String>,
    pub rag_keywords: Vec<String>,
    pub application_areas: Vec<String>,
    pub related_categories: Vec<String>,
}

/// Core fetch returning structured data.
pub async fn get_product(config: &Config, sku: &str) -> Result<ProductView> {
    let pool = db::connect(config).await?;

    let row = sqlx::query(
        "SELECT sku, title, description, material, size, finish, price, created_at, updated_at, \
         category, subcategory, complexity, rag_keywords, application_areas, related_categories \
         FROM products WHERE sku = ?",
    )
    .bind(sku)
    .fetch_optional(&pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => {
            pool.close().await;
            bail!("product not found: {}", sku);
        }
    };

    let created_at: i64 = row.get("created_at");
    let updated_at: i64 = row.get("updated_at");

    let view = ProductView {
        sku: row.get("sku"),
        title: row.get("title"),
        description: row.get("description"),
        material: row.get("material"),
        size: row.get("size"),
        finish: row.get("finish"),
        price: row.get("price"),
        created_at: format_ts_iso(created_at),
        updated_at: format_ts_iso(updated_at),
        category: row.get("category"),
        subcategory: row.get("subcategory"),
        complexity: row.get("complexity"),
        rag_keywords: parse_string_list(row.get("rag_keywords")),
        application_areas: parse_string_list(row.get("application_areas")),
        related_categories: parse_string_list(row.get("related_categories")),
    };

    pool.close().await;
    Ok(view)
}

/// CLI entry point — fetches the product and prints it.
pub async fn run_get(config: &Config, sku: &str) -> Result<()> {
    let product = get_product(config, sku).await?;

    println!("--- Product ---");
    println!("sku:          {}", product.sku);
    println!("title:        {}", product.title);
    if let Some(ref material) = product.material {
        println!("material:     {}", material);
    }
    if let Some(ref size) = product.size {
        println!("size:         {}", size);
    }
    if let Some(ref finish) = product.finish {
        println!("finish:       {}", finish);
    }
    if let Some(price) = product.price {
        println!("price:        {:.2}", price);
    }
    println!("created_at:   {}", product.created_at);
    println!("updated_at:   {}", product.updated_at);
    println!();

    println!("--- Description ---");
    println!("{}", product.description);
    println!();

    println!("--- Categorization ---");
    match product.category {
        Some(ref category) => {
            println!("category:     {}", category);
            println!(
                "subcategory:  {}",
                product.subcategory.as_deref().unwrap_or("unknown")
            );
            println!(
                "complexity:   {}",
                product.complexity.as_deref().unwrap_or("basic")
            );
            println!("rag_keywords: {}", product.rag_keywords.join(", "));
            if !product.application_areas.is_empty() {
                println!("areas:        {}", product.application_areas.join(", "));
            }
            if !product.related_categories.is_empty() {
                println!("related:      {}", product.related_categories.join(", "));
            }
        }
        None => println!("(not categorized yet — run `tilebase categorize`)"),
    }

    Ok(())
}

fn parse_string_list(json: Option<String>) -> Vec<String> {
    json.and_then(|j| serde_json::from_str(&j).ok())
        .unwrap_or_default()
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
