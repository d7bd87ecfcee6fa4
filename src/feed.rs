//! Product feed ingestion.
//!
//! The acquisition pipeline (out of scope here) drops JSON files into a feed
//! directory; each file holds an array of product records. This module scans
//! that directory and upserts rows keyed by SKU. A content hash decides
//! whether an update actually changed the product text: changed products get
//! their `categorized_at` cleared so the next `categorize` run supersedes
//! the stale assignment, untouched products keep theirs.
//!
//! Parsing is best-effort — a malformed feed file is reported and skipped,
//! it never aborts the run.

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::db;
use crate::models::{FeedItem, ProductRecord};

/// Scan the feed directory for product records.
pub fn scan_feed(config: &Config) -> Result<Vec<FeedItem>> {
    let feed_config = config
        .feed
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Feed not configured: add a [feed] section"))?;

    let root = &feed_config.root;
    if !root.exists() {
        bail!("Feed root does not exist: {}", root.display());
    }

    let include_set = build_globset(&feed_config.include_globs)?;
    let exclude_set = build_globset(&feed_config.exclude_globs)?;

    let mut items = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match read_feed_file(path, &rel_str) {
            Ok(file_items) => items.extend(file_items),
            Err(e) => eprintln!("skipping feed file {}: {}", rel_str, e),
        }
    }

    // Sort for deterministic ordering; later files win on duplicate SKUs
    // because upserts apply in order.
    items.sort_by(|a, b| {
        a.record
            .sku
            .cmp(&b.record.sku)
            .then(a.source_path.cmp(&b.source_path))
    });

    Ok(items)
}

fn read_feed_file(path: &Path, rel_str: &str) -> Result<Vec<FeedItem>> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let modified_secs = modified
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let updated_at = Utc
        .timestamp_opt(modified_secs, 0)
        .single()
        .unwrap_or_else(Utc::now);

    let content = std::fs::read_to_string(path)?;
    let records: Vec<ProductRecord> = serde_json::from_str(&content)?;

    Ok(records
        .into_iter()
        .filter(|r| !r.sku.trim().is_empty())
        .map(|record| FeedItem {
            record,
            source_path: rel_str.to_string(),
            updated_at,
        })
        .collect())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Run the `ingest` command: scan the feed and upsert products.
pub async fn run_ingest(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let mut items = scan_feed(config)?;

    if let Some(lim) = limit {
        items.truncate(lim);
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  records found: {}", items.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;

    let mut upserted = 0u64;
    for item in &items {
        upsert_product(&pool, item).await?;
        upserted += 1;
    }

    let pending: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE categorized_at IS NULL")
            .fetch_one(&pool)
            .await?;

    println!("ingest");
    println!("  records fetched: {}", items.len());
    println!("  products upserted: {}", upserted);
    println!("  awaiting categorization: {}", pending);
    println!("ok");

    pool.close().await;
    Ok(())
}

async fn upsert_product(pool: &SqlitePool, item: &FeedItem) -> Result<()> {
    let r = &item.record;

    // Content hash over the fields the categorizer reads; an unchanged hash
    // means the existing assignment is still valid.
    let mut hasher = Sha256::new();
    hasher.update(r.sku.as_bytes());
    hasher.update(r.title.as_bytes());
    hasher.update(r.description.as_bytes());
    for field in [&r.material, &r.size, &r.finish].into_iter().flatten() {
        hasher.update(field.as_bytes());
    }
    let dedup_hash = format!("{:x}", hasher.finalize());

    let now = item.updated_at.timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO products (sku, title, description, material, size, finish, price, created_at, updated_at, dedup_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(sku) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            material = excluded.material,
            size = excluded.size,
            finish = excluded.finish,
            price = excluded.price,
            updated_at = excluded.updated_at,
            categorized_at = CASE
                WHEN products.dedup_hash = excluded.dedup_hash THEN products.categorized_at
                ELSE NULL
            END,
            dedup_hash = excluded.dedup_hash
        "#,
    )
    .bind(&r.sku)
    .bind(&r.title)
    .bind(&r.description)
    .bind(&r.material)
    .bind(&r.size)
    .bind(&r.finish)
    .bind(r.price)
    .bind(now)
    .bind(now)
    .bind(&dedup_hash)
    .execute(&mut *tx)
    .await?;

    // Rebuild the FTS row from the persisted state. RAG text carries over
    // until the next categorize run replaces it.
    let rag_json: String = sqlx::query_scalar("SELECT rag_keywords FROM products WHERE sku = ?")
        .bind(&r.sku)
        .fetch_one(&mut *tx)
        .await?;
    let rag_keywords: Vec<String> = serde_json::from_str(&rag_json).unwrap_or_default();

    sqlx::query("DELETE FROM products_fts WHERE sku = ?")
        .bind(&r.sku)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO products_fts (sku, title, description, rag_text) VALUES (?, ?, ?, ?)")
        .bind(&r.sku)
        .bind(&r.title)
        .bind(&r.description)
        .bind(rag_keywords.join(" "))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
