//! Product categorization: weighted keyword scoring over product text.
//!
//! The scorer itself is a pure function — taxonomy and compatibility tables
//! in, [`CategoryAssignment`] out, no I/O. The batch command wraps it for the
//! CLI: it pulls uncategorized products, scores each one, and writes
//! assignments back one transaction per batch. A product whose text matches
//! nothing degrades to `unknown` and the batch keeps going; this runs in a
//! best-effort ETL context where one odd product must not halt the rest.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::CategoryAssignment;
use crate::related::CompatibilityTable;
use crate::taxonomy::{Complexity, Taxonomy, TaxonomyEntry};

/// Categorize one product's concatenated text fields.
///
/// Scoring: for every taxonomy entry, sum the weights of keywords found as
/// case-insensitive substrings of the text, each keyword counted once no
/// matter how often it repeats. The strictly-highest entry wins; on a tie
/// the first-declared entry wins (scan order is declaration order and only
/// a strictly greater score displaces the current best). A top score of
/// zero — including empty input — yields the `unknown` assignment.
pub fn categorize(
    taxonomy: &Taxonomy,
    compat: &CompatibilityTable,
    text: &str,
) -> CategoryAssignment {
    let lower = text.to_lowercase();
    if lower.trim().is_empty() {
        return CategoryAssignment::unknown();
    }

    let mut best: Option<(&TaxonomyEntry, f64, Vec<&'static str>)> = None;
    for entry in taxonomy.entries() {
        let (score, matched) = score_entry(entry, &lower);
        if score > 0.0 && best.as_ref().map_or(true, |(_, s, _)| score > *s) {
            best = Some((entry, score, matched));
        }
    }

    let (entry, _, matched) = match best {
        Some(found) => found,
        None => return CategoryAssignment::unknown(),
    };

    let category = entry.category();
    let subcategory = entry.subcategory;

    // Matched keywords first, then category synonyms, deduplicated.
    let mut rag_keywords: Vec<String> = Vec::new();
    for kw in matched
        .iter()
        .copied()
        .chain(taxonomy.synonyms_for(category).iter().copied())
    {
        if !rag_keywords.iter().any(|existing| existing == kw) {
            rag_keywords.push(kw.to_string());
        }
    }

    CategoryAssignment {
        category,
        subcategory,
        complexity: derive_complexity(taxonomy, &lower),
        rag_keywords,
        application_areas: collect_markers(taxonomy.application_markers(), &lower),
        related_categories: compat.resolve_related(subcategory).to_vec(),
    }
}

/// Sum matched keyword weights for one entry. Each keyword counts once.
fn score_entry(entry: &TaxonomyEntry, lower_text: &str) -> (f64, Vec<&'static str>) {
    let mut score = 0.0;
    let mut matched = Vec::new();
    for (keyword, weight) in entry.keywords {
        if lower_text.contains(keyword) {
            score += weight;
            matched.push(*keyword);
        }
    }
    (score, matched)
}

/// Secondary pass over the same text: advanced markers beat intermediate
/// markers; no marker at all means basic.
fn derive_complexity(taxonomy: &Taxonomy, lower_text: &str) -> Complexity {
    if taxonomy
        .advanced_markers()
        .iter()
        .any(|m| lower_text.contains(m))
    {
        Complexity::Advanced
    } else if taxonomy
        .intermediate_markers()
        .iter()
        .any(|m| lower_text.contains(m))
    {
        Complexity::Intermediate
    } else {
        Complexity::Basic
    }
}

fn collect_markers(markers: &[&'static str], lower_text: &str) -> Vec<String> {
    markers
        .iter()
        .filter(|m| lower_text.contains(*m))
        .map(|m| m.to_string())
        .collect()
}

/// A product row pending categorization.
struct PendingProduct {
    sku: String,
    text: String,
}

/// Run the `categorize` command: score pending (or all, with `full`)
/// products and persist assignments in batches.
pub async fn run_categorize(
    config: &Config,
    limit: Option<usize>,
    full: bool,
    dry_run: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let taxonomy = Taxonomy::builtin();
    let compat = CompatibilityTable::builtin();

    let sql = if full {
        "SELECT sku, title, description, material, size, finish FROM products ORDER BY sku"
    } else {
        "SELECT sku, title, description, material, size, finish FROM products \
         WHERE categorized_at IS NULL ORDER BY sku"
    };
    let rows = sqlx::query(sql).fetch_all(&pool).await?;

    let mut pending: Vec<PendingProduct> = rows
        .iter()
        .map(|row| {
            let mut text = String::new();
            text.push_str(&row.get::<String, _>("title"));
            text.push(' ');
            text.push_str(&row.get::<String, _>("description"));
            for col in ["material", "size", "finish"] {
                if let Some(field) = row.get::<Option<String>, _>(col) {
                    text.push(' ');
                    text.push_str(&field);
                }
            }
            PendingProduct {
                sku: row.get("sku"),
                text,
            }
        })
        .collect();

    if let Some(lim) = limit {
        pending.truncate(lim);
    }

    if dry_run {
        println!("categorize (dry-run)");
        println!("  pending products: {}", pending.len());
        return Ok(());
    }

    let mut categorized = 0u64;
    let mut unknown_skus: Vec<String> = Vec::new();

    for batch in pending.chunks(config.categorize.batch_size) {
        let assignments: Vec<(&PendingProduct, CategoryAssignment)> = batch
            .iter()
            .map(|p| (p, categorize(&taxonomy, &compat, &p.text)))
            .collect();

        write_batch(&pool, &assignments).await?;

        for (product, assignment) in &assignments {
            categorized += 1;
            if assignment.is_unknown() {
                unknown_skus.push(product.sku.clone());
            }
        }
    }

    println!("categorize");
    println!("  products categorized: {}", categorized);
    println!("  unknown: {}", unknown_skus.len());
    // Surface unknowns so the taxonomy can be improved.
    for sku in &unknown_skus {
        println!("  unknown sku: {}", sku);
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Persist a batch of assignments atomically: all rows commit or none do.
async fn write_batch(
    pool: &SqlitePool,
    assignments: &[(&PendingProduct, CategoryAssignment)],
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for (product, assignment) in assignments {
        let rag_json = serde_json::to_string(&assignment.rag_keywords)?;
        let areas_json = serde_json::to_string(&assignment.application_areas)?;
        let related: Vec<&str> = assignment
            .related_categories
            .iter()
            .map(|s| s.as_str())
            .collect();
        let related_json = serde_json::to_string(&related)?;

        sqlx::query(
            r#"
            UPDATE products SET
                category = ?,
                subcategory = ?,
                complexity = ?,
                rag_keywords = ?,
                application_areas = ?,
                related_categories = ?,
                categorized_at = ?
            WHERE sku = ?
            "#,
        )
        .bind(assignment.category.as_str())
        .bind(assignment.subcategory.as_str())
        .bind(assignment.complexity.as_str())
        .bind(&rag_json)
        .bind(&areas_json)
        .bind(&related_json)
        .bind(now)
        .bind(&product.sku)
        .execute(&mut *tx)
        .await?;

        // Refresh the FTS row so searches see the new RAG keywords.
        sqlx::query("UPDATE products_fts SET rag_text = ? WHERE sku = ?")
            .bind(assignment.rag_keywords.join(" "))
            .bind(&product.sku)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{Category, Subcategory};

    fn fixtures() -> (Taxonomy, CompatibilityTable) {
        (Taxonomy::builtin(), CompatibilityTable::builtin())
    }

    #[test]
    fn test_empty_text_is_unknown() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(&taxonomy, &compat, "");
        assert_eq!(assignment.category, Category::Unknown);
        assert_eq!(assignment.subcategory, Subcategory::Unknown);
        assert!(assignment.rag_keywords.is_empty());
    }

    #[test]
    fn test_keyword_free_text_is_unknown() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(&taxonomy, &compat, "garden gnome, hand painted, 30cm");
        assert_eq!(assignment.category, Category::Unknown);
        assert_eq!(assignment.complexity, Complexity::Basic);
    }

    #[test]
    fn test_large_format_porcelain_scenario() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(
            &taxonomy,
            &compat,
            "12x24 large format porcelain tile, rectified edge",
        );
        assert_eq!(assignment.category, Category::Tiles);
        assert_eq!(assignment.subcategory, Subcategory::PorcelainTiles);
        // "large format" is an advanced installation marker
        assert_eq!(assignment.complexity, Complexity::Advanced);
        for expected in ["porcelain", "large format", "rectified"] {
            assert!(
                assignment.rag_keywords.iter().any(|k| k == expected),
                "missing rag keyword: {}",
                expected
            );
        }
    }

    #[test]
    fn test_thinset_scenario() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(
            &taxonomy,
            &compat,
            "modified thinset mortar for ceramic and porcelain",
        );
        assert_eq!(assignment.category, Category::InstallationMaterials);
        assert_eq!(assignment.subcategory, Subcategory::ThinsetMortar);
        assert_eq!(assignment.complexity, Complexity::Basic);
    }

    #[test]
    fn test_winner_score_is_maximum() {
        let (taxonomy, compat) = fixtures();
        let text = "sanded grout for ceramic floor tile joints";
        let assignment = categorize(&taxonomy, &compat, text);

        let lower = text.to_lowercase();
        let winner_score = taxonomy
            .entries()
            .iter()
            .find(|e| e.subcategory == assignment.subcategory)
            .map(|e| score_entry(e, &lower).0)
            .unwrap();
        assert!(winner_score > 0.0);
        for entry in taxonomy.entries() {
            assert!(
                score_entry(entry, &lower).0 <= winner_score,
                "{} outscores winner {}",
                entry.subcategory,
                assignment.subcategory
            );
        }
    }

    #[test]
    fn test_keyword_counted_once_per_input() {
        let (taxonomy, _) = fixtures();
        let once = "porcelain plank";
        let thrice = "porcelain porcelain porcelain plank";
        let entry = taxonomy
            .entries()
            .iter()
            .find(|e| e.subcategory == Subcategory::PorcelainTiles)
            .unwrap();
        assert_eq!(
            score_entry(entry, once).0,
            score_entry(entry, thrice).0,
            "repeat occurrences must not inflate the score"
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let (taxonomy, compat) = fixtures();
        let lower = categorize(&taxonomy, &compat, "porcelain tile");
        let upper = categorize(&taxonomy, &compat, "PORCELAIN TILE");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_idempotent() {
        let (taxonomy, compat) = fixtures();
        let text = "travertine natural stone paver, honed finish, outdoor patio";
        let a = categorize(&taxonomy, &compat, text);
        let b = categorize(&taxonomy, &compat, text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_breaks_to_first_declared() {
        let (taxonomy, compat) = fixtures();
        // "glazed" (ceramic_tiles, 0.4) vs "frosted" (glass_tiles, 0.4):
        // equal single-keyword scores, ceramic_tiles is declared first.
        let ceramic_entry = taxonomy
            .entries()
            .iter()
            .find(|e| e.subcategory == Subcategory::CeramicTiles)
            .unwrap();
        let glass_entry = taxonomy
            .entries()
            .iter()
            .find(|e| e.subcategory == Subcategory::GlassTiles)
            .unwrap();
        let text = "glazed frosted finish";
        assert_eq!(
            score_entry(ceramic_entry, text).0,
            score_entry(glass_entry, text).0,
            "fixture texts must tie for this test to be meaningful"
        );
        let assignment = categorize(&taxonomy, &compat, text);
        assert_eq!(assignment.subcategory, Subcategory::CeramicTiles);
    }

    #[test]
    fn test_rag_keywords_include_category_synonyms() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(&taxonomy, &compat, "ceramic subway tile");
        assert!(assignment.rag_keywords.iter().any(|k| k == "tiles"));
        assert!(assignment.rag_keywords.iter().any(|k| k == "flooring"));
    }

    #[test]
    fn test_rag_keywords_deduplicated() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(&taxonomy, &compat, "ceramic glazed subway wall tile");
        let mut sorted = assignment.rag_keywords.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), assignment.rag_keywords.len());
    }

    #[test]
    fn test_application_areas_detected() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(
            &taxonomy,
            &compat,
            "porcelain tile for kitchen backsplash and bathroom wall",
        );
        for area in ["kitchen", "backsplash", "bathroom", "wall"] {
            assert!(
                assignment.application_areas.iter().any(|a| a == area),
                "missing application area: {}",
                area
            );
        }
    }

    #[test]
    fn test_related_categories_stored_on_assignment() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(&taxonomy, &compat, "porcelain floor tile");
        assert_eq!(
            assignment.related_categories,
            compat
                .resolve_related(Subcategory::PorcelainTiles)
                .to_vec()
        );
    }

    #[test]
    fn test_membrane_text_is_advanced() {
        let (taxonomy, compat) = fixtures();
        let assignment = categorize(
            &taxonomy,
            &compat,
            "uncoupling membrane for crack isolation under tile",
        );
        assert_eq!(assignment.subcategory, Subcategory::WaterproofingMembrane);
        assert_eq!(assignment.complexity, Complexity::Advanced);
    }
}
