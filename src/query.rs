//! Retrieval query builder: natural-language search over categorized rows.
//!
//! A query is tokenized, candidates are pulled from FTS5 (scoped by any
//! category/subcategory/complexity filters), and the final score is computed
//! in Rust as a weighted sum of two signals: query tokens hitting the
//! curated RAG keywords, and query tokens hitting raw title/description
//! text. The keyword signal is weighted higher so curated categorization
//! outranks noisy free text. Results order by score desc, then most recently
//! updated, then SKU — fully deterministic.
//!
//! Filter validation is the one place this module raises synchronously:
//! a filter value outside the taxonomy's enumerated sets is a caller error
//! ([`QueryError::InvalidFilter`]), not something to silently ignore.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::config::{Config, RetrievalConfig};
use crate::db;
use crate::models::SearchHit;
use crate::taxonomy::{Category, Complexity, Subcategory};

/// A caller-supplied filter value is not in the taxonomy's enumerated set.
/// Surfaced to the caller for re-prompting; never retried internally.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid {field} filter: '{value}'")]
    InvalidFilter {
        field: &'static str,
        value: String,
    },
}

/// Raw filter values as they arrive from the CLI or an API caller.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub complexity: Option<String>,
}

/// Filters validated against the taxonomy enums.
#[derive(Debug, Clone, Default)]
pub struct ParsedFilters {
    pub category: Option<Category>,
    pub subcategory: Option<Subcategory>,
    pub complexity: Option<Complexity>,
}

/// Validate filter strings against the enumerated sets. `unknown` is a
/// legal category/subcategory value (it selects uncategorized matches).
pub fn validate_filters(filters: &Filters) -> Result<ParsedFilters, QueryError> {
    let category = match &filters.category {
        Some(value) => Some(Category::parse(value).ok_or_else(|| QueryError::InvalidFilter {
            field: "category",
            value: value.clone(),
        })?),
        None => None,
    };
    let subcategory = match &filters.subcategory {
        Some(value) => {
            Some(
                Subcategory::parse(value).ok_or_else(|| QueryError::InvalidFilter {
                    field: "subcategory",
                    value: value.clone(),
                })?,
            )
        }
        None => None,
    };
    let complexity = match &filters.complexity {
        Some(value) => Some(Complexity::parse(value).ok_or_else(|| {
            QueryError::InvalidFilter {
                field: "complexity",
                value: value.clone(),
            }
        })?),
        None => None,
    };
    Ok(ParsedFilters {
        category,
        subcategory,
        complexity,
    })
}

/// Lowercase and split on non-alphanumeric boundaries.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Count query tokens that hit the curated RAG keyword set. Plain keywords
/// match by token equality; keywords carrying spaces or punctuation
/// ("large format", "thin-set") match as a substring of the whole
/// lowercased query.
pub fn keyword_overlap(tokens: &[String], query_lower: &str, rag_keywords: &[String]) -> usize {
    let mut hits = 0;
    for keyword in rag_keywords {
        if keyword.chars().any(|c| !c.is_alphanumeric()) {
            if query_lower.contains(keyword.as_str()) {
                hits += 1;
            }
        } else if tokens.iter().any(|t| t == keyword) {
            hits += 1;
        }
    }
    hits
}

/// Count distinct query tokens appearing as tokens of the raw text fields.
pub fn fulltext_overlap(tokens: &[String], title: &str, description: &str) -> usize {
    let mut text_tokens = tokenize(title);
    text_tokens.extend(tokenize(description));
    tokens
        .iter()
        .filter(|t| text_tokens.iter().any(|tt| tt == *t))
        .count()
}

/// Weighted sum of the two match signals.
pub fn combined_score(retrieval: &RetrievalConfig, keyword_hits: usize, fulltext_hits: usize) -> f64 {
    retrieval.keyword_weight * keyword_hits as f64
        + retrieval.fulltext_weight * fulltext_hits as f64
}

/// Final ordering: score desc, updated_at desc, sku asc — deterministic
/// across runs.
pub fn rank(mut hits: Vec<SearchHit>, final_limit: i64) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.updated_at.cmp(&a.updated_at))
            .then(a.sku.cmp(&b.sku))
    });
    hits.truncate(final_limit as usize);
    hits
}

/// Execute a search against the catalog. Read-only; an empty result set is
/// a valid outcome, not an error.
pub async fn search_products(
    pool: &SqlitePool,
    config: &Config,
    query: &str,
    filters: &Filters,
) -> Result<Vec<SearchHit>> {
    let parsed = validate_filters(filters)?;
    let tokens = tokenize(query);

    if tokens.is_empty() {
        return browse_by_filters(pool, config, &parsed).await;
    }

    let candidates = fetch_candidates(pool, config, &tokens, &parsed).await?;
    let query_lower = query.to_lowercase();
    let retrieval = &config.retrieval;

    let hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter_map(|c| {
            let kw = keyword_overlap(&tokens, &query_lower, &c.rag_keywords);
            let ft = fulltext_overlap(&tokens, &c.title, &c.description);
            let score = combined_score(retrieval, kw, ft);
            if score < retrieval.min_score {
                return None;
            }
            Some(SearchHit {
                sku: c.sku,
                title: c.title,
                category: c.category,
                subcategory: c.subcategory,
                updated_at: c.updated_at,
                score,
                snippet: snippet(&c.description),
            })
        })
        .collect();

    Ok(rank(hits, retrieval.final_limit))
}

/// CLI entry point — runs the search and prints ranked results.
pub async fn run_search(config: &Config, query: &str, filters: &Filters) -> Result<()> {
    let pool = db::connect(config).await?;
    let hits = search_products(&pool, config, query, filters).await?;
    pool.close().await;

    if hits.is_empty() {
        println!("No matching products.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} — {}",
            i + 1,
            hit.score,
            hit.sku,
            hit.title
        );
        println!("    category: {} / {}", hit.category, hit.subcategory);
        if !hit.snippet.is_empty() {
            println!("    excerpt: \"{}\"", hit.snippet);
        }
        println!();
    }

    Ok(())
}

struct Candidate {
    sku: String,
    title: String,
    description: String,
    category: String,
    subcategory: String,
    updated_at: i64,
    rag_keywords: Vec<String>,
}

const CANDIDATE_COLUMNS: &str =
    "products.sku, products.title, products.description, \
     COALESCE(products.category, 'unknown') AS category, \
     COALESCE(products.subcategory, 'unknown') AS subcategory, \
     products.updated_at, products.rag_keywords";

async fn fetch_candidates(
    pool: &SqlitePool,
    config: &Config,
    tokens: &[String],
    parsed: &ParsedFilters,
) -> Result<Vec<Candidate>> {
    // OR-join quoted tokens so any one hit yields a candidate; precise
    // scoring happens in Rust afterwards.
    let match_expr = tokens
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ");

    let mut sql = format!(
        "SELECT {} FROM products_fts \
         JOIN products ON products.sku = products_fts.sku \
         WHERE products_fts MATCH ?",
        CANDIDATE_COLUMNS
    );
    push_filter_clauses(&mut sql, parsed);
    sql.push_str(" LIMIT ?");

    let mut q = sqlx::query(&sql).bind(&match_expr);
    q = bind_filters(q, parsed);
    let rows = q.bind(config.retrieval.candidate_k).fetch_all(pool).await?;

    Ok(rows.iter().map(row_to_candidate).collect())
}

/// Empty query: everything in filter scope, most recently updated first.
async fn browse_by_filters(
    pool: &SqlitePool,
    config: &Config,
    parsed: &ParsedFilters,
) -> Result<Vec<SearchHit>> {
    let mut sql = format!(
        "SELECT {} FROM products WHERE 1=1",
        CANDIDATE_COLUMNS
    );
    push_filter_clauses(&mut sql, parsed);
    sql.push_str(" ORDER BY products.updated_at DESC, products.sku ASC LIMIT ?");

    let mut q = sqlx::query(&sql);
    q = bind_filters(q, parsed);
    let rows = q
        .bind(config.retrieval.final_limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(row_to_candidate)
        .map(|c| SearchHit {
            sku: c.sku,
            title: c.title,
            category: c.category,
            subcategory: c.subcategory,
            updated_at: c.updated_at,
            score: 0.0,
            snippet: snippet(&c.description),
        })
        .collect())
}

fn push_filter_clauses(sql: &mut String, parsed: &ParsedFilters) {
    if parsed.category.is_some() {
        sql.push_str(" AND COALESCE(products.category, 'unknown') = ?");
    }
    if parsed.subcategory.is_some() {
        sql.push_str(" AND COALESCE(products.subcategory, 'unknown') = ?");
    }
    if parsed.complexity.is_some() {
        sql.push_str(" AND products.complexity = ?");
    }
}

fn bind_filters<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    parsed: &ParsedFilters,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(category) = parsed.category {
        q = q.bind(category.as_str());
    }
    if let Some(subcategory) = parsed.subcategory {
        q = q.bind(subcategory.as_str());
    }
    if let Some(complexity) = parsed.complexity {
        q = q.bind(complexity.as_str());
    }
    q
}

fn row_to_candidate(row: &sqlx::sqlite::SqliteRow) -> Candidate {
    let rag_json: String = row.get("rag_keywords");
    // Best effort: a malformed row scores as if it had no keywords.
    let rag_keywords: Vec<String> = serde_json::from_str(&rag_json).unwrap_or_default();
    Candidate {
        sku: row.get("sku"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        subcategory: row.get("subcategory"),
        updated_at: row.get("updated_at"),
        rag_keywords,
    }
}

fn snippet(description: &str) -> String {
    let flat = description.replace('\n', " ");
    let trimmed = flat.trim();
    if trimmed.len() <= 120 {
        trimmed.to_string()
    } else {
        let mut cut = 120;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(
            tokenize("What Thinset, do-I need?"),
            vec!["what", "thinset", "do", "i", "need"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_invalid_category_filter_rejected() {
        let filters = Filters {
            category: Some("nonexistent_category".to_string()),
            ..Default::default()
        };
        let err = validate_filters(&filters).unwrap_err();
        match err {
            QueryError::InvalidFilter { field, value } => {
                assert_eq!(field, "category");
                assert_eq!(value, "nonexistent_category");
            }
        }
    }

    #[test]
    fn test_invalid_complexity_filter_rejected() {
        let filters = Filters {
            complexity: Some("expert".to_string()),
            ..Default::default()
        };
        assert!(validate_filters(&filters).is_err());
    }

    #[test]
    fn test_valid_filters_parse() {
        let filters = Filters {
            category: Some("tiles".to_string()),
            subcategory: Some("porcelain_tiles".to_string()),
            complexity: Some("advanced".to_string()),
        };
        let parsed = validate_filters(&filters).unwrap();
        assert_eq!(parsed.category, Some(Category::Tiles));
        assert_eq!(parsed.subcategory, Some(Subcategory::PorcelainTiles));
        assert_eq!(parsed.complexity, Some(Complexity::Advanced));
    }

    #[test]
    fn test_unknown_is_a_valid_filter_value() {
        let filters = Filters {
            category: Some("unknown".to_string()),
            ..Default::default()
        };
        let parsed = validate_filters(&filters).unwrap();
        assert_eq!(parsed.category, Some(Category::Unknown));
    }

    #[test]
    fn test_multiword_keyword_matches_as_substring() {
        let query = "need large format tile advice";
        let tokens = tokenize(query);
        let rag = vec!["large format".to_string(), "porcelain".to_string()];
        assert_eq!(keyword_overlap(&tokens, query, &rag), 1);
    }

    #[test]
    fn test_single_word_keyword_requires_token_equality() {
        // "tiles" in the query must not hit the keyword "tile"
        let query = "large tiles";
        let tokens = tokenize(query);
        let rag = vec!["tile".to_string()];
        assert_eq!(keyword_overlap(&tokens, query, &rag), 0);
    }

    #[test]
    fn test_keyword_weight_dominates_fulltext() {
        // "what thinset do I need for large tiles" must rank a thinset
        // product above a tile product: curated keyword hits dominate.
        let retrieval = RetrievalConfig::default();
        let query = "what thinset do i need for large tiles";
        let tokens = tokenize(query);

        let thinset_rag = vec![
            "thinset".to_string(),
            "mortar".to_string(),
            "modified".to_string(),
            "installation".to_string(),
            "setting materials".to_string(),
            "adhesive".to_string(),
        ];
        let thinset_score = combined_score(
            &retrieval,
            keyword_overlap(&tokens, query, &thinset_rag),
            fulltext_overlap(
                &tokens,
                "Modified thinset mortar",
                "modified thinset mortar for ceramic and porcelain",
            ),
        );

        let tile_rag = vec![
            "porcelain".to_string(),
            "large format".to_string(),
            "rectified".to_string(),
            "tile".to_string(),
            "tiles".to_string(),
            "flooring".to_string(),
        ];
        let tile_score = combined_score(
            &retrieval,
            keyword_overlap(&tokens, query, &tile_rag),
            fulltext_overlap(
                &tokens,
                "Large format porcelain tile",
                "12x24 large format porcelain tile, rectified edge",
            ),
        );

        assert!(
            thinset_score > tile_score,
            "thinset {} must outrank tile {}",
            thinset_score,
            tile_score
        );
    }

    #[test]
    fn test_rank_orders_score_then_recency_then_sku() {
        let hit = |sku: &str, score: f64, updated_at: i64| SearchHit {
            sku: sku.to_string(),
            title: String::new(),
            category: "tiles".to_string(),
            subcategory: "ceramic_tiles".to_string(),
            updated_at,
            score,
            snippet: String::new(),
        };
        let hits = vec![
            hit("C", 1.0, 50),
            hit("A", 2.0, 10),
            hit("B", 1.0, 50),
            hit("D", 1.0, 99),
        ];
        let ranked = rank(hits, 10);
        let order: Vec<&str> = ranked.iter().map(|h| h.sku.as_str()).collect();
        // A wins on score; D beats B/C on recency; B beats C on SKU.
        assert_eq!(order, vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let hits = (0..20)
            .map(|i| SearchHit {
                sku: format!("SKU-{:02}", i),
                title: String::new(),
                category: "tiles".to_string(),
                subcategory: "ceramic_tiles".to_string(),
                updated_at: i,
                score: i as f64,
                snippet: String::new(),
            })
            .collect();
        assert_eq!(rank(hits, 5).len(), 5);
    }

    #[test]
    fn test_snippet_truncates_long_descriptions() {
        let long = "x".repeat(500);
        let s = snippet(&long);
        assert!(s.len() <= 123);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }
}
