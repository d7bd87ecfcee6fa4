//! Core data models used throughout tilebase.
//!
//! These types represent the product records, category assignments, and
//! search results that flow through the ingestion, categorization, and
//! retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::taxonomy::{Category, Complexity, Subcategory};

/// Raw product record as it appears in a feed file, before persistence.
///
/// Produced by the external acquisition pipeline; tilebase only reads
/// these, it never fetches product data itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub sku: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A feed record paired with the timestamp of the file it came from.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub record: ProductRecord,
    pub source_path: String,
    pub updated_at: DateTime<Utc>,
}

/// The categorizer's verdict for one product.
///
/// Superseded (never deleted) when a product is recategorized. A product
/// whose text matched nothing carries `Category::Unknown` — that is a valid
/// terminal classification, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAssignment {
    pub category: Category,
    pub subcategory: Subcategory,
    pub complexity: Complexity,
    /// Matched taxonomy keywords plus category synonyms, deduplicated.
    pub rag_keywords: Vec<String>,
    pub application_areas: Vec<String>,
    /// Complementary subcategories, in compatibility-table order.
    pub related_categories: Vec<Subcategory>,
}

impl CategoryAssignment {
    /// The assignment for text that matched no taxonomy entry.
    pub fn unknown() -> Self {
        CategoryAssignment {
            category: Category::Unknown,
            subcategory: Subcategory::Unknown,
            complexity: Complexity::Basic,
            rag_keywords: Vec::new(),
            application_areas: Vec::new(),
            related_categories: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.category == Category::Unknown
    }
}

/// A ranked search result returned by the query builder.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub sku: String,
    pub title: String,
    pub category: String,
    pub subcategory: String,
    pub updated_at: i64,
    pub score: f64,
    pub snippet: String,
}
