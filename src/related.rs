//! Cross-sell compatibility table.
//!
//! Maps a product's subcategory to the ordered list of complementary
//! subcategories a sales surface should suggest alongside it (tile → setting
//! materials → trim, and so on). Pure lookup over a static table; a
//! subcategory without a rule resolves to an empty slice, never an error.

use anyhow::{bail, Result};
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::taxonomy::Subcategory;

/// One cross-sell rule: buyers of `subcategory` usually also need `related`,
/// in the declared order.
#[derive(Debug, Clone)]
pub struct CompatibilityRule {
    pub subcategory: Subcategory,
    pub related: &'static [Subcategory],
}

/// The full set of cross-sell rules, immutable after construction.
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    rules: Vec<CompatibilityRule>,
}

impl CompatibilityTable {
    pub fn builtin() -> CompatibilityTable {
        use Subcategory::*;
        let rules = vec![
            rule(
                CeramicTiles,
                &[ThinsetMortar, Grout, TileTrim, SpacersAndLevelers],
            ),
            rule(
                PorcelainTiles,
                &[ThinsetMortar, Grout, TileTrim, SpacersAndLevelers],
            ),
            rule(NaturalStone, &[ThinsetMortar, Sealers, Grout, TileTrim]),
            rule(MosaicTiles, &[ThinsetMortar, Grout, Trowels]),
            rule(GlassTiles, &[ThinsetMortar, Grout]),
            rule(ThinsetMortar, &[Trowels, SpacersAndLevelers, Grout]),
            rule(Grout, &[Sealers, Cleaners]),
            rule(WaterproofingMembrane, &[ThinsetMortar]),
            rule(LevelingUnderlayment, &[ThinsetMortar]),
            rule(BackerBoard, &[ThinsetMortar]),
            rule(TileTrim, &[ThinsetMortar]),
            rule(Bullnose, &[Grout]),
            rule(Sealers, &[Cleaners]),
        ];
        CompatibilityTable { rules }
    }

    /// Complementary subcategories for `subcategory`, verbatim in table
    /// order. No rule means no suggestions.
    pub fn resolve_related(&self, subcategory: Subcategory) -> &[Subcategory] {
        self.rules
            .iter()
            .find(|r| r.subcategory == subcategory)
            .map(|r| r.related)
            .unwrap_or(&[])
    }
}

fn rule(subcategory: Subcategory, related: &'static [Subcategory]) -> CompatibilityRule {
    CompatibilityRule {
        subcategory,
        related,
    }
}

/// Run the `related` command: print cross-sell suggestions for a product.
pub async fn run_related(config: &Config, sku: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let row = sqlx::query("SELECT title, subcategory FROM products WHERE sku = ?")
        .bind(sku)
        .fetch_optional(&pool)
        .await?;
    pool.close().await;

    let row = match row {
        Some(row) => row,
        None => bail!("product not found: {}", sku),
    };

    let title: String = row.get("title");
    let subcategory = row
        .get::<Option<String>, _>("subcategory")
        .as_deref()
        .and_then(Subcategory::parse)
        .unwrap_or(Subcategory::Unknown);

    println!("{} — {}", sku, title);
    println!("subcategory: {}", subcategory);

    let table = CompatibilityTable::builtin();
    let related = table.resolve_related(subcategory);
    if related.is_empty() {
        println!("no cross-sell suggestions");
        return Ok(());
    }

    println!("suggest alongside:");
    for (i, sub) in related.iter().enumerate() {
        println!("  {}. {}", i + 1, sub);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Subcategory;

    #[test]
    fn test_tile_pulls_setting_materials() {
        let table = CompatibilityTable::builtin();
        let related = table.resolve_related(Subcategory::CeramicTiles);
        assert_eq!(related[0], Subcategory::ThinsetMortar);
        assert!(related.contains(&Subcategory::Grout));
    }

    #[test]
    fn test_missing_rule_is_empty_not_error() {
        let table = CompatibilityTable::builtin();
        assert!(table.resolve_related(Subcategory::TileCutters).is_empty());
        assert!(table.resolve_related(Subcategory::Unknown).is_empty());
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let table = CompatibilityTable::builtin();
        let a: Vec<_> = table.resolve_related(Subcategory::NaturalStone).to_vec();
        let b: Vec<_> = table.resolve_related(Subcategory::NaturalStone).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rules_never_suggest_self() {
        let table = CompatibilityTable::builtin();
        for rule in &table.rules {
            assert!(
                !rule.related.contains(&rule.subcategory),
                "{} suggests itself",
                rule.subcategory
            );
        }
    }
}
