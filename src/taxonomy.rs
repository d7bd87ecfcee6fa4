//! Static product taxonomy: categories, subcategories, and weighted keywords.
//!
//! The taxonomy is the closed vocabulary everything else is built on. It is
//! constructed once at startup via [`Taxonomy::builtin`] and passed around by
//! reference — there is no global registry and nothing here mutates after
//! load. Category and subcategory names that reach the database or the CLI
//! are validated back through [`Category::parse`] / [`Subcategory::parse`],
//! so invalid names are caught at the boundary rather than deep in scoring.

use std::fmt;

/// Top-level product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tiles,
    InstallationMaterials,
    TrimAndEdging,
    Tools,
    Maintenance,
    /// Valid terminal classification for text that matched nothing.
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tiles => "tiles",
            Category::InstallationMaterials => "installation_materials",
            Category::TrimAndEdging => "trim_and_edging",
            Category::Tools => "tools",
            Category::Maintenance => "maintenance",
            Category::Unknown => "unknown",
        }
    }

    /// Parse a stored or caller-supplied category name. `unknown` is
    /// accepted so operators can filter for uncategorized products.
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "tiles" => Some(Category::Tiles),
            "installation_materials" => Some(Category::InstallationMaterials),
            "trim_and_edging" => Some(Category::TrimAndEdging),
            "tools" => Some(Category::Tools),
            "maintenance" => Some(Category::Maintenance),
            "unknown" => Some(Category::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subcategory within a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcategory {
    // tiles
    CeramicTiles,
    PorcelainTiles,
    NaturalStone,
    MosaicTiles,
    GlassTiles,
    // installation_materials
    ThinsetMortar,
    Grout,
    WaterproofingMembrane,
    LevelingUnderlayment,
    BackerBoard,
    // trim_and_edging
    TileTrim,
    TransitionStrips,
    Bullnose,
    // tools
    Trowels,
    TileCutters,
    SpacersAndLevelers,
    // maintenance
    Sealers,
    Cleaners,
    Unknown,
}

impl Subcategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::CeramicTiles => "ceramic_tiles",
            Subcategory::PorcelainTiles => "porcelain_tiles",
            Subcategory::NaturalStone => "natural_stone",
            Subcategory::MosaicTiles => "mosaic_tiles",
            Subcategory::GlassTiles => "glass_tiles",
            Subcategory::ThinsetMortar => "thinset_mortar",
            Subcategory::Grout => "grout",
            Subcategory::WaterproofingMembrane => "waterproofing_membrane",
            Subcategory::LevelingUnderlayment => "leveling_underlayment",
            Subcategory::BackerBoard => "backer_board",
            Subcategory::TileTrim => "tile_trim",
            Subcategory::TransitionStrips => "transition_strips",
            Subcategory::Bullnose => "bullnose",
            Subcategory::Trowels => "trowels",
            Subcategory::TileCutters => "tile_cutters",
            Subcategory::SpacersAndLevelers => "spacers_and_levelers",
            Subcategory::Sealers => "sealers",
            Subcategory::Cleaners => "cleaners",
            Subcategory::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Subcategory> {
        match s {
            "ceramic_tiles" => Some(Subcategory::CeramicTiles),
            "porcelain_tiles" => Some(Subcategory::PorcelainTiles),
            "natural_stone" => Some(Subcategory::NaturalStone),
            "mosaic_tiles" => Some(Subcategory::MosaicTiles),
            "glass_tiles" => Some(Subcategory::GlassTiles),
            "thinset_mortar" => Some(Subcategory::ThinsetMortar),
            "grout" => Some(Subcategory::Grout),
            "waterproofing_membrane" => Some(Subcategory::WaterproofingMembrane),
            "leveling_underlayment" => Some(Subcategory::LevelingUnderlayment),
            "backer_board" => Some(Subcategory::BackerBoard),
            "tile_trim" => Some(Subcategory::TileTrim),
            "transition_strips" => Some(Subcategory::TransitionStrips),
            "bullnose" => Some(Subcategory::Bullnose),
            "trowels" => Some(Subcategory::Trowels),
            "tile_cutters" => Some(Subcategory::TileCutters),
            "spacers_and_levelers" => Some(Subcategory::SpacersAndLevelers),
            "sealers" => Some(Subcategory::Sealers),
            "cleaners" => Some(Subcategory::Cleaners),
            "unknown" => Some(Subcategory::Unknown),
            _ => None,
        }
    }

    /// The category this subcategory belongs to.
    pub fn category(&self) -> Category {
        match self {
            Subcategory::CeramicTiles
            | Subcategory::PorcelainTiles
            | Subcategory::NaturalStone
            | Subcategory::MosaicTiles
            | Subcategory::GlassTiles => Category::Tiles,
            Subcategory::ThinsetMortar
            | Subcategory::Grout
            | Subcategory::WaterproofingMembrane
            | Subcategory::LevelingUnderlayment
            | Subcategory::BackerBoard => Category::InstallationMaterials,
            Subcategory::TileTrim | Subcategory::TransitionStrips | Subcategory::Bullnose => {
                Category::TrimAndEdging
            }
            Subcategory::Trowels | Subcategory::TileCutters | Subcategory::SpacersAndLevelers => {
                Category::Tools
            }
            Subcategory::Sealers | Subcategory::Cleaners => Category::Maintenance,
            Subcategory::Unknown => Category::Unknown,
        }
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installation skill level derived from secondary keyword markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Complexity {
    Basic,
    Intermediate,
    Advanced,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Basic => "basic",
            Complexity::Intermediate => "intermediate",
            Complexity::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Complexity> {
        match s {
            "basic" => Some(Complexity::Basic),
            "intermediate" => Some(Complexity::Intermediate),
            "advanced" => Some(Complexity::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored taxonomy entry: a (category, subcategory) pair and its
/// weighted keyword list. Weights are in (0, 1].
#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub subcategory: Subcategory,
    pub keywords: &'static [(&'static str, f64)],
}

impl TaxonomyEntry {
    pub fn category(&self) -> Category {
        self.subcategory.category()
    }
}

/// The full keyword taxonomy plus the secondary marker sets.
///
/// Entry order is load-bearing: when two entries tie on score, the
/// first-declared entry wins. Tests pin this ordering.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
    synonyms: Vec<(Category, &'static [&'static str])>,
    advanced_markers: &'static [&'static str],
    intermediate_markers: &'static [&'static str],
    application_markers: &'static [&'static str],
}

impl Taxonomy {
    /// Build the built-in tile-retail taxonomy.
    pub fn builtin() -> Taxonomy {
        let entries = vec![
            // -------- tiles --------
            TaxonomyEntry {
                subcategory: Subcategory::CeramicTiles,
                keywords: &[
                    ("ceramic", 0.9),
                    ("glazed", 0.4),
                    ("subway", 0.5),
                    ("terracotta", 0.6),
                    ("wall tile", 0.5),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::PorcelainTiles,
                keywords: &[
                    ("porcelain", 0.9),
                    ("rectified", 0.5),
                    ("large format", 0.5),
                    ("vitrified", 0.6),
                    ("through-body", 0.5),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::NaturalStone,
                keywords: &[
                    ("natural stone", 0.9),
                    ("marble", 0.8),
                    ("travertine", 0.8),
                    ("granite", 0.8),
                    ("slate", 0.8),
                    ("limestone", 0.8),
                    ("quartzite", 0.7),
                    ("honed", 0.4),
                    ("tumbled", 0.4),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::MosaicTiles,
                keywords: &[
                    ("mosaic", 0.9),
                    ("glass mosaic", 0.8),
                    ("penny round", 0.7),
                    ("hexagon", 0.6),
                    ("mesh mounted", 0.5),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::GlassTiles,
                keywords: &[
                    ("glass tile", 0.9),
                    ("iridescent", 0.5),
                    ("frosted", 0.4),
                ],
            },
            // -------- installation_materials --------
            TaxonomyEntry {
                subcategory: Subcategory::ThinsetMortar,
                keywords: &[
                    ("thinset", 1.0),
                    ("thin-set", 0.9),
                    ("mortar", 0.8),
                    ("medium bed", 0.6),
                    ("modified", 0.5),
                    ("unmodified", 0.5),
                    ("polymer", 0.4),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::Grout,
                keywords: &[
                    ("grout", 1.0),
                    ("epoxy grout", 0.8),
                    ("sanded", 0.6),
                    ("unsanded", 0.6),
                    ("caulk", 0.5),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::WaterproofingMembrane,
                keywords: &[
                    ("membrane", 0.9),
                    ("waterproofing", 0.9),
                    ("uncoupling", 0.8),
                    ("crack isolation", 0.7),
                    ("anti-fracture", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::LevelingUnderlayment,
                keywords: &[
                    ("self-leveling", 0.9),
                    ("self leveling", 0.9),
                    ("underlayment", 0.8),
                    ("feather finish", 0.5),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::BackerBoard,
                keywords: &[
                    ("backer board", 0.9),
                    ("backerboard", 0.9),
                    ("cement board", 0.9),
                ],
            },
            // -------- trim_and_edging --------
            TaxonomyEntry {
                subcategory: Subcategory::TileTrim,
                keywords: &[
                    ("edge trim", 0.8),
                    ("metal trim", 0.7),
                    ("edge profile", 0.7),
                    ("trim", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::TransitionStrips,
                keywords: &[
                    ("transition strip", 0.9),
                    ("threshold", 0.6),
                    ("reducer", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::Bullnose,
                keywords: &[
                    ("bullnose", 0.9),
                    ("pencil liner", 0.6),
                    ("quarter round", 0.5),
                ],
            },
            // -------- tools --------
            TaxonomyEntry {
                subcategory: Subcategory::Trowels,
                keywords: &[
                    ("notched trowel", 0.8),
                    ("trowel", 0.9),
                    ("margin trowel", 0.7),
                    ("grout float", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::TileCutters,
                keywords: &[
                    ("tile cutter", 0.9),
                    ("wet saw", 0.9),
                    ("diamond blade", 0.7),
                    ("score and snap", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::SpacersAndLevelers,
                keywords: &[
                    ("spacer", 0.8),
                    ("leveling system", 0.8),
                    ("leveling clip", 0.7),
                    ("wedge", 0.5),
                ],
            },
            // -------- maintenance --------
            TaxonomyEntry {
                subcategory: Subcategory::Sealers,
                keywords: &[
                    ("sealer", 0.9),
                    ("penetrating sealer", 0.8),
                    ("sealant", 0.7),
                    ("impregnating", 0.6),
                ],
            },
            TaxonomyEntry {
                subcategory: Subcategory::Cleaners,
                keywords: &[
                    ("cleaner", 0.9),
                    ("haze remover", 0.8),
                    ("ph neutral", 0.6),
                    ("degreaser", 0.6),
                ],
            },
        ];

        Taxonomy {
            entries,
            synonyms: vec![
                (Category::Tiles, &["tile", "tiles", "flooring"]),
                (
                    Category::InstallationMaterials,
                    &["installation", "setting materials", "adhesive"],
                ),
                (Category::TrimAndEdging, &["trim", "edging", "finishing"]),
                (Category::Tools, &["tool", "tools", "equipment"]),
                (Category::Maintenance, &["maintenance", "care", "cleaning"]),
            ],
            advanced_markers: &[
                "large format",
                "membrane",
                "leveling system",
                "natural stone",
                "uncoupling",
                "mud bed",
                "steam shower",
                "heated floor",
                "epoxy",
            ],
            intermediate_markers: &[
                "rectified",
                "mosaic",
                "herringbone",
                "diagonal",
                "backsplash",
                "waterproofing",
            ],
            application_markers: &[
                "floor",
                "wall",
                "shower",
                "bathroom",
                "kitchen",
                "backsplash",
                "outdoor",
                "countertop",
                "pool",
                "fireplace",
                "entryway",
            ],
        }
    }

    /// All scored entries, in declaration order (the tie-break order).
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    /// Category-level synonyms folded into `rag_keywords` for search recall.
    pub fn synonyms_for(&self, category: Category) -> &'static [&'static str] {
        self.synonyms
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, syns)| *syns)
            .unwrap_or(&[])
    }

    pub fn advanced_markers(&self) -> &'static [&'static str] {
        self.advanced_markers
    }

    pub fn intermediate_markers(&self) -> &'static [&'static str] {
        self.intermediate_markers
    }

    pub fn application_markers(&self) -> &'static [&'static str] {
        self.application_markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_category_roundtrip() {
        for cat in [
            Category::Tiles,
            Category::InstallationMaterials,
            Category::TrimAndEdging,
            Category::Tools,
            Category::Maintenance,
            Category::Unknown,
        ] {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(Category::parse("nonexistent_category"), None);
    }

    #[test]
    fn test_subcategory_category_membership() {
        let taxonomy = Taxonomy::builtin();
        for entry in taxonomy.entries() {
            // Every entry's subcategory must map back to a real category
            assert_ne!(entry.category(), Category::Unknown);
            assert_eq!(
                Subcategory::parse(entry.subcategory.as_str()),
                Some(entry.subcategory)
            );
        }
    }

    #[test]
    fn test_entries_unique() {
        let taxonomy = Taxonomy::builtin();
        let mut seen = HashSet::new();
        for entry in taxonomy.entries() {
            assert!(
                seen.insert(entry.subcategory),
                "duplicate taxonomy entry: {}",
                entry.subcategory
            );
        }
    }

    #[test]
    fn test_weights_in_range() {
        let taxonomy = Taxonomy::builtin();
        for entry in taxonomy.entries() {
            for (kw, weight) in entry.keywords {
                assert!(
                    *weight > 0.0 && *weight <= 1.0,
                    "weight out of (0, 1] for '{}': {}",
                    kw,
                    weight
                );
                assert_eq!(*kw, kw.to_lowercase(), "keywords must be lowercase");
            }
        }
    }

    #[test]
    fn test_every_category_has_synonyms() {
        let taxonomy = Taxonomy::builtin();
        for cat in [
            Category::Tiles,
            Category::InstallationMaterials,
            Category::TrimAndEdging,
            Category::Tools,
            Category::Maintenance,
        ] {
            assert!(!taxonomy.synonyms_for(cat).is_empty());
        }
        assert!(taxonomy.synonyms_for(Category::Unknown).is_empty());
    }
}
