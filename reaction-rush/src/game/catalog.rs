//! Content Catalog
//!
//! Immutable icon set and post templates. Each template sorts icon ids into
//! five quality tiers. Loaded once at startup, either from the embedded
//! default catalog or from a JSON file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::game::choices::CHOICE_COUNT;

/// Catalog shipped with the binary.
const BUILTIN_CATALOG_JSON: &str = include_str!("../../assets/catalog.json");

// =============================================================================
// TIER
// =============================================================================

/// Quality bucket classifying how well an icon fits a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tier {
    /// Best possible reaction
    Perfect = 0,
    /// Good reaction
    Correct = 1,
    /// Harmless
    Neutral = 2,
    /// Bad reaction
    Wrong = 3,
    /// Terrible reaction
    Horrible = 4,
}

impl Tier {
    /// All tiers in classification priority order.
    pub const ALL: [Tier; 5] = [
        Tier::Perfect,
        Tier::Correct,
        Tier::Neutral,
        Tier::Wrong,
        Tier::Horrible,
    ];
}

// =============================================================================
// ICON / TEMPLATE
// =============================================================================

/// A selectable icon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    /// Unique identifier
    pub id: String,
    /// Human readable name
    pub display_name: String,
    /// Asset reference for the presentation layer (e.g. image file)
    pub asset_ref: String,
}

impl Icon {
    /// Create an icon.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, asset_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            asset_ref: asset_ref.into(),
        }
    }
}

/// A post prompt with its tiered icon ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTemplate {
    /// Text shown to the player
    pub text: String,
    /// Icon ids per tier, in catalog order. Missing tiers are empty.
    pub tiers: BTreeMap<Tier, Vec<String>>,
}

impl PostTemplate {
    /// Create a template with no tiers filled in.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tiers: BTreeMap::new(),
        }
    }

    /// Builder-style helper to set one tier.
    pub fn with_tier<I, S>(mut self, tier: Tier, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tiers.insert(tier, ids.into_iter().map(Into::into).collect());
        self
    }

    /// Icon ids for one tier (empty if unset).
    pub fn tier_ids(&self, tier: Tier) -> &[String] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classify an icon id, checking tiers in priority order.
    ///
    /// Returns `None` when the id is in no tier.
    pub fn classify(&self, icon_id: &str) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|tier| self.tier_ids(*tier).iter().any(|id| id == icon_id))
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Catalog load errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog has no post templates.
    #[error("catalog contains no post templates")]
    NoTemplates,

    /// Not enough icons to fill a round.
    #[error("catalog needs at least {needed} icons, found {found}")]
    TooFewIcons {
        /// Icons required
        needed: usize,
        /// Icons present
        found: usize,
    },

    /// Two icons share an id.
    #[error("duplicate icon id: {0}")]
    DuplicateIcon(String),

    /// JSON was malformed.
    #[error("invalid catalog json: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// The full set of icons and templates for a session.
#[derive(Clone, Debug)]
pub struct Catalog {
    icons: Vec<Icon>,
    index: BTreeMap<String, usize>,
    templates: Vec<PostTemplate>,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(icons: Vec<Icon>, templates: Vec<PostTemplate>) -> Result<Self, CatalogError> {
        if templates.is_empty() {
            return Err(CatalogError::NoTemplates);
        }

        let mut index = BTreeMap::new();
        for (i, icon) in icons.iter().enumerate() {
            if index.insert(icon.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateIcon(icon.id.clone()));
            }
        }

        if icons.len() < CHOICE_COUNT {
            return Err(CatalogError::TooFewIcons {
                needed: CHOICE_COUNT,
                found: icons.len(),
            });
        }

        let catalog = Self { icons, index, templates };
        catalog.report_unresolved();
        Ok(catalog)
    }

    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        raw.into_catalog()
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The embedded default catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    /// Look up an icon by id.
    pub fn icon(&self, id: &str) -> Option<&Icon> {
        self.index.get(id).map(|&i| &self.icons[i])
    }

    /// All icons in catalog order.
    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    /// All post templates in catalog order.
    pub fn templates(&self) -> &[PostTemplate] {
        &self.templates
    }

    /// Number of post templates.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Warn once about template ids that do not resolve to an icon.
    fn report_unresolved(&self) {
        let unresolved: BTreeSet<&str> = self
            .templates
            .iter()
            .flat_map(|t| t.tiers.values().flatten())
            .map(String::as_str)
            .filter(|id| !self.index.contains_key(*id))
            .collect();

        if !unresolved.is_empty() {
            warn!(?unresolved, "catalog templates reference unknown icons");
        }
    }
}

// =============================================================================
// JSON SHAPE
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawCatalog {
    icons: Vec<RawIcon>,
    posts: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawIcon {
    id: String,
    name: String,
    file: String,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    text: String,
    #[serde(default)]
    perfect: Vec<String>,
    #[serde(default)]
    correct: Vec<String>,
    #[serde(default)]
    neutral: Vec<String>,
    #[serde(default)]
    wrong: Vec<String>,
    #[serde(default)]
    horrible: Vec<String>,
}

impl RawCatalog {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let icons = self
            .icons
            .into_iter()
            .map(|i| Icon::new(i.id, i.name, i.file))
            .collect();

        let templates = self
            .posts
            .into_iter()
            .map(|p| {
                PostTemplate::new(p.text)
                    .with_tier(Tier::Perfect, p.perfect)
                    .with_tier(Tier::Correct, p.correct)
                    .with_tier(Tier::Neutral, p.neutral)
                    .with_tier(Tier::Wrong, p.wrong)
                    .with_tier(Tier::Horrible, p.horrible)
            })
            .collect();

        Catalog::new(icons, templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icons(ids: &[&str]) -> Vec<Icon> {
        ids.iter().map(|id| Icon::new(*id, *id, format!("icon-{id}.png"))).collect()
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.template_count() > 40);
        assert!(catalog.icons().len() >= CHOICE_COUNT);
        assert_eq!(catalog.icon("wolf").unwrap().display_name, "Wolf");
    }

    #[test]
    fn test_classify_priority_order() {
        // An id listed in two tiers resolves to the higher-priority one.
        let t = PostTemplate::new("x")
            .with_tier(Tier::Wrong, ["a"])
            .with_tier(Tier::Correct, ["a"]);
        assert_eq!(t.classify("a"), Some(Tier::Correct));
        assert_eq!(t.classify("zzz"), None);
    }

    #[test]
    fn test_missing_tier_is_empty() {
        let t = PostTemplate::new("x").with_tier(Tier::Perfect, ["a"]);
        assert!(t.tier_ids(Tier::Neutral).is_empty());
    }

    #[test]
    fn test_rejects_empty_templates() {
        let err = Catalog::new(icons(&["a", "b", "c", "d", "e", "f"]), vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::NoTemplates));
    }

    #[test]
    fn test_rejects_too_few_icons() {
        let err = Catalog::new(icons(&["a", "b"]), vec![PostTemplate::new("x")]).unwrap_err();
        assert!(matches!(err, CatalogError::TooFewIcons { needed: 6, found: 2 }));
    }

    #[test]
    fn test_rejects_duplicate_icon() {
        let err = Catalog::new(
            icons(&["a", "b", "c", "d", "e", "a"]),
            vec![PostTemplate::new("x")],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateIcon(id) if id == "a"));
    }

    #[test]
    fn test_unresolved_ids_are_not_fatal() {
        let t = PostTemplate::new("x").with_tier(Tier::Perfect, ["ghost"]);
        assert!(Catalog::new(icons(&["a", "b", "c", "d", "e", "f"]), vec![t]).is_ok());
    }

    #[test]
    fn test_from_json_defaults_missing_tiers() {
        let json = r#"{
            "icons": [
                {"id": "a", "name": "A", "file": "a.png"},
                {"id": "b", "name": "B", "file": "b.png"},
                {"id": "c", "name": "C", "file": "c.png"},
                {"id": "d", "name": "D", "file": "d.png"},
                {"id": "e", "name": "E", "file": "e.png"},
                {"id": "f", "name": "F", "file": "f.png"}
            ],
            "posts": [{"text": "hello", "perfect": ["a"], "horrible": ["f"]}]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let t = &catalog.templates()[0];
        assert_eq!(t.tier_ids(Tier::Perfect), ["a".to_string()]);
        assert!(t.tier_ids(Tier::Correct).is_empty());
        assert_eq!(catalog.icon("f").unwrap().asset_ref, "f.png");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Parse(_))));
    }
}
