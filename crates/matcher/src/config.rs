use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::MatchError;
use crate::normalize::{builtin_suffixes, NormalizeRules, UNIT_MARKERS};
use crate::schema::{normalize_header, semantic_fields, DatasetKind, Field, SemanticField};

pub const DEFAULT_CONFIDENCE: u8 = 95;
pub const DEFAULT_MATCH_NOTES: &str = "exact-normalized (addr+city+state+zip)";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Matcher settings. Every key is optional; an empty file (or
/// `MatcherConfig::default()`) gives the stock matching rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    #[serde(default = "default_match_notes")]
    pub match_notes: String,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub aliases: AliasConfig,
}

fn default_confidence() -> u8 {
    DEFAULT_CONFIDENCE
}

fn default_match_notes() -> String {
    DEFAULT_MATCH_NOTES.into()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            match_notes: DEFAULT_MATCH_NOTES.into(),
            normalize: NormalizeConfig::default(),
            aliases: AliasConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Replaces the built-in marker list when given.
    #[serde(default = "default_unit_markers")]
    pub unit_markers: Vec<String>,
    /// Merged on top of the built-in street-type table.
    #[serde(default)]
    pub street_suffixes: BTreeMap<String, String>,
}

fn default_unit_markers() -> Vec<String> {
    UNIT_MARKERS.iter().map(|m| m.to_string()).collect()
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            unit_markers: default_unit_markers(),
            street_suffixes: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extra header aliases
// ---------------------------------------------------------------------------

/// Extra header aliases per dataset, keyed by field name. Appended after
/// the built-ins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    #[serde(default)]
    pub mail: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub crm: BTreeMap<String, Vec<String>>,
}

impl AliasConfig {
    pub fn for_kind(&self, kind: DatasetKind) -> &BTreeMap<String, Vec<String>> {
        match kind {
            DatasetKind::Mail => &self.mail,
            DatasetKind::Crm => &self.crm,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatcherConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatcherConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.confidence > 100 {
            return Err(MatchError::ConfigValidation(format!(
                "confidence must be between 0 and 100, got {}",
                self.confidence
            )));
        }

        if self.match_notes.trim().is_empty() {
            return Err(MatchError::ConfigValidation("match_notes must not be empty".into()));
        }

        if self.normalize.unit_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(MatchError::ConfigValidation("unit_markers must not contain empty entries".into()));
        }

        let suffixes = self.street_suffixes();
        for (abbr, full) in &suffixes {
            if !is_token(abbr) || !is_token(full) {
                return Err(MatchError::ConfigValidation(format!(
                    "street suffix '{abbr}' -> '{full}': both sides must be a single alphanumeric word"
                )));
            }
            // An expansion that is itself an abbreviation would keep rewriting.
            if let Some(again) = suffixes.get(full.as_str()) {
                if again != full {
                    return Err(MatchError::ConfigValidation(format!(
                        "street suffix '{abbr}' expands to '{full}', which is itself mapped to '{again}'"
                    )));
                }
            }
        }

        for kind in [DatasetKind::Mail, DatasetKind::Crm] {
            for (name, aliases) in self.aliases.for_kind(kind) {
                let field = Field::from_name(name)
                    .filter(|f| kind.fields().contains(f))
                    .ok_or_else(|| {
                        MatchError::ConfigValidation(format!(
                            "aliases.{kind}: unknown field '{name}'"
                        ))
                    })?;
                if let Some(bad) = aliases.iter().find(|a| normalize_header(a).is_empty()) {
                    return Err(MatchError::ConfigValidation(format!(
                        "aliases.{kind}.{field}: alias '{bad}' has no letters or digits"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Built-in suffix table with the configured entries on top, lower-cased.
    pub fn street_suffixes(&self) -> BTreeMap<String, String> {
        let mut table = builtin_suffixes();
        for (abbr, full) in &self.normalize.street_suffixes {
            table.insert(abbr.trim().to_lowercase(), full.trim().to_lowercase());
        }
        table
    }

    /// Compile the normalization tables.
    pub fn rules(&self) -> Result<NormalizeRules, MatchError> {
        NormalizeRules::new(&self.normalize.unit_markers, &self.street_suffixes())
    }

    /// Semantic field definitions for one dataset.
    pub fn fields(&self, kind: DatasetKind) -> Vec<SemanticField> {
        semantic_fields(kind, self.aliases.for_kind(kind))
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
