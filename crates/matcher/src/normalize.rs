//! Field normalization into the canonical location key.
//!
//! Every function here is pure: the output depends only on the raw cell
//! value and the immutable [`NormalizeRules`].

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::error::MatchError;

/// Common USPS street-type abbreviations, mapped on the final address token.
pub const STREET_SUFFIXES: &[(&str, &str)] = &[
    ("st", "street"),
    ("ave", "avenue"),
    ("av", "avenue"),
    ("blvd", "boulevard"),
    ("dr", "drive"),
    ("ln", "lane"),
    ("rd", "road"),
    ("trl", "trail"),
    ("ter", "terrace"),
    ("cir", "circle"),
    ("ct", "court"),
    ("hwy", "highway"),
    ("pkwy", "parkway"),
    ("pl", "place"),
    ("way", "way"),
    ("sq", "square"),
];

/// Unit/suite markers removed together with the token that follows them.
pub const UNIT_MARKERS: &[&str] = &["apt", "unit", "#", "ste", "suite"];

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Compiled normalization tables.
#[derive(Debug, Clone)]
pub struct NormalizeRules {
    unit_pattern: Option<Regex>,
    unit_words: HashSet<String>,
    suffixes: HashMap<String, String>,
}

impl NormalizeRules {
    /// Compile rules from unit markers and a suffix table. Markers and
    /// suffix keys are lower-cased.
    pub fn new(
        unit_markers: &[String],
        suffixes: &BTreeMap<String, String>,
    ) -> Result<Self, MatchError> {
        let mut alternatives = Vec::new();
        let mut unit_words = HashSet::new();

        for marker in unit_markers {
            let marker = marker.trim().to_lowercase();
            if marker.is_empty() {
                continue;
            }
            let escaped = regex::escape(&marker);
            if marker.chars().all(|c| c.is_ascii_alphanumeric()) {
                alternatives.push(format!(r"\b{escaped}\b"));
                unit_words.insert(marker);
            } else {
                alternatives.push(escaped);
            }
        }

        let unit_pattern = if alternatives.is_empty() {
            None
        } else {
            // "Apt #5": the marker takes the number sign with it.
            let pattern = format!(r"(?:{})\.?\s*#?\s*\w+", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                MatchError::ConfigValidation(format!("bad unit marker pattern: {e}"))
            })?)
        };

        let suffixes = suffixes
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
            .collect();

        Ok(Self {
            unit_pattern,
            unit_words,
            suffixes,
        })
    }

    /// Built-in tables only.
    pub fn builtin() -> Result<Self, MatchError> {
        let markers: Vec<String> = UNIT_MARKERS.iter().map(|m| m.to_string()).collect();
        Self::new(&markers, &builtin_suffixes())
    }

    pub fn suffix(&self, token: &str) -> Option<&str> {
        self.suffixes.get(token).map(|s| s.as_str())
    }
}

pub fn builtin_suffixes() -> BTreeMap<String, String> {
    STREET_SUFFIXES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Field normalizers
// ---------------------------------------------------------------------------

/// Normalize a street address.
///
/// Lower-cases, spells out `&`, drops unit markers with the token after
/// them, turns every other non-alphanumeric run into one space and expands
/// a trailing street-type abbreviation.
pub fn normalize_address(raw: &str, rules: &NormalizeRules) -> String {
    let lowered = raw.to_lowercase().replace('&', " and ");

    let without_units = match &rules.unit_pattern {
        Some(re) => re.replace_all(&lowered, "").into_owned(),
        None => lowered,
    };

    let cleaned: String = without_units
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    // Markers whose number was split off by punctuation ("unit-5") only
    // surface as separate tokens after cleaning.
    let mut parts: Vec<&str> = Vec::new();
    let mut tokens = cleaned.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if rules.unit_words.contains(tok) && tokens.peek().is_some() {
            tokens.next();
            continue;
        }
        parts.push(tok);
    }

    if let Some(last) = parts.last_mut() {
        if let Some(full) = rules.suffix(last) {
            *last = full;
        }
    }

    parts.join(" ")
}

/// City and state compare case-insensitively after trimming.
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// First five characters of the trimmed zip, so ZIP+4 collapses to the base zip.
pub fn normalize_zip(raw: &str) -> String {
    raw.trim().chars().take(5).collect()
}

// ---------------------------------------------------------------------------
// Canonical key
// ---------------------------------------------------------------------------

/// Exact join key. Field order is zip, city, state, address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CanonicalKey {
    pub zip: String,
    pub city: String,
    pub state: String,
    pub address: String,
}

impl CanonicalKey {
    pub fn build(address: &str, city: &str, state: &str, zip: &str, rules: &NormalizeRules) -> Self {
        Self {
            zip: normalize_zip(zip),
            city: normalize_text(city),
            state: normalize_text(state),
            address: normalize_address(address, rules),
        }
    }

    /// True when every component normalized to the empty string.
    pub fn is_blank(&self) -> bool {
        self.zip.is_empty() && self.city.is_empty() && self.state.is_empty() && self.address.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rules() -> NormalizeRules {
        NormalizeRules::builtin().unwrap()
    }

    #[test]
    fn street_suffix_expands() {
        let r = rules();
        assert_eq!(normalize_address("123 Main St", &r), "123 main street");
        assert_eq!(normalize_address("123 Main Street", &r), "123 main street");
        assert_eq!(normalize_address("9 Oak Blvd.", &r), "9 oak boulevard");
    }

    #[test]
    fn only_last_token_is_expanded() {
        let r = rules();
        assert_eq!(normalize_address("1 St Marys Ave", &r), "1 st marys avenue");
    }

    #[test]
    fn ampersand_spelled_out() {
        let r = rules();
        assert_eq!(normalize_address("5th & Elm", &r), "5th and elm");
    }

    #[test]
    fn unit_markers_removed_with_following_token() {
        let r = rules();
        assert_eq!(normalize_address("123 Main St Apt 4B", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St Apt. 4B", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St #5", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St Suite 200", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St, Unit-7", &r), "123 main street");
    }

    #[test]
    fn marker_before_number_sign_is_removed() {
        let r = rules();
        assert_eq!(normalize_address("123 Main St Apt #5", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St Unit #7", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St Suite #200", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St Ste. #2", &r), "123 main street");
        assert_eq!(normalize_address("123 Main St apt# 5", &r), "123 main street");
    }

    #[test]
    fn number_sign_unit_keys_match_plain_address() {
        let r = rules();
        let mail = CanonicalKey::build("123 Main St Apt #5", "Austin", "TX", "78701", &r);
        let crm = CanonicalKey::build("123 Main St", "Austin", "TX", "78701", &r);
        assert_eq!(mail, crm);
    }

    #[test]
    fn unit_word_inside_other_word_is_kept() {
        let r = rules();
        assert_eq!(normalize_address("10 Unity Way", &r), "10 unity way");
        assert_eq!(normalize_address("10 Steel Ave", &r), "10 steel avenue");
    }

    #[test]
    fn marker_eats_following_street_word() {
        // A marker directly before a real street word removes that word too.
        let r = rules();
        assert_eq!(normalize_address("77 Unit Way", &r), "77");
    }

    #[test]
    fn trailing_marker_without_token_is_kept() {
        let r = rules();
        assert_eq!(normalize_address("123 Main Apt", &r), "123 main apt");
    }

    #[test]
    fn empty_address_normalizes_to_empty() {
        let r = rules();
        assert_eq!(normalize_address("", &r), "");
        assert_eq!(normalize_address("  ,. ", &r), "");
    }

    #[test]
    fn custom_suffix_table() {
        let mut suffixes = builtin_suffixes();
        suffixes.insert("xing".into(), "crossing".into());
        let r = NormalizeRules::new(&["apt".to_string()], &suffixes).unwrap();
        assert_eq!(normalize_address("4 Deer Xing", &r), "4 deer crossing");
        // "#" is no longer a marker, so only punctuation stripping applies.
        assert_eq!(normalize_address("4 Deer Xing #2", &r), "4 deer xing 2");
    }

    #[test]
    fn zip_plus_four_collapses() {
        assert_eq!(normalize_zip("78701-1234"), "78701");
        assert_eq!(normalize_zip(" 78701 "), "78701");
        assert_eq!(normalize_zip("787"), "787");
        assert_eq!(normalize_zip(""), "");
    }

    #[test]
    fn city_state_trimmed_and_lowered() {
        assert_eq!(normalize_text("  Austin "), "austin");
        assert_eq!(normalize_text("TX"), "tx");
    }

    #[test]
    fn keys_match_across_formats() {
        let r = rules();
        let a = CanonicalKey::build("123 Main St", "Austin", "TX", "78701", &r);
        let b = CanonicalKey::build("123 Main Street", "austin", "tx", "78701-1234", &r);
        assert_eq!(a, b);
        assert!(!a.is_blank());
        assert!(CanonicalKey::build("", " ", "", "", &r).is_blank());
    }

    proptest! {
        #[test]
        fn zip_is_short_prefix_of_trimmed(z in "\\PC{0,16}") {
            let n = normalize_zip(&z);
            prop_assert!(n.chars().count() <= 5);
            prop_assert!(z.trim().starts_with(&n));
        }

        #[test]
        fn address_normalization_is_idempotent(a in "[A-Za-z0-9 #&.,'-]{0,40}") {
            let r = rules();
            let once = normalize_address(&a, &r);
            let twice = normalize_address(&once, &r);
            prop_assert_eq!(once, twice);
        }
    }
}
