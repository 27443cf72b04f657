//! Schema resolution: map semantic fields onto whatever headers a dataset uses.
//!
//! Headers and aliases are compared after lower-casing and dropping every
//! character that is not an ASCII letter or digit, so `"Zip Code"`,
//! `"zip-code"` and `"ZIP_CODE"` all compare as `"zipcode"`. Headers are
//! scanned in their original order and the first hit wins.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Dataset kinds + fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Mail,
    Crm,
}

impl DatasetKind {
    /// Prefix used in friendly field names ("Mail CSV address").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mail => "Mail CSV",
            Self::Crm => "CRM CSV",
        }
    }

    /// Suffix attached to overlapping output columns.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Mail => "_mail",
            Self::Crm => "_crm",
        }
    }

    /// Fields this dataset can carry, required ones first.
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Self::Mail => &[
                Field::Address,
                Field::City,
                Field::State,
                Field::Zip,
                Field::MailedOn,
                Field::Campaign,
            ],
            Self::Crm => &[
                Field::Address,
                Field::City,
                Field::State,
                Field::Zip,
                Field::FirstName,
                Field::LastName,
                Field::DateEntered,
                Field::JobValue,
            ],
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mail => write!(f, "mail"),
            Self::Crm => write!(f, "crm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Address,
    City,
    State,
    Zip,
    MailedOn,
    Campaign,
    FirstName,
    LastName,
    DateEntered,
    JobValue,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::MailedOn => "mailed_on",
            Self::Campaign => "campaign",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::DateEntered => "date_entered",
            Self::JobValue => "job_value",
        }
    }

    /// Look up a field by its config name (`"job_value"`, `"zip"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_FIELDS.iter().copied().find(|f| f.name() == name)
    }

    /// The four location fields are required on both datasets.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Address | Self::City | Self::State | Self::Zip)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const ALL_FIELDS: [Field; 10] = [
    Field::Address,
    Field::City,
    Field::State,
    Field::Zip,
    Field::MailedOn,
    Field::Campaign,
    Field::FirstName,
    Field::LastName,
    Field::DateEntered,
    Field::JobValue,
];

// ---------------------------------------------------------------------------
// Built-in alias tables
// ---------------------------------------------------------------------------

const ZIP_ALIASES: &[&str] = &["zip", "zipcode", "zip_code", "postal", "postalcode"];

/// Aliases shipped with the engine for `field` on a `kind` dataset.
/// Empty when the field does not belong to that dataset.
pub fn builtin_aliases(kind: DatasetKind, field: Field) -> &'static [&'static str] {
    match (kind, field) {
        (DatasetKind::Mail, Field::Address) => &[
            "address",
            "streetaddress",
            "propertyaddress",
            "mailingaddress",
            "addr",
            "address1",
            "street",
        ],
        (DatasetKind::Mail, Field::City) => &["city", "mailcity", "propertycity"],
        (DatasetKind::Mail, Field::State) => &["state", "st", "mailstate", "propertystate"],
        (DatasetKind::Mail, Field::MailedOn) => &["mailed_on", "maileddate", "sentdate", "date"],
        (DatasetKind::Mail, Field::Campaign) => &["campaign_id", "campaign", "campaignname"],

        (DatasetKind::Crm, Field::Address) => &[
            "address",
            "streetaddress",
            "propertyaddress",
            "addr",
            "address1",
            "street",
        ],
        (DatasetKind::Crm, Field::City) => &["city"],
        (DatasetKind::Crm, Field::State) => &["state", "st"],
        (DatasetKind::Crm, Field::FirstName) => &["first_name", "firstname", "first"],
        (DatasetKind::Crm, Field::LastName) => &["last_name", "lastname", "last"],
        (DatasetKind::Crm, Field::DateEntered) => {
            &["date_entered", "datecreated", "created", "lead_date", "open_date"]
        }
        (DatasetKind::Crm, Field::JobValue) => {
            &["job_value", "revenue", "amount", "value", "jobamount"]
        }

        (_, Field::Zip) => ZIP_ALIASES,
        _ => &[],
    }
}

// ---------------------------------------------------------------------------
// Semantic field definitions
// ---------------------------------------------------------------------------

/// A role a dataset column must fill, with the header spellings accepted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticField {
    pub field: Field,
    pub friendly: String,
    pub aliases: Vec<String>,
    pub required: bool,
}

impl SemanticField {
    pub fn new(kind: DatasetKind, field: Field, aliases: Vec<String>) -> Self {
        Self {
            field,
            friendly: format!("{} {}", kind.label(), field.name()),
            aliases,
            required: field.is_required(),
        }
    }
}

/// Built-in definitions for every field of `kind`, with `extra` aliases
/// appended per field name.
pub fn semantic_fields(
    kind: DatasetKind,
    extra: &BTreeMap<String, Vec<String>>,
) -> Vec<SemanticField> {
    kind.fields()
        .iter()
        .map(|&field| {
            let mut aliases: Vec<String> = builtin_aliases(kind, field)
                .iter()
                .map(|a| a.to_string())
                .collect();
            if let Some(more) = extra.get(field.name()) {
                for alias in more {
                    if !aliases.contains(alias) {
                        aliases.push(alias.clone());
                    }
                }
            }
            SemanticField::new(kind, field, aliases)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Lower-case and keep only ASCII letters and digits.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// An actual dataset column chosen for a semantic field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Find the first header (in original order) whose normalized form is one
/// of the field's normalized aliases.
///
/// Returns `Ok(None)` for an absent optional field and
/// `SchemaFieldMissing` for an absent required one.
pub fn resolve_column(
    headers: &[String],
    field: &SemanticField,
) -> Result<Option<ResolvedColumn>, MatchError> {
    let wanted: HashSet<String> = field.aliases.iter().map(|a| normalize_header(a)).collect();

    let hit = headers
        .iter()
        .enumerate()
        .find(|(_, h)| wanted.contains(&normalize_header(h)))
        .map(|(index, h)| ResolvedColumn {
            index,
            header: h.clone(),
        });

    match hit {
        Some(col) => Ok(Some(col)),
        None if field.required => Err(MatchError::SchemaFieldMissing {
            field: field.friendly.clone(),
            aliases: field.aliases.clone(),
        }),
        None => Ok(None),
    }
}

/// Every semantic field of one dataset mapped to its column (or absence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnResolution {
    pub kind: DatasetKind,
    pub columns: BTreeMap<Field, Option<ResolvedColumn>>,
}

impl ColumnResolution {
    pub fn get(&self, field: Field) -> Option<&ResolvedColumn> {
        self.columns.get(&field).and_then(|c| c.as_ref())
    }

    pub fn header(&self, field: Field) -> Option<&str> {
        self.get(field).map(|c| c.header.as_str())
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.get(field).map(|c| c.index)
    }
}

/// Resolve all fields of a dataset. Fails on the first required field
/// (in definition order) that has no column.
pub fn resolve_dataset(
    kind: DatasetKind,
    headers: &[String],
    fields: &[SemanticField],
) -> Result<ColumnResolution, MatchError> {
    let mut columns = BTreeMap::new();
    for field in fields {
        let col = resolve_column(headers, field)?;
        match &col {
            Some(c) => log::debug!("{}: resolved to column '{}'", field.friendly, c.header),
            None => log::debug!("{}: not present, skipping", field.friendly),
        }
        columns.insert(field.field, col);
    }
    Ok(ColumnResolution { kind, columns })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
