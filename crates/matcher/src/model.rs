use serde::Serialize;

use crate::normalize::{CanonicalKey, NormalizeRules};
use crate::schema::{ColumnResolution, Field};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One tabular input: headers in source order plus rows of cells.
/// Rows shorter than the header list read as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// The four raw location cells of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Location {
    fn read(data: &Dataset, row: usize, res: &ColumnResolution) -> Self {
        Self {
            address: read_field(data, row, res, Field::Address).unwrap_or_default(),
            city: read_field(data, row, res, Field::City).unwrap_or_default(),
            state: read_field(data, row, res, Field::State).unwrap_or_default(),
            zip: read_field(data, row, res, Field::Zip).unwrap_or_default(),
        }
    }

    pub fn key(&self, rules: &NormalizeRules) -> CanonicalKey {
        CanonicalKey::build(&self.address, &self.city, &self.state, &self.zip, rules)
    }
}

/// `None` when the field was never resolved, `Some("")` for an empty cell.
fn read_field(data: &Dataset, row: usize, res: &ColumnResolution, field: Field) -> Option<String> {
    res.index(field).map(|i| data.cell(row, i).to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailRecord {
    /// Zero-based row index in the mail dataset.
    pub row: usize,
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailed_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip)]
    pub key: CanonicalKey,
}

impl MailRecord {
    pub fn read(data: &Dataset, row: usize, res: &ColumnResolution, rules: &NormalizeRules) -> Self {
        let location = Location::read(data, row, res);
        let key = location.key(rules);
        Self {
            row,
            location,
            mailed_on: read_field(data, row, res, Field::MailedOn),
            campaign: read_field(data, row, res, Field::Campaign),
            key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrmRecord {
    /// Zero-based row index in the CRM dataset.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_entered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_value: Option<String>,
    #[serde(skip)]
    pub key: CanonicalKey,
}

impl CrmRecord {
    pub fn read(data: &Dataset, row: usize, res: &ColumnResolution, rules: &NormalizeRules) -> Self {
        let location = Location::read(data, row, res);
        let key = location.key(rules);
        Self {
            row,
            first_name: read_field(data, row, res, Field::FirstName),
            last_name: read_field(data, row, res, Field::LastName),
            location,
            date_entered: read_field(data, row, res, Field::DateEntered),
            job_value: read_field(data, row, res, Field::JobValue),
            key,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// One mail row joined with one CRM row on the same canonical key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub mail: MailRecord,
    pub crm: CrmRecord,
    pub key: CanonicalKey,
    pub confidence: u8,
    pub match_notes: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_mail: usize,
    pub total_crm: usize,
    pub matches: usize,
    pub revenue_sum: f64,
    /// `None` (JSON `null`) when there are no matches.
    pub mailers_per_acquisition: Option<f64>,
}

/// Flat table ready for CSV serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub mail_columns: ColumnResolution,
    pub crm_columns: ColumnResolution,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub meta: RunMeta,
    pub kpis: KpiSummary,
    pub matches: Vec<MatchRecord>,
    #[serde(skip)]
    pub table: ResultTable,
}
