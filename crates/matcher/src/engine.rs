use std::io::Write;

use crate::config::MatcherConfig;
use crate::error::MatchError;
use crate::kpi::compute_kpis;
use crate::matcher::match_exact_key;
use crate::model::{CrmRecord, Dataset, MailRecord, MatchOutcome, ResultTable, RunMeta};
use crate::normalize::NormalizeRules;
use crate::project::project;
use crate::schema::{resolve_dataset, ColumnResolution, DatasetKind, SemanticField};

/// A validated config with its tables compiled, ready to run.
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: NormalizeRules,
    mail_fields: Vec<SemanticField>,
    crm_fields: Vec<SemanticField>,
    confidence: u8,
    match_notes: String,
}

impl Matcher {
    pub fn from_config(config: &MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            rules: config.rules()?,
            mail_fields: config.fields(DatasetKind::Mail),
            crm_fields: config.fields(DatasetKind::Crm),
            confidence: config.confidence,
            match_notes: config.match_notes.clone(),
        })
    }

    pub fn fields(&self, kind: DatasetKind) -> &[SemanticField] {
        match kind {
            DatasetKind::Mail => &self.mail_fields,
            DatasetKind::Crm => &self.crm_fields,
        }
    }

    pub fn rules(&self) -> &NormalizeRules {
        &self.rules
    }

    /// Schema resolution only, for diagnosing a file's headers.
    pub fn resolve(&self, kind: DatasetKind, headers: &[String]) -> Result<ColumnResolution, MatchError> {
        resolve_dataset(kind, headers, self.fields(kind))
    }
}

/// Match a mail dataset against a CRM dataset.
///
/// Both schemas are resolved before any row is touched; a missing required
/// column on either side aborts the run with `SchemaFieldMissing`.
pub fn run(matcher: &Matcher, mail: &Dataset, crm: &Dataset) -> Result<MatchOutcome, MatchError> {
    let mail_res = matcher.resolve(DatasetKind::Mail, &mail.headers)?;
    let crm_res = matcher.resolve(DatasetKind::Crm, &crm.headers)?;

    let rules = matcher.rules();
    let mail_rows: Vec<MailRecord> = (0..mail.len())
        .map(|i| MailRecord::read(mail, i, &mail_res, rules))
        .collect();
    let crm_rows: Vec<CrmRecord> = (0..crm.len())
        .map(|i| CrmRecord::read(crm, i, &crm_res, rules))
        .collect();
    log::info!("built keys for {} mail rows and {} CRM rows", mail_rows.len(), crm_rows.len());

    let blank_mail = mail_rows.iter().filter(|r| r.key.is_blank()).count();
    let blank_crm = crm_rows.iter().filter(|r| r.key.is_blank()).count();
    if blank_mail > 0 || blank_crm > 0 {
        log::warn!("{blank_mail} mail and {blank_crm} CRM rows have no location data");
    }

    let matches = match_exact_key(&mail_rows, &crm_rows, matcher.confidence, &matcher.match_notes);
    log::info!("{} matched pairs", matches.len());

    let table = project(&matches, &mail_res, &mail.headers, &crm_res, &crm.headers);
    let kpis = compute_kpis(mail.len(), crm.len(), &matches);
    log::debug!("kpis: {kpis:?}");

    Ok(MatchOutcome {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            mail_columns: mail_res,
            crm_columns: crm_res,
        },
        kpis,
        matches,
        table,
    })
}

/// Load CSV text into a dataset. Every cell is kept as text; ragged rows
/// are accepted and read as empty where short.
pub fn load_csv_dataset(csv_data: &str) -> Result<Dataset, MatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    log::debug!("loaded {} rows with {} columns", rows.len(), headers.len());
    Ok(Dataset::new(headers, rows))
}

/// Write a result table as CSV.
pub fn write_table_csv<W: Write>(table: &ResultTable, writer: W) -> Result<(), MatchError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(&table.headers)?;
    for row in &table.rows {
        w.write_record(row)?;
    }
    w.flush().map_err(|e| MatchError::Csv(e.to_string()))?;
    Ok(())
}
