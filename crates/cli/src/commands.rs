//! `mailtrace run`, `inspect` and `validate`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use mailtrace_matcher::engine::{load_csv_dataset, run, write_table_csv, Matcher};
use mailtrace_matcher::schema::resolve_column;
use mailtrace_matcher::{Dataset, DatasetKind, KpiSummary, MatchError, MatcherConfig};

use crate::exit_codes::{EXIT_NO_MATCH, EXIT_PARSE, EXIT_SCHEMA_MISSING, EXIT_USAGE};
use crate::CliError;

pub struct RunArgs {
    pub mail: PathBuf,
    pub crm: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub kpis: Option<PathBuf>,
    pub fail_on_no_match: bool,
}

fn load_config(path: Option<&Path>) -> Result<MatcherConfig, CliError> {
    let Some(path) = path else {
        return Ok(MatcherConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    let config = MatcherConfig::from_toml(&text)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

fn load_dataset(path: &Path) -> Result<Dataset, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            CliError::new(EXIT_PARSE, format!("{}: not valid UTF-8", path.display()))
                .with_hint("re-export the file as UTF-8 CSV")
        } else {
            CliError::io(format!("cannot read {}: {e}", path.display()))
        }
    })?;
    load_csv_dataset(&text).map_err(|e| {
        let err: CliError = e.into();
        CliError { message: format!("{}: {}", path.display(), err.message), ..err }
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Refuse output paths that would overwrite one of the inputs.
fn check_outputs(args: &RunArgs) -> Result<(), CliError> {
    for (flag, out) in [("--output", &args.output), ("--kpis", &args.kpis)] {
        let Some(out) = out else { continue };
        if same_file(out, &args.mail) || same_file(out, &args.crm) {
            return Err(CliError::new(
                EXIT_USAGE,
                format!("{flag} {} would overwrite an input file", out.display()),
            )
            .with_hint("write results to a different path"));
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    check_outputs(&args)?;
    let config = load_config(args.config.as_deref())?;
    let matcher = Matcher::from_config(&config)?;

    let mail = load_dataset(&args.mail)?;
    let crm = load_dataset(&args.crm)?;
    log::info!(
        "loaded {} mail rows from {} and {} CRM rows from {}",
        mail.len(),
        args.mail.display(),
        crm.len(),
        args.crm.display(),
    );

    let outcome = run(&matcher, &mail, &crm)?;

    if let Some(ref path) = args.output {
        let file = std::fs::File::create(path)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        write_table_csv(&outcome.table, file)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = args.kpis {
        write_file(path, &to_json(&outcome.kpis)?)?;
    }

    if args.json {
        println!("{}", to_json(&outcome)?);
    }

    eprintln!("{}", kpi_summary_line(&outcome.kpis));

    if args.fail_on_no_match && outcome.kpis.matches == 0 {
        return Err(CliError::new(EXIT_NO_MATCH, "no matches found"));
    }

    Ok(())
}

fn kpi_summary_line(k: &KpiSummary) -> String {
    let mpa = match k.mailers_per_acquisition {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    };
    format!(
        "{} matches from {} mailers and {} CRM rows; revenue {:.2}; mailers per acquisition {}",
        k.matches, k.total_mail, k.total_crm, k.revenue_sum, mpa,
    )
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct InspectReport {
    kind: DatasetKind,
    rows: usize,
    fields: Vec<FieldReport>,
}

#[derive(Serialize)]
struct FieldReport {
    field: String,
    required: bool,
    column: Option<String>,
    aliases: Vec<String>,
}

pub fn cmd_inspect(
    file: PathBuf,
    kind: DatasetKind,
    config: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let matcher = Matcher::from_config(&config)?;
    let data = load_dataset(&file)?;

    // Report every field instead of stopping at the first missing one.
    let mut fields = Vec::new();
    let mut missing = Vec::new();
    for sf in matcher.fields(kind) {
        let column = match resolve_column(&data.headers, sf) {
            Ok(col) => col.map(|c| c.header),
            Err(MatchError::SchemaFieldMissing { field, .. }) => {
                missing.push(field);
                None
            }
            Err(e) => return Err(e.into()),
        };
        fields.push(FieldReport {
            field: sf.field.name().to_string(),
            required: sf.required,
            column,
            aliases: sf.aliases.clone(),
        });
    }

    let report = InspectReport { kind, rows: data.len(), fields };

    if json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{} ({} rows)", file.display(), report.rows);
        for f in &report.fields {
            let column = f.column.as_deref().unwrap_or("(not found)");
            let marker = if f.required { "*" } else { " " };
            println!("  {marker} {:<13} {column}", f.field);
        }
    }

    if !missing.is_empty() {
        return Err(CliError::new(
            EXIT_SCHEMA_MISSING,
            format!("missing required column(s): {}", missing.join(", ")),
        )
        .with_hint("use --json to see the aliases tried for each field"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(config_path.as_path()))?;
    Matcher::from_config(&config)?;

    let extra_aliases: usize = config
        .aliases
        .mail
        .values()
        .chain(config.aliases.crm.values())
        .map(|v| v.len())
        .sum();
    eprintln!(
        "valid: confidence {}, {} unit marker(s), {} street suffix(es), {} extra alias(es)",
        config.confidence,
        config.normalize.unit_markers.len(),
        config.street_suffixes().len(),
        extra_aliases,
    );
    Ok(())
}
