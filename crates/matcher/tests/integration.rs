use std::path::PathBuf;

use mailtrace_matcher::engine::{load_csv_dataset, run, write_table_csv, Matcher};
use mailtrace_matcher::{Dataset, MatchError, MatchOutcome, MatcherConfig};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> Dataset {
    let path = fixtures_dir().join(name);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    load_csv_dataset(&data).unwrap()
}

fn default_matcher() -> Matcher {
    Matcher::from_config(&MatcherConfig::default()).unwrap()
}

fn run_fixtures(mail: &str, crm: &str) -> Result<MatchOutcome, MatchError> {
    run(&default_matcher(), &load(mail), &load(crm))
}

// -------------------------------------------------------------------------
// Full runs
// -------------------------------------------------------------------------

#[test]
fn fixture_run_kpis() {
    let outcome = run_fixtures("mail.csv", "crm.csv").unwrap();

    assert_eq!(outcome.kpis.total_mail, 5);
    assert_eq!(outcome.kpis.total_crm, 4);
    assert_eq!(outcome.kpis.matches, 4);
    // $1,200.00 twice (two mailers to the same house) + 800 + "n/a" as zero.
    assert_eq!(outcome.kpis.revenue_sum, 3200.0);
    assert_eq!(outcome.kpis.mailers_per_acquisition, Some(1.25));
}

#[test]
fn fixture_run_pairs_in_mail_order() {
    let outcome = run_fixtures("mail.csv", "crm.csv").unwrap();
    let pairs: Vec<(usize, usize)> = outcome
        .matches
        .iter()
        .map(|m| (m.mail.row, m.crm.row))
        .collect();
    assert_eq!(pairs, vec![(0, 0), (1, 0), (2, 1), (4, 3)]);

    for m in &outcome.matches {
        assert_eq!(m.confidence, 95);
        assert_eq!(m.match_notes, "exact-normalized (addr+city+state+zip)");
    }
}

#[test]
fn fixture_run_table_layout() {
    let outcome = run_fixtures("mail.csv", "crm.csv").unwrap();
    assert_eq!(
        outcome.table.headers,
        vec![
            "Street Address_mail",
            "City_mail",
            "State_mail",
            "Zip Code_mail",
            "Mailed On",
            "Campaign ID",
            "First Name",
            "Last Name",
            "PropertyAddress_crm",
            "city_crm",
            "st_crm",
            "zipcode_crm",
            "Date Entered",
            "Job Value",
            "confidence",
            "match_notes",
        ]
    );
    assert_eq!(outcome.table.rows.len(), 4);
    assert_eq!(outcome.table.rows[1][5], "APRIL24");
    assert_eq!(outcome.table.rows[1][6], "Ann");
    assert_eq!(outcome.table.rows[1][13], "$1,200.00");
}

#[test]
fn resolved_columns_reported_in_meta() {
    use mailtrace_matcher::schema::Field;

    let outcome = run_fixtures("mail.csv", "crm.csv").unwrap();
    assert_eq!(outcome.meta.mail_columns.header(Field::Address), Some("Street Address"));
    assert_eq!(outcome.meta.crm_columns.header(Field::Address), Some("PropertyAddress"));
    assert_eq!(outcome.meta.crm_columns.header(Field::JobValue), Some("Job Value"));
}

#[test]
fn crm_without_zip_aborts_run() {
    let err = run_fixtures("mail.csv", "crm-no-zip.csv").unwrap_err();
    match err {
        MatchError::SchemaFieldMissing { field, aliases } => {
            assert_eq!(field, "CRM CSV zip");
            assert!(aliases.contains(&"zipcode".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn crm_without_job_value_has_zero_revenue() {
    let outcome = run_fixtures("mail.csv", "crm-no-revenue.csv").unwrap();
    assert_eq!(outcome.kpis.matches, 2);
    assert_eq!(outcome.kpis.revenue_sum, 0.0);
    assert!(!outcome.table.headers.iter().any(|h| h.contains("Job")));
}

#[test]
fn no_matches_yields_null_ratio() {
    let outcome = run_fixtures("mail.csv", "crm-invoice.csv").unwrap();
    assert_eq!(outcome.kpis.matches, 0);
    assert_eq!(outcome.kpis.mailers_per_acquisition, None);

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["kpis"]["mailers_per_acquisition"].is_null());
    assert!(json.get("table").is_none());
}

#[test]
fn config_file_extends_markers_and_aliases() {
    let toml = std::fs::read_to_string(fixtures_dir().join("custom.matcher.toml")).unwrap();
    let config = MatcherConfig::from_toml(&toml).unwrap();
    let matcher = Matcher::from_config(&config).unwrap();

    let outcome = run(&matcher, &load("mail.csv"), &load("crm-invoice.csv")).unwrap();
    assert_eq!(outcome.kpis.matches, 1);
    assert_eq!(outcome.kpis.revenue_sum, 450.25);
    assert_eq!(outcome.matches[0].confidence, 90);
    assert_eq!(outcome.matches[0].mail.row, 3);
}

#[test]
fn swapping_inputs_keeps_pairing() {
    // Both files use headers every alias table accepts.
    let a = load_csv_dataset("address,city,state,zip\n1 A St,X,Y,11111\n1 A St,X,Y,11111\n2 B Rd,X,Y,11111\n").unwrap();
    let b = load_csv_dataset("address,city,state,zip\n1 A Street,x,y,11111-0000\n2 B Road,X,Y,11111\n3 C Ln,X,Y,1\n").unwrap();

    let forward = run(&default_matcher(), &a, &b).unwrap();
    let backward = run(&default_matcher(), &b, &a).unwrap();

    let mut fwd: Vec<(usize, usize)> = forward.matches.iter().map(|m| (m.mail.row, m.crm.row)).collect();
    let mut bwd: Vec<(usize, usize)> = backward.matches.iter().map(|m| (m.crm.row, m.mail.row)).collect();
    fwd.sort();
    bwd.sort();
    assert_eq!(fwd, bwd);
    assert_eq!(fwd, vec![(0, 0), (1, 0), (2, 1)]);
}

#[test]
fn result_csv_written() {
    let outcome = run_fixtures("mail.csv", "crm.csv").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let file = std::fs::File::create(&path).unwrap();
    write_table_csv(&outcome.table, file).unwrap();

    let written = load_csv_dataset(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.headers, outcome.table.headers);
    assert_eq!(written.rows, outcome.table.rows);
}
