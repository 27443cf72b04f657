use crate::model::{KpiSummary, MatchRecord};

/// Compute run KPIs from dataset sizes and the match set.
///
/// `revenue_sum` adds up CRM job values over the matches (0.0 when the CRM
/// file has no job-value column). `mailers_per_acquisition` is `None` when
/// nothing matched.
pub fn compute_kpis(total_mail: usize, total_crm: usize, matches: &[MatchRecord]) -> KpiSummary {
    let revenue: f64 = matches
        .iter()
        .filter_map(|m| m.crm.job_value.as_deref())
        .map(parse_job_value)
        .sum();

    let mailers_per_acquisition = if matches.is_empty() {
        None
    } else {
        Some(round2(total_mail as f64 / matches.len() as f64))
    };

    KpiSummary {
        total_mail,
        total_crm,
        matches: matches.len(),
        revenue_sum: round2(revenue),
        mailers_per_acquisition,
    }
}

/// Parse a job-value cell. Tolerates a leading `$` and `,` thousands
/// separators; anything else non-numeric counts as zero.
pub fn parse_job_value(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed),
    };
    let digits: String = rest
        .strip_prefix('$')
        .unwrap_or(rest)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if negative {
                -v
            } else {
                v
            }
        }
        _ => 0.0,
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrmRecord, Location, MailRecord};
    use crate::normalize::CanonicalKey;
    use proptest::prelude::*;

    fn key() -> CanonicalKey {
        CanonicalKey {
            zip: "78701".into(),
            city: "austin".into(),
            state: "tx".into(),
            address: "1 elm street".into(),
        }
    }

    fn location() -> Location {
        Location {
            address: "1 Elm St".into(),
            city: "Austin".into(),
            state: "TX".into(),
            zip: "78701".into(),
        }
    }

    fn matched(job_value: Option<&str>) -> MatchRecord {
        MatchRecord {
            mail: MailRecord {
                row: 0,
                location: location(),
                mailed_on: None,
                campaign: None,
                key: key(),
            },
            crm: CrmRecord {
                row: 0,
                first_name: None,
                last_name: None,
                location: location(),
                date_entered: None,
                job_value: job_value.map(|s| s.to_string()),
                key: key(),
            },
            key: key(),
            confidence: 95,
            match_notes: "note".into(),
        }
    }

    #[test]
    fn basic_kpis() {
        let matches = vec![matched(Some("1000")), matched(Some("250.50"))];
        let kpis = compute_kpis(10, 7, &matches);
        assert_eq!(kpis.total_mail, 10);
        assert_eq!(kpis.total_crm, 7);
        assert_eq!(kpis.matches, 2);
        assert_eq!(kpis.revenue_sum, 1250.5);
        assert_eq!(kpis.mailers_per_acquisition, Some(5.0));
    }

    #[test]
    fn no_matches_gives_null_ratio() {
        let kpis = compute_kpis(10, 7, &[]);
        assert_eq!(kpis.matches, 0);
        assert_eq!(kpis.revenue_sum, 0.0);
        assert_eq!(kpis.mailers_per_acquisition, None);
    }

    #[test]
    fn ratio_rounded_to_two_places() {
        let matches = vec![matched(None), matched(None), matched(None)];
        let kpis = compute_kpis(10, 3, &matches);
        assert_eq!(kpis.mailers_per_acquisition, Some(3.33));
    }

    #[test]
    fn unresolved_job_value_sums_to_zero() {
        let kpis = compute_kpis(1, 1, &[matched(None)]);
        assert_eq!(kpis.revenue_sum, 0.0);
    }

    #[test]
    fn non_numeric_job_values_count_as_zero() {
        let matches = vec![matched(Some("n/a")), matched(Some("")), matched(Some("300"))];
        let kpis = compute_kpis(3, 3, &matches);
        assert_eq!(kpis.revenue_sum, 300.0);
    }

    #[test]
    fn job_value_formats() {
        assert_eq!(parse_job_value("1200"), 1200.0);
        assert_eq!(parse_job_value(" $1,250.75 "), 1250.75);
        assert_eq!(parse_job_value("-$40"), -40.0);
        assert_eq!(parse_job_value("12abc"), 0.0);
        assert_eq!(parse_job_value("NaN"), 0.0);
        assert_eq!(parse_job_value("inf"), 0.0);
    }

    fn dollars(cents: u64, style: u8) -> String {
        let whole = cents / 100;
        let frac = cents % 100;
        match style {
            0 => format!("{whole}.{frac:02}"),
            1 => format!("${whole}.{frac:02}"),
            _ => {
                // Thousands separators: 1234567 -> "1,234,567".
                let digits = whole.to_string();
                let mut grouped = String::new();
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % 3 == 0 {
                        grouped.push(',');
                    }
                    grouped.push(c);
                }
                format!("${grouped}.{frac:02}")
            }
        }
    }

    proptest! {
        #[test]
        fn revenue_non_negative_for_non_negative_values(
            values in proptest::collection::vec((0u64..1_000_000_000, 0u8..3), 0..20),
        ) {
            let texts: Vec<String> = values.iter().map(|(c, s)| dollars(*c, *s)).collect();
            let matches: Vec<MatchRecord> = texts.iter().map(|t| matched(Some(t.as_str()))).collect();
            let kpis = compute_kpis(matches.len(), matches.len(), &matches);

            prop_assert!(kpis.revenue_sum >= 0.0);
            let expected: u64 = values.iter().map(|(c, _)| *c).sum();
            prop_assert!((kpis.revenue_sum - expected as f64 / 100.0).abs() < 0.01);
        }

        #[test]
        fn formatted_job_value_parses_to_amount(cents in 0u64..1_000_000_000, style in 0u8..3) {
            let parsed = parse_job_value(&dollars(cents, style));
            prop_assert!((parsed - cents as f64 / 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn kpis_serialize_null_ratio() {
        let json = serde_json::to_value(compute_kpis(4, 2, &[])).unwrap();
        assert!(json["mailers_per_acquisition"].is_null());
        assert_eq!(json["total_mail"], 4);
    }
}
