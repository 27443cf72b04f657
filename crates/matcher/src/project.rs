//! Flatten match records into the output table.
//!
//! Location columns always carry a `_mail` / `_crm` suffix. Passthrough
//! columns keep their source header unless the other dataset has a column
//! with the same name, in which case they are suffixed too. Fields that
//! never resolved produce no column at all.

use crate::model::{MatchRecord, ResultTable};
use crate::schema::{ColumnResolution, DatasetKind, Field};

const LOCATION_FIELDS: [Field; 4] = [Field::Address, Field::City, Field::State, Field::Zip];

/// Cell value for `field` on the `kind` side of a match.
fn cell(m: &MatchRecord, kind: DatasetKind, field: Field) -> Option<&str> {
    match (kind, field) {
        (DatasetKind::Mail, Field::Address) => Some(m.mail.location.address.as_str()),
        (DatasetKind::Mail, Field::City) => Some(m.mail.location.city.as_str()),
        (DatasetKind::Mail, Field::State) => Some(m.mail.location.state.as_str()),
        (DatasetKind::Mail, Field::Zip) => Some(m.mail.location.zip.as_str()),
        (DatasetKind::Mail, Field::MailedOn) => m.mail.mailed_on.as_deref(),
        (DatasetKind::Mail, Field::Campaign) => m.mail.campaign.as_deref(),

        (DatasetKind::Crm, Field::FirstName) => m.crm.first_name.as_deref(),
        (DatasetKind::Crm, Field::LastName) => m.crm.last_name.as_deref(),
        (DatasetKind::Crm, Field::Address) => Some(m.crm.location.address.as_str()),
        (DatasetKind::Crm, Field::City) => Some(m.crm.location.city.as_str()),
        (DatasetKind::Crm, Field::State) => Some(m.crm.location.state.as_str()),
        (DatasetKind::Crm, Field::Zip) => Some(m.crm.location.zip.as_str()),
        (DatasetKind::Crm, Field::DateEntered) => m.crm.date_entered.as_deref(),
        (DatasetKind::Crm, Field::JobValue) => m.crm.job_value.as_deref(),
        _ => None,
    }
}

/// Output column order for one side.
fn side_order(kind: DatasetKind) -> &'static [Field] {
    match kind {
        DatasetKind::Mail => &[
            Field::Address,
            Field::City,
            Field::State,
            Field::Zip,
            Field::MailedOn,
            Field::Campaign,
        ],
        DatasetKind::Crm => &[
            Field::FirstName,
            Field::LastName,
            Field::Address,
            Field::City,
            Field::State,
            Field::Zip,
            Field::DateEntered,
            Field::JobValue,
        ],
    }
}

fn output_header(header: &str, field: Field, kind: DatasetKind, other_headers: &[String]) -> String {
    if LOCATION_FIELDS.contains(&field) || other_headers.iter().any(|h| h == header) {
        format!("{header}{}", kind.suffix())
    } else {
        header.to_string()
    }
}

/// Build the result table from match records.
pub fn project(
    matches: &[MatchRecord],
    mail_res: &ColumnResolution,
    mail_headers: &[String],
    crm_res: &ColumnResolution,
    crm_headers: &[String],
) -> ResultTable {
    let mut headers = Vec::new();
    let mut columns: Vec<(DatasetKind, Field)> = Vec::new();

    let sides = [
        (DatasetKind::Mail, mail_res, crm_headers),
        (DatasetKind::Crm, crm_res, mail_headers),
    ];
    for (kind, res, other_headers) in sides {
        for &field in side_order(kind) {
            let Some(header) = res.header(field) else {
                continue;
            };
            headers.push(output_header(header, field, kind, other_headers));
            columns.push((kind, field));
        }
    }
    headers.push("confidence".into());
    headers.push("match_notes".into());

    let rows = matches
        .iter()
        .map(|m| {
            let mut row: Vec<String> = columns
                .iter()
                .map(|&(kind, field)| cell(m, kind, field).unwrap_or("").to_string())
                .collect();
            row.push(m.confidence.to_string());
            row.push(m.match_notes.clone());
            row
        })
        .collect();

    ResultTable { headers, rows }
}
