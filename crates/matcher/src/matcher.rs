use std::collections::HashMap;

use crate::normalize::CanonicalKey;
use crate::model::{CrmRecord, MailRecord, MatchRecord};

/// Inner-join two key lists. Returns `(left_index, right_index)` for every
/// pair with equal keys, the full cross-product within a key, ordered by
/// left index then right index.
pub fn join_keys(left: &[CanonicalKey], right: &[CanonicalKey]) -> Vec<(usize, usize)> {
    let mut buckets: HashMap<&CanonicalKey, Vec<usize>> = HashMap::new();
    for (ri, key) in right.iter().enumerate() {
        buckets.entry(key).or_default().push(ri);
    }

    let mut pairs = Vec::new();
    for (li, key) in left.iter().enumerate() {
        if let Some(bucket) = buckets.get(key) {
            pairs.extend(bucket.iter().map(|&ri| (li, ri)));
        }
    }
    pairs
}

/// Join mail and CRM records on their canonical keys.
pub fn match_exact_key(
    mail: &[MailRecord],
    crm: &[CrmRecord],
    confidence: u8,
    match_notes: &str,
) -> Vec<MatchRecord> {
    let mail_keys: Vec<CanonicalKey> = mail.iter().map(|r| r.key.clone()).collect();
    let crm_keys: Vec<CanonicalKey> = crm.iter().map(|r| r.key.clone()).collect();

    join_keys(&mail_keys, &crm_keys)
        .into_iter()
        .map(|(mi, ci)| MatchRecord {
            mail: mail[mi].clone(),
            crm: crm[ci].clone(),
            key: mail[mi].key.clone(),
            confidence,
            match_notes: match_notes.to_string(),
        })
        .collect()
}
