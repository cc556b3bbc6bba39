//! Within-run deduplication of discovered businesses.
//!
//! Overlapping queries routinely surface the same business several times,
//! sometimes under distinct directory ids. The identity key is therefore
//! `lowercase(name) + "_" + primary phone` (with a `no_phone` sentinel), not
//! the directory's own id: duplicate listings of one business frequently
//! carry different ids, and the name+phone key collapses them. First
//! occurrence wins, so the result is deterministic in input order.

use std::collections::HashSet;

use leadgen_core::record::BusinessRecord;

const NO_PHONE_SENTINEL: &str = "no_phone";

/// The deterministic string deciding whether two records are the same
/// business.
#[must_use]
pub fn identity_key(record: &BusinessRecord) -> String {
    let phone = record.primary_phone().unwrap_or(NO_PHONE_SENTINEL);
    format!("{}_{}", record.name, phone).to_lowercase()
}

/// Drops later duplicates, keeping the first occurrence of each identity
/// key. Pure function, no I/O; idempotent.
#[must_use]
pub fn dedupe(records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut unique: Vec<BusinessRecord> = Vec::with_capacity(records.len());

    for record in records {
        if seen.insert(identity_key(&record)) {
            unique.push(record);
        }
    }

    unique
}
