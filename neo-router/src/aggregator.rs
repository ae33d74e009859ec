use crate::types::AsteroidRecord;

/// Merges per-window results into the final response.
///
/// `per_range` must be in window order. Records are concatenated in that
/// order and then stably sorted by name, so records with equal names keep
/// their window order. Duplicates across windows are kept.
pub fn aggregate(per_range: Vec<Vec<AsteroidRecord>>) -> Vec<AsteroidRecord> {
    let mut records: Vec<AsteroidRecord> = per_range.into_iter().flatten().collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}
