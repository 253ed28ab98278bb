//! Aggregation of the batches gathered in one run

use crate::types::ObservationBatch;

/// Concatenate batches and sort ascending by (Date, Rate).
///
/// No deduplication happens here; that is the store merger's job.
pub fn aggregate<I>(batches: I) -> ObservationBatch
where
    I: IntoIterator<Item = ObservationBatch>,
{
    let rows = batches.into_iter().flat_map(|b| b.into_rows()).collect();
    let mut combined = ObservationBatch::new(rows);
    combined.sort_by_date_rate();
    combined
}
