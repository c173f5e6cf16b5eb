use std::collections::BTreeSet;

use crate::models::{PeriodCell, RankAggregate, ReportRow, ReportTable, SpendMatrix};
use crate::period;

/// Merges the rank and spend matrices into the final table: keyword and
/// period sets are unioned, missing rank cells stay "no data" while
/// missing spend cells become 0, columns run in calendar order, and
/// rows are sorted by average search volume descending.
pub fn build_table(ranks: &RankAggregate, spend: &SpendMatrix) -> anyhow::Result<ReportTable> {
    let label_union: BTreeSet<String> = ranks
        .ranks
        .periods
        .union(&spend.periods)
        .cloned()
        .collect();
    let periods = period::sort_labels(label_union)?;

    // The keyword union iterates lexicographically; that is the
    // insertion order ties fall back to after the stable volume sort.
    let mut rows: Vec<ReportRow> = Vec::new();
    for keyword in ranks.ranks.keywords.union(&spend.terms) {
        let cells = periods
            .iter()
            .map(|label| PeriodCell {
                organic_rank: ranks.ranks.rank(keyword, label).map(round1),
                spend: round0(spend.spend(keyword, label)),
            })
            .collect();

        rows.push(ReportRow {
            keyword: keyword.clone(),
            avg_search_volume: ranks
                .avg_search_volume
                .get(keyword)
                .copied()
                .unwrap_or(0.0),
            cells,
        });
    }

    rows.sort_by(|a, b| {
        b.avg_search_volume
            .partial_cmp(&a.avg_search_volume)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Rounding is presentation only; it must not influence the sort.
    for row in &mut rows {
        row.avg_search_volume = round0(row.avg_search_volume);
    }

    Ok(ReportTable { periods, rows })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round0(value: f64) -> f64 {
    value.round()
}
