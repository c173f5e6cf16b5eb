use std::collections::{BTreeSet, HashMap};

use crate::models::{RankAggregate, RankMatrix, RankRecord, SpendMatrix, SpendRecord};
use crate::period;

/// The platform reports no organic rank deeper than this; larger values
/// in the export are artifacts and get clamped.
pub const ORGANIC_RANK_CEILING: f64 = 306.0;

/// How many trailing periods feed a keyword's average search volume.
const AVG_VOLUME_WINDOW: usize = 2;

/// Buckets rank records by bi-weekly period and pivots them into a
/// keyword × period matrix of mean organic rank, together with each
/// keyword's average search volume over the latest periods present.
pub fn aggregate_ranks(records: &[RankRecord]) -> anyhow::Result<RankAggregate> {
    let mut keywords: BTreeSet<String> = BTreeSet::new();
    let mut periods: BTreeSet<String> = BTreeSet::new();
    let mut rank_sums: HashMap<(String, String), (f64, u32)> = HashMap::new();
    let mut volume_sums: HashMap<(String, String), (f64, u32)> = HashMap::new();

    for record in records {
        let label = period::biweekly_label(record.date_added);
        keywords.insert(record.keyword.clone());
        periods.insert(label.clone());

        if let Some(rank) = record.organic_rank {
            let entry = rank_sums
                .entry((record.keyword.clone(), label.clone()))
                .or_insert((0.0, 0));
            entry.0 += rank.min(ORGANIC_RANK_CEILING);
            entry.1 += 1;
        }

        if let Some(volume) = record.search_volume {
            let entry = volume_sums
                .entry((record.keyword.clone(), label))
                .or_insert((0.0, 0));
            entry.0 += volume;
            entry.1 += 1;
        }
    }

    // Cells where every record had no rank stay absent: "no data" must
    // not collapse into a number.
    let cells: HashMap<(String, String), f64> = rank_sums
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect();

    let volume_cells: HashMap<(String, String), f64> = volume_sums
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect();

    let avg_search_volume = trailing_average_volume(&keywords, &periods, &volume_cells)?;

    Ok(RankAggregate {
        ranks: RankMatrix {
            keywords,
            periods,
            cells,
        },
        avg_search_volume,
    })
}

/// Mean search volume per keyword over the chronologically latest
/// periods in the rank data. With fewer than two periods the window
/// shrinks to whatever exists; a keyword with no volume in the window
/// averages 0.
fn trailing_average_volume(
    keywords: &BTreeSet<String>,
    periods: &BTreeSet<String>,
    volumes: &HashMap<(String, String), f64>,
) -> anyhow::Result<HashMap<String, f64>> {
    let ordered = period::sort_labels(periods.iter().cloned())?;
    let window = &ordered[ordered.len().saturating_sub(AVG_VOLUME_WINDOW)..];

    let mut averages = HashMap::new();
    for keyword in keywords {
        let values: Vec<f64> = window
            .iter()
            .filter_map(|label| volumes.get(&(keyword.clone(), label.clone())).copied())
            .collect();
        let average = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        averages.insert(keyword.clone(), average);
    }

    Ok(averages)
}

/// Buckets spend records by bi-weekly period and sums spend per
/// (search term, period).
pub fn aggregate_spend(records: &[SpendRecord]) -> SpendMatrix {
    let mut terms: BTreeSet<String> = BTreeSet::new();
    let mut periods: BTreeSet<String> = BTreeSet::new();
    let mut cells: HashMap<(String, String), f64> = HashMap::new();

    for record in records {
        let label = period::biweekly_label(record.date);
        terms.insert(record.search_term.clone());
        periods.insert(label.clone());
        *cells
            .entry((record.search_term.clone(), label))
            .or_insert(0.0) += record.spend;
    }

    SpendMatrix {
        terms,
        periods,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn rank_record(
        keyword: &str,
        volume: Option<f64>,
        rank: Option<f64>,
        day: NaiveDate,
    ) -> RankRecord {
        RankRecord {
            keyword: keyword.to_string(),
            search_volume: volume,
            organic_rank: rank,
            date_added: day,
        }
    }

    fn spend_record(term: &str, spend: f64, day: NaiveDate) -> SpendRecord {
        SpendRecord {
            search_term: term.to_string(),
            spend,
            date: day,
        }
    }

    #[test]
    fn rank_cells_average_present_values_only() {
        let records = vec![
            rank_record("widget", None, Some(10.0), date(2023, 9, 2)),
            rank_record("widget", None, Some(20.0), date(2023, 9, 14)),
            rank_record("widget", None, None, date(2023, 9, 9)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.ranks.rank("widget", "1-15 Sep 23"), Some(15.0));
    }

    #[test]
    fn all_no_data_cells_stay_absent() {
        let records = vec![rank_record("widget", None, None, date(2023, 9, 2))];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert!(aggregate.ranks.keywords.contains("widget"));
        assert!(aggregate.ranks.periods.contains("1-15 Sep 23"));
        assert_eq!(aggregate.ranks.rank("widget", "1-15 Sep 23"), None);
    }

    #[test]
    fn ranks_beyond_the_ceiling_are_clamped() {
        let records = vec![
            rank_record("widget", None, Some(400.0), date(2023, 9, 2)),
            rank_record("gadget", None, Some(400.0), date(2023, 9, 2)),
            rank_record("gadget", None, Some(300.0), date(2023, 9, 3)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.ranks.rank("widget", "1-15 Sep 23"), Some(306.0));
        assert_eq!(aggregate.ranks.rank("gadget", "1-15 Sep 23"), Some(303.0));
    }

    #[test]
    fn average_volume_uses_the_calendar_latest_periods() {
        // Lexically "1-15 Sep 23" and "16-30 Sep 23" sort after
        // "1-15 Oct 23"; the window must be the calendar-latest two.
        let records = vec![
            rank_record("widget", Some(500.0), None, date(2023, 9, 2)),
            rank_record("widget", Some(100.0), None, date(2023, 9, 20)),
            rank_record("widget", Some(200.0), None, date(2023, 10, 2)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.avg_search_volume["widget"], 150.0);
    }

    #[test]
    fn average_volume_skips_missing_window_cells() {
        let records = vec![
            rank_record("widget", Some(500.0), None, date(2023, 9, 2)),
            rank_record("widget", None, Some(12.0), date(2023, 9, 20)),
            rank_record("widget", Some(200.0), None, date(2023, 10, 2)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.avg_search_volume["widget"], 200.0);
    }

    #[test]
    fn keyword_with_no_window_volume_averages_zero() {
        let records = vec![
            rank_record("widget", Some(500.0), Some(3.0), date(2023, 8, 2)),
            rank_record("widget", None, Some(4.0), date(2023, 9, 20)),
            rank_record("widget", None, Some(5.0), date(2023, 10, 2)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.avg_search_volume["widget"], 0.0);
    }

    #[test]
    fn single_period_shrinks_the_window() {
        let records = vec![
            rank_record("widget", Some(120.0), Some(1.0), date(2023, 9, 2)),
            rank_record("gadget", None, Some(2.0), date(2023, 9, 3)),
        ];

        let aggregate = aggregate_ranks(&records).unwrap();
        assert_eq!(aggregate.avg_search_volume["widget"], 120.0);
        assert_eq!(aggregate.avg_search_volume["gadget"], 0.0);
    }

    #[test]
    fn empty_input_produces_an_empty_aggregate() {
        let aggregate = aggregate_ranks(&[]).unwrap();
        assert!(aggregate.ranks.keywords.is_empty());
        assert!(aggregate.ranks.periods.is_empty());
        assert!(aggregate.avg_search_volume.is_empty());
    }

    #[test]
    fn spend_sums_within_a_period() {
        let records = vec![
            spend_record("widget", 10.0, date(2023, 9, 2)),
            spend_record("widget", 2.5, date(2023, 9, 14)),
            spend_record("widget", 4.0, date(2023, 9, 20)),
        ];

        let matrix = aggregate_spend(&records);
        assert_eq!(matrix.spend("widget", "1-15 Sep 23"), 12.5);
        assert_eq!(matrix.spend("widget", "16-30 Sep 23"), 4.0);
    }

    #[test]
    fn absent_spend_cells_read_as_zero() {
        let matrix = aggregate_spend(&[spend_record("widget", 10.0, date(2023, 9, 2))]);
        assert_eq!(matrix.spend("widget", "1-15 Oct 23"), 0.0);
        assert_eq!(matrix.spend("gadget", "1-15 Sep 23"), 0.0);
    }
}
