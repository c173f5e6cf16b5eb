use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{RankRecord, SpendRecord};

/// Accepted forms for dates in either export. Anything else fails the
/// run; a date we cannot place in a period would silently corrupt the
/// bucketing. The two-digit-year form must precede the four-digit one:
/// %Y also matches two digits and would read "23" as the year 23.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%b %d, %Y"];

pub fn load_rank_records(path: &Path) -> anyhow::Result<Vec<RankRecord>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open rank export {}", path.display()))?;
    rank_records_from_reader(reader)
        .with_context(|| format!("failed to read rank export {}", path.display()))
}

pub fn load_spend_records(path: &Path) -> anyhow::Result<Vec<SpendRecord>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open spend export {}", path.display()))?;
    spend_records_from_reader(reader)
        .with_context(|| format!("failed to read spend export {}", path.display()))
}

fn rank_records_from_reader<R: Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<RankRecord>> {
    #[derive(serde::Deserialize)]
    struct Row {
        #[serde(rename = "Keyword")]
        keyword: String,
        #[serde(rename = "Search Volume", default)]
        search_volume: String,
        #[serde(rename = "Organic Rank", default)]
        organic_rank: String,
        #[serde(rename = "Date Added")]
        date_added: String,
    }

    let mut records = Vec::new();

    // Row numbers are 1-based and the header occupies row 1.
    for (index, result) in reader.deserialize::<Row>().enumerate() {
        let row = result.with_context(|| format!("invalid record at row {}", index + 2))?;
        let keyword = row.keyword.trim().to_string();
        if keyword.is_empty() {
            continue;
        }

        let date_added = parse_date(&row.date_added)
            .with_context(|| format!("bad Date Added at row {}", index + 2))?;

        records.push(RankRecord {
            keyword,
            search_volume: coerce_numeric(&row.search_volume),
            organic_rank: coerce_numeric(&row.organic_rank),
            date_added,
        });
    }

    Ok(records)
}

fn spend_records_from_reader<R: Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<SpendRecord>> {
    #[derive(serde::Deserialize)]
    struct Row {
        #[serde(rename = "Customer Search Term")]
        search_term: String,
        #[serde(rename = "Spend", default)]
        spend: String,
        #[serde(rename = "Date")]
        date: String,
    }

    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<Row>().enumerate() {
        let row = result.with_context(|| format!("invalid record at row {}", index + 2))?;
        let search_term = row.search_term.trim().to_string();
        if search_term.is_empty() {
            continue;
        }

        let date = parse_date(&row.date)
            .with_context(|| format!("bad Date at row {}", index + 2))?;

        records.push(SpendRecord {
            search_term,
            // An empty or unreadable spend cell is zero spend, not a
            // missing measurement.
            spend: coerce_numeric(&row.spend).unwrap_or(0.0),
            date,
        });
    }

    Ok(records)
}

/// Best-effort numeric coercion for export cells. The rank export pads
/// missing values with "-" and marks off-the-chart ranks as ">306";
/// both come back as `None` rather than aborting the run.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    // Some exports carry a midnight timestamp on every date.
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime.date());
    }
    bail!("unrecognized date value {trimmed:?}");
}
