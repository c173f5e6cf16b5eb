use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};

/// A bi-weekly period decomposed into its calendar parts. Ordering is
/// by (year, month, start), so "16-30 Sep 23" sorts before
/// "1-15 Oct 23" even though the labels compare the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
    pub start: u32,
}

/// Assigns a date to its bi-weekly bucket label, e.g. "1-15 Jan 24" or
/// "16-31 Jan 24". Days 1-15 fall in the first half; the second half
/// runs to the actual end of the month.
pub fn biweekly_label(date: NaiveDate) -> String {
    if date.day() <= 15 {
        format!("1-15 {}", date.format("%b %y"))
    } else {
        format!(
            "16-{} {}",
            last_day_of_month(date.year(), date.month()),
            date.format("%b %y")
        )
    }
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        _ => 28,
    }
}

/// Parses a period label back into its calendar parts. Labels are
/// generated internally, so a failure here is a pipeline defect, not
/// bad user input. Only the start-of-range day is read; the end of the
/// range is ignored so minor artifacts in it cannot break sorting.
pub fn parse_label(label: &str) -> anyhow::Result<PeriodKey> {
    let mut parts = label.split_whitespace();
    let (Some(range), Some(month), Some(year)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("malformed period label {label:?}");
    };

    let start: u32 = range
        .split('-')
        .next()
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("bad day range in period label {label:?}"))?;
    if start != 1 && start != 16 {
        bail!("period label {label:?} must start on day 1 or 16");
    }

    let anchor = NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %b %y")
        .with_context(|| format!("bad month/year in period label {label:?}"))?;

    Ok(PeriodKey {
        year: anchor.year(),
        month: anchor.month(),
        start,
    })
}

/// Sorts period labels into true calendar order. Any unparseable label
/// aborts the run.
pub fn sort_labels<I>(labels: I) -> anyhow::Result<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut keyed: Vec<(PeriodKey, String)> = labels
        .into_iter()
        .map(|label| parse_label(&label).map(|key| (key, label)))
        .collect::<anyhow::Result<_>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, label)| label).collect())
}
