use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::models::{ReportRow, ReportTable};

pub const KEYWORD_COLUMN: &str = "Keyword";

/// The serialized form of the finished table: explicit ordered column
/// and row lists, plus the keyword → average search volume side map.
#[derive(Debug, Serialize)]
pub struct ReportPayload<'a> {
    pub periods: &'a [String],
    pub columns: Vec<String>,
    pub rows: &'a [ReportRow],
    pub avg_sv: BTreeMap<&'a str, f64>,
}

pub fn build_payload(table: &ReportTable) -> ReportPayload<'_> {
    ReportPayload {
        periods: &table.periods,
        columns: interleaved_columns(&table.periods),
        rows: &table.rows,
        avg_sv: table
            .rows
            .iter()
            .map(|row| (row.keyword.as_str(), row.avg_search_volume))
            .collect(),
    }
}

/// Column labels for consumers that want a flat table: the keyword
/// column leads, followed by an (Organic Rank, Spend) pair per period.
pub fn interleaved_columns(periods: &[String]) -> Vec<String> {
    let mut columns = Vec::with_capacity(periods.len() * 2 + 1);
    columns.push(KEYWORD_COLUMN.to_string());
    for period in periods {
        columns.push(format!("{period} Organic Rank"));
        columns.push(format!("{period} Spend"));
    }
    columns
}

pub fn render_markdown(table: &ReportTable) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Keyword Rank & Spend Report");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} keywords across {} bi-weekly periods.",
        table.rows.len(),
        table.periods.len()
    );
    let _ = writeln!(output);

    if table.rows.is_empty() {
        let _ = writeln!(output, "No keywords found in either export.");
        return output;
    }

    let _ = write!(output, "| Keyword | Avg SV |");
    for period in &table.periods {
        let _ = write!(output, " {period} Organic Rank | {period} Spend |");
    }
    let _ = writeln!(output);

    let _ = write!(output, "| --- | --- |");
    for _ in &table.periods {
        let _ = write!(output, " --- | --- |");
    }
    let _ = writeln!(output);

    for row in &table.rows {
        let _ = write!(output, "| {} | {:.0} |", row.keyword, row.avg_search_volume);
        for cell in &row.cells {
            match cell.organic_rank {
                Some(rank) => {
                    let _ = write!(output, " {rank:.1} |");
                }
                None => {
                    let _ = write!(output, " - |");
                }
            }
            let _ = write!(output, " {:.0} |", cell.spend);
        }
        let _ = writeln!(output);
    }

    output
}
