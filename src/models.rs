use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

/// One row of the keyword-rank export after field coercion.
#[derive(Debug, Clone)]
pub struct RankRecord {
    pub keyword: String,
    pub search_volume: Option<f64>,
    pub organic_rank: Option<f64>,
    pub date_added: NaiveDate,
}

/// One row of the advertising-spend export.
#[derive(Debug, Clone)]
pub struct SpendRecord {
    pub search_term: String,
    pub spend: f64,
    pub date: NaiveDate,
}

/// Keyword × period matrix of mean organic rank. A missing cell means
/// "not measured", which is distinct from any numeric value.
#[derive(Debug, Clone, Default)]
pub struct RankMatrix {
    pub keywords: BTreeSet<String>,
    pub periods: BTreeSet<String>,
    pub cells: HashMap<(String, String), f64>,
}

impl RankMatrix {
    pub fn rank(&self, keyword: &str, period: &str) -> Option<f64> {
        self.cells
            .get(&(keyword.to_string(), period.to_string()))
            .copied()
    }
}

/// Keyword × period matrix of summed spend. A missing cell means zero
/// spend, not "no data".
#[derive(Debug, Clone, Default)]
pub struct SpendMatrix {
    pub terms: BTreeSet<String>,
    pub periods: BTreeSet<String>,
    pub cells: HashMap<(String, String), f64>,
}

impl SpendMatrix {
    pub fn spend(&self, term: &str, period: &str) -> f64 {
        self.cells
            .get(&(term.to_string(), period.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Output of the rank aggregation pass: the rank matrix plus the
/// trailing average search volume per keyword.
#[derive(Debug, Clone)]
pub struct RankAggregate {
    pub ranks: RankMatrix,
    pub avg_search_volume: HashMap<String, f64>,
}

/// One (Organic Rank, Spend) pair for a keyword in a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodCell {
    pub organic_rank: Option<f64>,
    pub spend: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub keyword: String,
    pub avg_search_volume: f64,
    /// Aligned with `ReportTable::periods`.
    pub cells: Vec<PeriodCell>,
}

/// The reconciled artifact handed to consumers: periods in calendar
/// order, rows in descending average-search-volume order.
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub periods: Vec<String>,
    pub rows: Vec<ReportRow>,
}
