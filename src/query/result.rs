//! Cached Query Result
//!
//! The tabular payload stored in the query cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{record_size, sequence_size, EstimateSize};

/// One result row, cells in column order.
pub type Row = Vec<Value>;

/// Execution statistics reported alongside a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStats {
    pub columns_count: usize,
    pub rows_count: usize,
    pub query_start_time: DateTime<Utc>,
    pub query_finish_time: DateTime<Utc>,
    pub query_duration_ms: i64,
}

impl ResultStats {
    const FIELD_COUNT: usize = 5;
}

/// Rows and columns returned by one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ResultStats>,
}

impl QueryResult {
    /// Builds a result and fills in its statistics.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Row>,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
    ) -> Self {
        let stats = ResultStats {
            columns_count: columns.len(),
            rows_count: rows.len(),
            query_start_time: started,
            query_finish_time: finished,
            query_duration_ms: (finished - started).num_milliseconds(),
        };
        Self {
            columns,
            rows,
            stats: Some(stats),
        }
    }

    pub fn rows_count(&self) -> usize {
        self.rows.len()
    }
}

impl EstimateSize for QueryResult {
    /// Sums column names, every row's sequence cost and every cell, plus the
    /// statistics record.
    fn estimate_size(&self) -> usize {
        let columns: usize =
            self.columns.estimate_size() + self.columns.iter().map(String::estimate_size).sum::<usize>();

        let rows: usize = sequence_size::<Row>(self.rows.len())
            + self
                .rows
                .iter()
                .map(|row| row.estimate_size() + row.iter().map(Value::estimate_size).sum::<usize>())
                .sum::<usize>();

        let stats = match &self.stats {
            Some(_) => record_size(ResultStats::FIELD_COUNT),
            None => 0,
        };

        columns + rows + stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QueryResult {
        let now = Utc::now();
        QueryResult::new(
            vec!["id".to_string(), "name".to_string()],
            vec![vec![json!(1), json!("alice")], vec![json!(2), json!("bob")]],
            now,
            now + chrono::Duration::milliseconds(12),
        )
    }

    #[test]
    fn test_stats_filled_in() {
        let result = sample();
        let stats = result.stats.as_ref().unwrap();
        assert_eq!(stats.columns_count, 2);
        assert_eq!(stats.rows_count, 2);
        assert_eq!(stats.query_duration_ms, 12);
        assert_eq!(result.rows_count(), 2);
    }

    #[test]
    fn test_estimate_counts_cells() {
        let result = sample();
        // columns: (2*8+24) + (2+16) + (4+16)
        let columns = 40 + 18 + 20;
        // rows: (2*8+24) + 2 * (2*8*4+24) + cells (8 + 21) + (8 + 19)
        let rows = 40 + 2 * 88 + 29 + 27;
        assert_eq!(result.estimate_size(), columns + rows + 80);
    }

    #[test]
    fn test_estimate_grows_with_rows() {
        let small = sample();
        let mut large = small.clone();
        large.rows.push(vec![json!(3), json!("carol")]);
        assert!(large.estimate_size() > small.estimate_size());
        assert_eq!(small.estimate_size(), small.clone().estimate_size());
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["columns"], json!(["id", "name"]));
        assert_eq!(json["rows"][1][1], json!("bob"));
        assert_eq!(json["stats"]["rows_count"], json!(2));
    }
}
