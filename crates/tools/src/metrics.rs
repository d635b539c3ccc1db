//! Numeric aggregation over the time-partitioned health dataset.
//!
//! Records live under `<data_root>/year=YYYY/month=MM.jsonl`, one JSON
//! record per line: `{"metric": "...", "value": <number>,
//! "start_date": "<RFC3339>"}`. The partition layout lets a query touch
//! only the months overlapping its time range.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use tt_domain::tool::ToolDefinition;

use crate::error::ToolError;
use crate::registry::Tool;

pub struct HealthMetricsTool {
    data_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct MetricsRequest {
    /// Metric name, e.g. "step_count".
    metric: String,
    /// Inclusive lower bound, RFC3339.
    start: String,
    /// Exclusive upper bound, RFC3339.
    end: String,
}

#[derive(Debug, Deserialize)]
struct HealthRecord {
    metric: String,
    value: f64,
    start_date: DateTime<Utc>,
}

impl HealthMetricsTool {
    pub fn new(data_root: &Path) -> Self {
        Self {
            data_root: data_root.to_path_buf(),
        }
    }

    fn aggregate(
        &self,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Value, ToolError> {
        let mut count: u64 = 0;
        let mut total = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for path in partition_files(&self.data_root, start, end) {
            let raw = match std::fs::read_to_string(&path) {
                Ok(r) => r,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ToolError::Execution(format!(
                        "reading {}: {e}",
                        path.display()
                    )))
                }
            };
            for line in raw.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: HealthRecord = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e,
                            "skipping malformed health record");
                        continue;
                    }
                };
                if record.metric != metric
                    || record.start_date < start
                    || record.start_date >= end
                {
                    continue;
                }
                count += 1;
                total += record.value;
                min = min.min(record.value);
                max = max.max(record.value);
            }
        }

        // Valid-empty: zero records is a successful answer, not an error.
        if count == 0 {
            return Ok(serde_json::json!({
                "metric": metric,
                "record_count": 0,
                "total": 0.0,
            }));
        }

        Ok(serde_json::json!({
            "metric": metric,
            "record_count": count,
            "total": total,
            "mean": total / count as f64,
            "min": min,
            "max": max,
        }))
    }
}

/// Enumerate the `year=YYYY/month=MM.jsonl` files whose month overlaps
/// `[start, end)`.
fn partition_files(root: &Path, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    loop {
        let month_start = match chrono::NaiveDate::from_ymd_opt(year, month, 1) {
            Some(d) => d,
            None => break,
        };
        if month_start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc() >= end) == Some(true) {
            break;
        }
        files.push(root.join(format!("year={year}")).join(format!("month={month:02}.jsonl")));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    files
}

fn parse_bound(field: &str, raw: &str) -> Result<DateTime<Utc>, ToolError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ToolError::InvalidArguments(format!("{field}: {e}")))
}

#[async_trait::async_trait]
impl Tool for HealthMetricsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "health.metrics".into(),
            description: "Aggregate a health metric over a time range. \
                          Returns record count, total, mean, min and max."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "metric": { "type": "string", "description": "Metric name, e.g. step_count" },
                    "start": { "type": "string", "description": "Inclusive start, RFC3339" },
                    "end": { "type": "string", "description": "Exclusive end, RFC3339" }
                },
                "required": ["metric", "start", "end"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let req = MetricsRequest::deserialize(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if req.metric.trim().is_empty() {
            return Err(ToolError::InvalidArguments("metric must be non-empty".into()));
        }
        let start = parse_bound("start", &req.start)?;
        let end = parse_bound("end", &req.end)?;
        if start >= end {
            return Err(ToolError::InvalidArguments(format!(
                "start ({start}) must be before end ({end})"
            )));
        }
        self.aggregate(&req.metric, start, end)
    }
}
