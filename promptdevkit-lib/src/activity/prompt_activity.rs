use super::{ActivityQuery, ActivityRange, ActivityReport, DateWindow, fetch_activity};
use crate::remote::{Direction, QueryError, ReadRequest, RemoteSource, count_or_zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Daily prompt update count as stored remotely.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptActivityRow {
    pub activity_date: NaiveDate,

    #[serde(default)]
    pub prompt_update_count: Option<i64>,
}

/// Prompt updates on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptActivityPoint {
    pub activity_date: NaiveDate,
    pub prompt_update_count: u64,
}

impl PromptActivityPoint {
    #[must_use]
    pub fn from_row(row: PromptActivityRow) -> Self {
        Self {
            activity_date: row.activity_date,
            prompt_update_count: count_or_zero(row.prompt_update_count),
        }
    }
}

fn daily_request(workspace_id: &str, window: &DateWindow) -> ReadRequest {
    ReadRequest::new("workspace_prompt_activity_daily")
        .select(["activity_date", "prompt_update_count"])
        .eq("workspace_id", workspace_id)
        .gte("activity_date", window.start)
        .lte("activity_date", window.end)
        .order("activity_date", Direction::Asc)
}

/// Prompt updates per workspace: a range total plus a daily series.
pub static PROMPT_ACTIVITY: ActivityQuery<PromptActivityRow, PromptActivityPoint> = ActivityQuery {
    tag: "prompt-activity",
    summary_table: "workspace_prompt_activity_summary",
    detail: daily_request,
    map_row: PromptActivityPoint::from_row,
};

pub async fn fetch_prompt_activity<S: RemoteSource>(
    source: &S,
    workspace_id: &str,
    range: ActivityRange,
    now: DateTime<Utc>,
) -> Result<ActivityReport<PromptActivityPoint>, QueryError> {
    fetch_activity(source, &PROMPT_ACTIVITY, workspace_id, range, now).await
}

/// Expand a sparse daily series to one point per date in `window`.
///
/// Dates without a point get a zero count. Points outside the window are dropped.
#[must_use]
pub fn fill_missing_days(window: &DateWindow, points: &[PromptActivityPoint]) -> Vec<PromptActivityPoint> {
    let counts: HashMap<NaiveDate, u64> = points.iter().map(|p| (p.activity_date, p.prompt_update_count)).collect();

    window
        .dates()
        .map(|activity_date| PromptActivityPoint {
            activity_date,
            prompt_update_count: counts.get(&activity_date).copied().unwrap_or(0),
        })
        .collect()
}
