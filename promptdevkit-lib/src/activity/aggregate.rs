//! Summary + breakdown aggregation shared by every activity query.

use super::{ActivityRange, DateWindow};
use crate::remote::{QueryError, ReadRequest, RemoteSource, count_or_zero};
use chrono::{DateTime, Utc};
use core::fmt::{Debug, Formatter, Result as FmtResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "  activity";

/// Describes one activity query: where its summary and breakdown live and how breakdown rows are mapped.
pub struct ActivityQuery<R, T> {
    /// Domain tag, used as the first element of the query key.
    pub tag: &'static str,

    /// Table holding one pre-aggregated total per `(workspace_id, range)`.
    pub summary_table: &'static str,

    /// Builds the breakdown read for a workspace and resolved window.
    pub detail: fn(&str, &DateWindow) -> ReadRequest,

    /// Maps a remote breakdown row to its application shape.
    pub map_row: fn(R) -> T,
}

impl<R, T> ActivityQuery<R, T> {
    /// The summary read: equality on workspace and range, at most one row expected.
    #[must_use]
    pub fn summary_request(&self, workspace_id: &str, range: ActivityRange) -> ReadRequest {
        ReadRequest::new(self.summary_table)
            .select(["workspace_id", "range", "total_count"])
            .eq("workspace_id", workspace_id)
            .eq("range", range)
    }

    #[must_use]
    pub fn detail_request(&self, workspace_id: &str, window: &DateWindow) -> ReadRequest {
        (self.detail)(workspace_id, window)
    }
}

impl<R, T> Debug for ActivityQuery<R, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ActivityQuery")
            .field("tag", &self.tag)
            .field("summary_table", &self.summary_table)
            .finish_non_exhaustive()
    }
}

/// Summary row as stored remotely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryRow {
    #[serde(default)]
    pub total_count: Option<i64>,
}

/// Total activity for a workspace over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub workspace_id: String,
    pub range: ActivityRange,
    pub total_count: u64,
}

impl ActivitySummary {
    /// Normalize an optional summary row; an absent row or a null total yields zero.
    #[must_use]
    pub fn from_row(workspace_id: &str, range: ActivityRange, row: Option<SummaryRow>) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            range,
            total_count: count_or_zero(row.and_then(|r| r.total_count)),
        }
    }
}

/// Normalized result of an activity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport<T> {
    pub summary: ActivitySummary,
    pub window: DateWindow,
    pub rows: Vec<T>,
}

/// Resolve the window for `range`, read the summary and breakdown concurrently, and normalize both.
///
/// The first failing read aborts the whole fetch; its error is returned unchanged and no
/// partial report is produced.
pub async fn fetch_activity<S, R, T>(
    source: &S,
    query: &ActivityQuery<R, T>,
    workspace_id: &str,
    range: ActivityRange,
    now: DateTime<Utc>,
) -> Result<ActivityReport<T>, QueryError>
where
    S: RemoteSource,
    R: DeserializeOwned + Send,
{
    let window = DateWindow::resolve(range, now);
    let summary_request = query.summary_request(workspace_id, range);
    let detail_request = query.detail_request(workspace_id, &window);

    log::debug!(target: LOG_TARGET, "fetching {} for '{workspace_id}' over {}..{}", query.tag, window.start, window.end);

    let (summary, rows) = tokio::try_join!(
        source.select_maybe_single::<SummaryRow>(&summary_request),
        source.select::<R>(&detail_request),
    )?;

    log::debug!(target: LOG_TARGET, "{} returned {} breakdown rows", query.tag, rows.len());

    Ok(ActivityReport {
        summary: ActivitySummary::from_row(workspace_id, range, summary),
        window,
        rows: rows.into_iter().map(query.map_row).collect(),
    })
}
