use super::{ActivityQuery, ActivityRange, ActivityReport, DateWindow, fetch_activity};
use crate::remote::{Direction, QueryError, ReadRequest, RemoteSource, count_or_zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-prompt comment engagement as exposed by the remote view.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentEngagementRow {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub comment_count: Option<i64>,

    #[serde(default)]
    pub latest_comment_at: Option<DateTime<Utc>>,
}

/// Comment activity on a single prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEngagement {
    pub id: String,
    pub name: Option<String>,
    pub comment_count: u64,
    pub latest_comment_at: Option<DateTime<Utc>>,
}

impl CommentEngagement {
    #[must_use]
    pub fn from_row(row: CommentEngagementRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            comment_count: count_or_zero(row.comment_count),
            latest_comment_at: row.latest_comment_at,
        }
    }
}

// Timestamps are bounded by [start, end + 1 day) so the whole of the last day is included.
fn engagement_request(workspace_id: &str, window: &DateWindow) -> ReadRequest {
    ReadRequest::new("prompt_comment_engagement")
        .select(["id", "name", "comment_count", "latest_comment_at"])
        .eq("workspace_id", workspace_id)
        .gte("latest_comment_at", window.start)
        .lt("latest_comment_at", window.end_exclusive())
        .order("comment_count", Direction::Desc)
}

/// Comment engagement per workspace: a range total plus the most discussed prompts.
pub static COMMENT_ENGAGEMENT: ActivityQuery<CommentEngagementRow, CommentEngagement> = ActivityQuery {
    tag: "comment-engagement",
    summary_table: "workspace_comment_engagement_summary",
    detail: engagement_request,
    map_row: CommentEngagement::from_row,
};

pub async fn fetch_comment_engagement<S: RemoteSource>(
    source: &S,
    workspace_id: &str,
    range: ActivityRange,
    now: DateTime<Utc>,
) -> Result<ActivityReport<CommentEngagement>, QueryError> {
    fetch_activity(source, &COMMENT_ENGAGEMENT, workspace_id, range, now).await
}
