//! Workspace activity aggregation
//!
//! Each activity query resolves a symbolic range to a UTC [`DateWindow`], reads a
//! pre-aggregated summary row and a per-item breakdown concurrently, and normalizes
//! both into an [`ActivityReport`]. Null counts become zero; other nulls pass through.
//!
//! The two instances, [`PROMPT_ACTIVITY`] and [`COMMENT_ENGAGEMENT`], are plain
//! [`ActivityQuery`] descriptors evaluated by [`fetch_activity`].

mod aggregate;
mod comment_engagement;
mod prompt_activity;
mod range;

pub use aggregate::{ActivityQuery, ActivityReport, ActivitySummary, SummaryRow, fetch_activity};
pub use comment_engagement::{COMMENT_ENGAGEMENT, CommentEngagement, CommentEngagementRow, fetch_comment_engagement};
pub use prompt_activity::{PROMPT_ACTIVITY, PromptActivityPoint, PromptActivityRow, fetch_prompt_activity, fill_missing_days};
pub use range::{ActivityRange, DateWindow};
