use super::common::{Common, CommonArgs};
use super::{Host, render};
use crate::Result;
use crate::activity::{ActivityRange, ActivityReport, COMMENT_ENGAGEMENT, PROMPT_ACTIVITY, fill_missing_days};
use crate::query::activity_options;
use crate::remote::RemoteSource;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct ActivityArgs {
    /// Slug of the workspace to report on
    #[arg(long, short = 'w', value_name = "SLUG")]
    pub workspace: String,

    /// Activity range (7d, 30d or 90d; default from the configuration file)
    #[arg(long, short = 'r', value_name = "RANGE")]
    pub range: Option<ActivityRange>,

    /// Include days without activity as zero entries
    #[arg(long)]
    pub fill_gaps: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct EngagementArgs {
    /// Slug of the workspace to report on
    #[arg(long, short = 'w', value_name = "SLUG")]
    pub workspace: String,

    /// Activity range (7d, 30d or 90d; default from the configuration file)
    #[arg(long, short = 'r', value_name = "RANGE")]
    pub range: Option<ActivityRange>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn process_activity<H: Host>(host: &mut H, args: &ActivityArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    show_activity(&mut common, args).await
}

pub async fn process_engagement<H: Host>(host: &mut H, args: &EngagementArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    show_engagement(&mut common, args).await
}

pub async fn show_activity<H: Host, S: RemoteSource + 'static>(common: &mut Common<'_, H, S>, args: &ActivityArgs) -> Result<()> {
    let workspace = common.workspace(&args.workspace).await?;
    let range = args.range.unwrap_or(common.config.default_range);
    let session = common.session.clone().with_workspace(workspace.id.clone());

    let options = activity_options(Arc::clone(&common.source), Arc::clone(&common.clock), &PROMPT_ACTIVITY, &session, range);
    let report = common.fetch(options).await?;

    let mut report = ActivityReport::clone(&report);
    if args.fill_gaps {
        report.rows = fill_missing_days(&report.window, &report.rows);
    }

    if args.json {
        return common.write_json(&report);
    }

    let mut text = String::new();
    render::prompt_activity(&mut text, &workspace, &report, common.use_colors())?;
    common.write_output(&text);
    Ok(())
}

pub async fn show_engagement<H: Host, S: RemoteSource + 'static>(common: &mut Common<'_, H, S>, args: &EngagementArgs) -> Result<()> {
    let workspace = common.workspace(&args.workspace).await?;
    let range = args.range.unwrap_or(common.config.default_range);
    let session = common.session.clone().with_workspace(workspace.id.clone());

    let options = activity_options(Arc::clone(&common.source), Arc::clone(&common.clock), &COMMENT_ENGAGEMENT, &session, range);
    let report = common.fetch(options).await?;

    if args.json {
        return common.write_json(&*report);
    }

    let mut text = String::new();
    render::comment_engagement(&mut text, &workspace, &report, common.use_colors())?;
    common.write_output(&text);
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::commands::common::{ColorMode, LogLevel};
    use crate::commands::config::Config;
    use crate::commands::host::TestHost;
    use crate::query::Session;
    use crate::remote::{ApiError, MemorySource, QueryError};
    use chrono::{DateTime, Utc};
    use serde_json::{Value, json};

    fn source() -> MemorySource {
        MemorySource::new()
            .with_table("workspaces", vec![json!({"id": "ws-1", "name": "Acme", "slug": "acme"})])
            .with_table(
                "workspace_prompt_activity_summary",
                vec![
                    json!({"workspace_id": "ws-1", "range": "7d", "total_count": 12}),
                    json!({"workspace_id": "ws-1", "range": "30d", "total_count": 40}),
                ],
            )
            .with_table(
                "workspace_prompt_activity_daily",
                vec![
                    json!({"workspace_id": "ws-1", "activity_date": "2024-03-07", "prompt_update_count": 2}),
                    json!({"workspace_id": "ws-1", "activity_date": "2024-03-05", "prompt_update_count": 10}),
                    json!({"workspace_id": "ws-1", "activity_date": "2024-02-01", "prompt_update_count": 5}),
                ],
            )
            .with_table("workspace_comment_engagement_summary", Vec::new())
            .with_table(
                "prompt_comment_engagement",
                vec![
                    json!({"workspace_id": "ws-1", "id": "p-1", "name": "Onboarding", "comment_count": 3, "latest_comment_at": "2024-03-06T12:00:00Z"}),
                    json!({"workspace_id": "ws-1", "id": "p-2", "name": "Welcome flow", "comment_count": 7, "latest_comment_at": "2024-03-10T23:59:00Z"}),
                    json!({"workspace_id": "ws-1", "id": "p-3", "name": "Stale", "comment_count": 9, "latest_comment_at": "2024-03-11T00:00:00Z"}),
                ],
            )
    }

    fn common_for(host: &mut TestHost, source: MemorySource) -> Common<'_, TestHost, MemorySource> {
        let now = DateTime::parse_from_rfc3339("2024-03-10T15:30:00Z").unwrap().with_timezone(&Utc);
        Common::with_source(
            host,
            Config::default(),
            Arc::new(source),
            Arc::new(FixedClock(now)),
            Session::new(Some("user-1".to_string()), None),
            false,
        )
    }

    fn common_args() -> CommonArgs {
        CommonArgs {
            url: None,
            anon_key: None,
            access_token: None,
            user_id: None,
            config: None,
            color: ColorMode::Never,
            log_level: LogLevel::None,
        }
    }

    fn activity_args(range: Option<ActivityRange>, fill_gaps: bool, json: bool) -> ActivityArgs {
        ActivityArgs {
            workspace: "acme".to_string(),
            range,
            fill_gaps,
            json,
            common: common_args(),
        }
    }

    fn engagement_args(json: bool) -> EngagementArgs {
        EngagementArgs {
            workspace: "acme".to_string(),
            range: None,
            json,
            common: common_args(),
        }
    }

    #[tokio::test]
    async fn prompt_activity_report() {
        let mut host = TestHost::new();
        {
            let mut common = common_for(&mut host, source());
            show_activity(&mut common, &activity_args(None, false, false)).await.unwrap();
        }

        let out = host.output_text();
        assert!(out.starts_with("Prompt activity in Acme (acme)\n7d window: 2024-03-04 to 2024-03-10\n"), "{out}");
        assert!(out.contains("Total prompt updates: 12\n"));
        assert!(out.contains("2024-03-05  10"));
        assert!(!out.contains("2024-02-01"));
    }

    #[tokio::test]
    async fn prompt_activity_json_with_gaps_filled() {
        let mut host = TestHost::new();
        {
            let mut common = common_for(&mut host, source());
            show_activity(&mut common, &activity_args(Some(ActivityRange::Week), true, true)).await.unwrap();
        }

        let report: Value = serde_json::from_str(&host.output_text()).unwrap();
        assert_eq!(report["summary"], json!({"workspaceId": "ws-1", "range": "7d", "totalCount": 12}));
        assert_eq!(report["window"]["start"], "2024-03-04");

        let rows = report["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], json!({"activityDate": "2024-03-04", "promptUpdateCount": 0}));
        assert_eq!(rows[1], json!({"activityDate": "2024-03-05", "promptUpdateCount": 10}));
    }

    #[tokio::test]
    async fn missing_summary_row_reports_zero() {
        let mut host = TestHost::new();
        {
            let mut common = common_for(&mut host, source());
            show_activity(&mut common, &activity_args(Some(ActivityRange::Quarter), false, false)).await.unwrap();
        }

        assert!(host.output_text().contains("Total prompt updates: 0\n"));
    }

    #[tokio::test]
    async fn unknown_workspace_fails_before_activity_reads() {
        let mut host = TestHost::new();
        let mut common = common_for(&mut host, source());
        let mut args = activity_args(None, false, false);
        args.workspace = "nope".to_string();

        let err = show_activity(&mut common, &args).await.unwrap_err();
        assert!(err.to_string().contains("no workspace with slug 'nope'"));
        assert_eq!(common.source.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_breakdown_fails_the_command() {
        let failure = QueryError::Api(ApiError {
            status: 500,
            code: Some("XX000".to_string()),
            message: "boom".to_string(),
            details: None,
            hint: None,
        });

        let mut host = TestHost::new();
        let mut common = common_for(&mut host, source().with_failure("workspace_prompt_activity_daily", failure));

        let err = show_activity(&mut common, &activity_args(None, false, false)).await.unwrap_err();
        assert!(err.to_string().contains("boom"), "{err}");
    }

    #[tokio::test]
    async fn comment_engagement_report() {
        let mut host = TestHost::new();
        {
            let mut common = common_for(&mut host, source());
            show_engagement(&mut common, &engagement_args(false)).await.unwrap();
        }

        let out = host.output_text();
        assert!(out.starts_with("Comment engagement in Acme (acme)\n"), "{out}");
        assert!(out.contains("Total comments: 0\n"));
        assert!(!out.contains("Stale"));

        let welcome = out.find("Welcome flow").unwrap();
        let onboarding = out.find("Onboarding").unwrap();
        assert!(welcome < onboarding);
    }

    #[tokio::test]
    async fn comment_engagement_json() {
        let mut host = TestHost::new();
        {
            let mut common = common_for(&mut host, source());
            show_engagement(&mut common, &engagement_args(true)).await.unwrap();
        }

        let report: Value = serde_json::from_str(&host.output_text()).unwrap();
        assert_eq!(report["summary"]["totalCount"], 0);
        assert_eq!(report["rows"][0]["name"], "Welcome flow");
        assert_eq!(report["rows"][0]["commentCount"], 7);
        assert_eq!(report["rows"].as_array().unwrap().len(), 2);
    }
}
