//! Console rendering of query results.

use crate::Result;
use crate::activity::{ActivityReport, CommentEngagement, DateWindow, PromptActivityPoint};
use crate::notifications::{Notification, NotificationPreferences};
use crate::workspaces::Workspace;
use chrono::{DateTime, Utc};
use core::fmt::Write;
use owo_colors::OwoColorize;

const BAR_WIDTH: u64 = 30;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const NOT_AVAILABLE: &str = "n/a";

fn heading<W: Write>(writer: &mut W, text: &str, use_colors: bool) -> Result<()> {
    if use_colors {
        writeln!(writer, "{}", text.bold())?;
    } else {
        writeln!(writer, "{text}")?;
    }
    Ok(())
}

fn timestamp(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.format(TIMESTAMP_FORMAT).to_string())
}

fn text_or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

pub fn window<W: Write>(writer: &mut W, range: &str, window: &DateWindow) -> Result<()> {
    writeln!(writer, "{range}: {} to {} ({} days)", window.start, window.end, window.days())?;
    Ok(())
}

fn report_header<W: Write, T>(writer: &mut W, title: &str, workspace: &Workspace, report: &ActivityReport<T>, use_colors: bool) -> Result<()> {
    heading(writer, &format!("{title} in {} ({})", workspace.name, workspace.slug), use_colors)?;
    writeln!(
        writer,
        "{} window: {} to {}",
        report.summary.range, report.window.start, report.window.end
    )?;
    writeln!(writer)?;
    Ok(())
}

fn bar(count: u64, max: u64) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }

    let width = (count.saturating_mul(BAR_WIDTH) / max).max(1);
    "■".repeat(usize::try_from(width).unwrap_or(0))
}

pub fn prompt_activity<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    report: &ActivityReport<PromptActivityPoint>,
    use_colors: bool,
) -> Result<()> {
    report_header(writer, "Prompt activity", workspace, report, use_colors)?;
    writeln!(writer, "Total prompt updates: {}", report.summary.total_count)?;

    if report.rows.is_empty() {
        writeln!(writer, "No daily activity in this window")?;
        return Ok(());
    }

    writeln!(writer)?;

    let max = report.rows.iter().map(|p| p.prompt_update_count).max().unwrap_or(0);
    let count_width = max.to_string().len();

    for point in &report.rows {
        let bar = bar(point.prompt_update_count, max);
        let count = format!("{:>count_width$}", point.prompt_update_count);
        let line = if bar.is_empty() {
            format!("  {}  {count}", point.activity_date)
        } else if use_colors {
            format!("  {}  {count} {}", point.activity_date, bar.green())
        } else {
            format!("  {}  {count} {bar}", point.activity_date)
        };
        writeln!(writer, "{line}")?;
    }

    Ok(())
}

pub fn comment_engagement<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    report: &ActivityReport<CommentEngagement>,
    use_colors: bool,
) -> Result<()> {
    report_header(writer, "Comment engagement", workspace, report, use_colors)?;
    writeln!(writer, "Total comments: {}", report.summary.total_count)?;

    if report.rows.is_empty() {
        writeln!(writer, "No commented prompts in this window")?;
        return Ok(());
    }

    writeln!(writer)?;

    let name_width = report.rows.iter().map(|e| text_or_na(e.name.as_deref()).chars().count()).max().unwrap_or(0).max("Prompt".len());
    let header = format!("  {:<name_width$}  {:>8}  Latest comment", "Prompt", "Comments");
    heading(writer, &header, use_colors)?;

    for engagement in &report.rows {
        writeln!(
            writer,
            "  {:<name_width$}  {:>8}  {}",
            text_or_na(engagement.name.as_deref()),
            engagement.comment_count,
            timestamp(engagement.latest_comment_at.as_ref())
        )?;
    }

    Ok(())
}

pub fn workspaces<W: Write>(writer: &mut W, workspaces: &[Workspace], use_colors: bool) -> Result<()> {
    if workspaces.is_empty() {
        writeln!(writer, "No workspaces")?;
        return Ok(());
    }

    let slug_width = workspaces.iter().map(|w| w.slug.chars().count()).max().unwrap_or(0);
    for workspace in workspaces {
        let slug = format!("{:<slug_width$}", workspace.slug);
        if use_colors {
            writeln!(writer, "  {}  {}", slug.cyan(), workspace.name)?;
        } else {
            writeln!(writer, "  {slug}  {}", workspace.name)?;
        }
    }

    Ok(())
}

pub fn notifications<W: Write>(writer: &mut W, notifications: &[Notification], use_colors: bool) -> Result<()> {
    if notifications.is_empty() {
        writeln!(writer, "No notifications")?;
        return Ok(());
    }

    for notification in notifications {
        let title = text_or_na(notification.title.as_deref());
        let marker = if notification.is_unread() { "●" } else { " " };
        let created = timestamp(Some(&notification.created_at));

        if use_colors && notification.is_unread() {
            writeln!(writer, "{} {}  ({created})", marker.yellow(), title.bold())?;
        } else {
            writeln!(writer, "{marker} {title}  ({created})")?;
        }

        if let Some(body) = notification.body.as_deref().filter(|b| !b.is_empty()) {
            writeln!(writer, "  {body}")?;
        }
    }

    Ok(())
}

pub fn preferences<W: Write>(writer: &mut W, prefs: &NotificationPreferences) -> Result<()> {
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };

    writeln!(writer, "Email notifications  : {}", on_off(prefs.email_enabled))?;
    writeln!(writer, "In-app notifications : {}", on_off(prefs.in_app_enabled))?;
    writeln!(writer, "Digest               : {}", prefs.digest_frequency)?;
    Ok(())
}
