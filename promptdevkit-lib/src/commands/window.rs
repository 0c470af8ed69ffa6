use super::Host;
use super::render;
use crate::Result;
use crate::activity::{ActivityRange, DateWindow};
use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct WindowArgs {
    /// Activity range (7d, 30d or 90d)
    #[arg(long, short = 'r', value_name = "RANGE", default_value = "7d")]
    pub range: ActivityRange,

    /// Resolve against this instant (RFC 3339) instead of the current time
    #[arg(long, value_name = "TIME")]
    pub now: Option<DateTime<Utc>>,

    /// Print the window as JSON
    #[arg(long)]
    pub json: bool,
}

/// Print the date window a range resolves to. Runs offline.
pub fn show_window<H: Host>(host: &mut H, args: &WindowArgs) -> Result<()> {
    let now = args.now.unwrap_or_else(|| SystemClock.now());
    let window = DateWindow::resolve(args.range, now);

    let mut text = String::new();
    if args.json {
        text = serde_json::to_string_pretty(&serde_json::json!({
            "range": args.range,
            "start": window.start,
            "end": window.end,
            "days": window.days(),
        }))?;
        text.push('\n');
    } else {
        render::window(&mut text, &args.range.to_string(), &window)?;
    }

    let _ = write!(host.output(), "{text}");
    Ok(())
}
