//! Command dispatch logic for promptdevkit

use super::{
    ActivityArgs, EngagementArgs, InitArgs, NotificationsArgs, PrefsArgs, ValidateArgs, WindowArgs, WorkspacesArgs, init_config,
    process_activity, process_engagement, process_notifications, process_prefs, process_workspaces, show_window, validate_config,
};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "promptdevkit", version, author, long_about = None)]
#[command(about = "Workspace activity, notifications and preferences from PromptDevKit")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: PdkSubcommand,
}

#[derive(Subcommand, Debug)]
enum PdkSubcommand {
    /// Show the date window an activity range resolves to
    Window(WindowArgs),
    /// Show prompt update activity for a workspace
    Activity(Box<ActivityArgs>),
    /// Show the most discussed prompts of a workspace
    Engagement(Box<EngagementArgs>),
    /// List the workspaces visible to you
    Workspaces(Box<WorkspacesArgs>),
    /// List your notifications
    Notifications(Box<NotificationsArgs>),
    /// Show or change notification preferences
    Prefs(Box<PrefsArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        PdkSubcommand::Window(args) => show_window(host, args),
        PdkSubcommand::Activity(args) => process_activity(host, args).await,
        PdkSubcommand::Engagement(args) => process_engagement(host, args).await,
        PdkSubcommand::Workspaces(args) => process_workspaces(host, args).await,
        PdkSubcommand::Notifications(args) => process_notifications(host, args).await,
        PdkSubcommand::Prefs(args) => process_prefs(host, args).await,
        PdkSubcommand::Init(args) => init_config(host, args),
        PdkSubcommand::Validate(args) => validate_config(host, args),
    }
}
