//! Command-line interface and orchestration for promptdevkit
//!
//! This module implements the CLI commands on top of the data layer. It handles
//! argument parsing, configuration management, connecting to the service and
//! rendering results.
//!
//! # Commands
//!
//! - **window**: Resolve an activity range to its date window, offline
//! - **activity**: Prompt update totals and the daily series for a workspace
//! - **engagement**: Comment totals and the most discussed prompts of a workspace
//! - **workspaces**: The workspaces visible to the signed-in user
//! - **notifications**: List notifications, optionally marking them read
//! - **prefs**: Show or change notification preferences
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file
//!
//! Service commands share the `common` module: it loads the configuration, builds the
//! REST client from flags or `PDK_*` environment variables, and routes every read through
//! a query cache. Commands render through the [`Host`] so their output can be captured.

mod activity;
mod common;
mod config;
mod host;
mod init;
mod notifications;
mod render;
mod run;
mod validate;
mod window;
mod workspaces;

#[cfg(debug_assertions)]
pub use config::Config;

pub use activity::{ActivityArgs, EngagementArgs, process_activity, process_engagement};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use notifications::{NotificationsArgs, PrefsAction, PrefsArgs, process_notifications, process_prefs};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
pub use window::{WindowArgs, show_window};
pub use workspaces::{WorkspacesArgs, process_workspaces};
