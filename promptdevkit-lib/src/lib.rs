#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for promptdevkit
//!
//! This library holds the data layer behind the PromptDevKit dashboard: typed reads
//! and remote procedure calls against the managed database service, workspace
//! activity aggregation, and the query keys and options consumed by a query cache.
//!
//! # Module Organization
//!
//! - [`remote`]: Query-builder requests, the [`remote::RemoteSource`] seam, and its implementations
//! - [`activity`]: Date windows and the summary + breakdown aggregation queries
//! - [`query`]: Query keys and fetch options
//! - [`cache`]: In-process query cache with staleness and in-flight deduplication
//! - [`notifications`]: Notification listing and preference management
//! - [`workspaces`]: Workspace listing and slug resolution
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod activity;
pub mod cache;
pub mod clock;
pub mod notifications;
pub mod query;
pub mod remote;
pub mod workspaces;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
