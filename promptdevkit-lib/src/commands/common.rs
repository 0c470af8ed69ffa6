//! Common setup shared by the commands that talk to the service.

use super::Host;
use super::config::Config;
use crate::Result;
use crate::cache::QueryCache;
use crate::clock::{Clock, SystemClock};
use crate::query::{QueryKey, QueryOptions, Session};
use crate::remote::{RemoteSource, RestClient};
use crate::workspaces::{Workspace, resolve_workspace};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use ohno::{app_err, bail};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    #[must_use]
    pub fn use_colors(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                use std::io::{IsTerminal, stdout};
                stdout().is_terminal()
            }
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by every command that talks to the service
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Base URL of the service (overrides `url` in the configuration file)
    #[arg(long, value_name = "URL", env = "PDK_URL", global = true)]
    pub url: Option<String>,

    /// Anonymous API key of the service
    #[arg(long, value_name = "KEY", env = "PDK_ANON_KEY", hide_env_values = true, global = true)]
    pub anon_key: Option<String>,

    /// Access token of the signed-in user
    #[arg(long, value_name = "TOKEN", env = "PDK_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Id of the signed-in user
    #[arg(long, value_name = "ID", env = "PDK_USER_ID", global = true)]
    pub user_id: Option<String>,

    /// Path to configuration file (default is `promptdevkit.toml`)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when several commands run in one process
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Everything a service command needs: configuration, the remote source, a query cache and the session.
pub struct Common<'a, H: Host, S: RemoteSource> {
    pub config: Config,
    pub source: Arc<S>,
    pub clock: Arc<dyn Clock>,
    pub session: Session,
    cache: QueryCache,
    host: &'a mut H,
    use_colors: bool,
}

impl<'a, H: Host> Common<'a, H, RestClient> {
    /// Set up logging, load the configuration and connect to the service.
    pub fn new(host: &'a mut H, args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;

        let Some(url) = args.url.as_deref().or(config.url.as_deref()) else {
            bail!("no service URL configured; pass --url, set PDK_URL, or set `url` in the configuration file");
        };

        let Some(anon_key) = args.anon_key.as_deref() else {
            bail!("no API key configured; pass --anon-key or set PDK_ANON_KEY");
        };

        let client = RestClient::new(url, anon_key, args.access_token.as_deref(), config.request_timeout)?;
        log::info!("using service at {}", client.base_url());

        let session = Session::new(args.user_id.clone(), None);
        Ok(Self::with_source(
            host,
            config,
            Arc::new(client),
            Arc::new(SystemClock),
            session,
            args.color.use_colors(),
        ))
    }
}

impl<'a, H: Host, S: RemoteSource + 'static> Common<'a, H, S> {
    pub fn with_source(
        host: &'a mut H,
        config: Config,
        source: Arc<S>,
        clock: Arc<dyn Clock>,
        session: Session,
        use_colors: bool,
    ) -> Self {
        let cache = QueryCache::new(Arc::clone(&clock));
        Self {
            config,
            source,
            clock,
            session,
            cache,
            host,
            use_colors,
        }
    }

    #[must_use]
    pub const fn use_colors(&self) -> bool {
        self.use_colors
    }

    /// Fetch through the query cache, applying the configured stale time.
    pub async fn fetch<T>(&self, options: QueryOptions<T>) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let options = options.with_stale_time(self.config.stale_time);
        Ok(self.cache.fetch(&options).await?)
    }

    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.cache.invalidate(prefix)
    }

    /// Resolve a workspace slug on behalf of the signed-in user.
    pub async fn workspace(&self, slug: &str) -> Result<Workspace> {
        let _ = self.session.require_user()?;
        resolve_workspace(self.source.as_ref(), slug)
            .await?
            .ok_or_else(|| app_err!("no workspace with slug '{slug}' is visible to you"))
    }

    pub fn write_output(&mut self, text: &str) {
        let _ = write!(self.host.output(), "{text}");
    }

    pub fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        let _ = writeln!(self.host.output(), "{text}");
        Ok(())
    }
}
