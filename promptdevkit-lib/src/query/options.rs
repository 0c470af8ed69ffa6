use super::{KeyPart, QueryKey};
use crate::activity::{ActivityQuery, ActivityRange, ActivityReport, fetch_activity};
use crate::clock::Clock;
use crate::remote::{QueryError, RemoteSource};
use core::fmt::{Debug, Formatter, Result as FmtResult};
use core::time::Duration;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// How long a fetched result is served without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// A shareable fetch procedure.
pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, QueryError>> + Send + Sync>;

/// The identifiers a caller has resolved for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub workspace_id: Option<String>,
}

impl Session {
    /// Create a session; empty identifiers are treated as absent.
    #[must_use]
    pub fn new(user_id: Option<String>, workspace_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.is_empty()),
            workspace_id: workspace_id.filter(|id| !id.is_empty()),
        }
    }

    #[must_use]
    pub fn with_workspace(self, workspace_id: impl Into<String>) -> Self {
        Self::new(self.user_id, Some(workspace_id.into()))
    }

    /// The user identifier, or the precondition failure raised when it is absent.
    pub fn require_user(&self) -> Result<&str, QueryError> {
        self.user_id.as_deref().ok_or(QueryError::MissingIdentifier("userId"))
    }

    /// The workspace identifier, or the precondition failure raised when it is absent.
    pub fn require_workspace(&self) -> Result<&str, QueryError> {
        self.workspace_id.as_deref().ok_or(QueryError::MissingIdentifier("workspaceId"))
    }
}

/// A cache key paired with the procedure that produces its value.
pub struct QueryOptions<T> {
    pub key: QueryKey,
    pub stale_time: Duration,

    /// `false` when a required identifier is missing; the fetch procedure then fails without a remote call.
    pub enabled: bool,

    pub fetch: FetchFn<T>,
}

impl<T> QueryOptions<T> {
    pub fn new<F, Fut>(key: QueryKey, enabled: bool, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        Self {
            key,
            stale_time: DEFAULT_STALE_TIME,
            enabled,
            fetch: Arc::new(move || fetch().boxed()),
        }
    }

    #[must_use]
    pub const fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Run the fetch procedure once, bypassing any cache.
    pub async fn run(&self) -> Result<T, QueryError> {
        (self.fetch)().await
    }
}

impl<T> Clone for QueryOptions<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            stale_time: self.stale_time,
            enabled: self.enabled,
            fetch: Arc::clone(&self.fetch),
        }
    }
}

impl<T> Debug for QueryOptions<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("QueryOptions")
            .field("key", &self.key)
            .field("stale_time", &self.stale_time)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Options for an activity query, keyed on `(tag, workspaceId | null, range)`.
///
/// The fetch procedure requires both a user and a workspace and reads the clock on every
/// invocation, so each refetch recomputes its window.
pub fn activity_options<S, R, T>(
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    query: &'static ActivityQuery<R, T>,
    session: &Session,
    range: ActivityRange,
) -> QueryOptions<ActivityReport<T>>
where
    S: RemoteSource + 'static,
    R: DeserializeOwned + Send + 'static,
    T: Send + 'static,
{
    let key = QueryKey::new([
        KeyPart::from(query.tag),
        KeyPart::from(session.workspace_id.as_deref()),
        KeyPart::from(range.to_string()),
    ]);

    let enabled = session.user_id.is_some() && session.workspace_id.is_some();
    let session = session.clone();

    QueryOptions::new(key, enabled, move || {
        let source = Arc::clone(&source);
        let clock = Arc::clone(&clock);
        let session = session.clone();

        async move {
            let _ = session.require_user()?;
            let workspace_id = session.require_workspace()?;
            fetch_activity(source.as_ref(), query, workspace_id, range, clock.now()).await
        }
    })
}
