//! Access to the managed database service
//!
//! Every read in the data layer is expressed as a [`ReadRequest`] and every mutation as a
//! named remote procedure. Both go through the [`RemoteSource`] trait, which has two
//! implementations:
//!
//! - [`RestClient`] talks to the service's REST endpoint over HTTP. Access control is
//!   enforced server-side through row-level security, so the client never checks
//!   authorization itself.
//! - [`MemorySource`] evaluates the same requests against in-memory JSON rows and counts
//!   every call, which lets tests assert that a precondition failure made no remote call.
//!
//! Remote failures surface as [`QueryError::Api`] or [`QueryError::Transport`] unchanged.
//! Nothing in this module retries.

mod error;
mod memory;
mod request;
mod rest_client;

pub use error::{ApiError, MULTIPLE_ROWS_CODE, QueryError};
pub use memory::MemorySource;
pub use request::{Direction, Filter, FilterOp, Order, ReadRequest};
pub use rest_client::RestClient;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A remote data source supporting filtered reads and named procedures.
pub trait RemoteSource: Send + Sync {
    /// Read every row matching the request.
    fn select<T>(&self, request: &ReadRequest) -> impl Future<Output = Result<Vec<T>, QueryError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Read in single-or-none mode.
    ///
    /// Zero rows yield `None`. More than one row is reported as an [`ApiError`] with
    /// code [`MULTIPLE_ROWS_CODE`].
    fn select_maybe_single<T>(&self, request: &ReadRequest) -> impl Future<Output = Result<Option<T>, QueryError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let mut rows = self.select::<T>(request).await?;
            match rows.len() {
                0 | 1 => Ok(rows.pop()),
                n => Err(QueryError::Api(ApiError::multiple_rows(n))),
            }
        }
    }

    /// Invoke a named remote procedure with structured parameters.
    fn rpc<P, T>(&self, function: &str, params: &P) -> impl Future<Output = Result<T, QueryError>> + Send
    where
        P: Serialize + Sync,
        T: DeserializeOwned + Send;
}

/// Coerce a nullable remote count to a non-negative number.
///
/// Missing, null or negative counts become zero; they are never surfaced as errors.
#[must_use]
pub fn count_or_zero(count: Option<i64>) -> u64 {
    count.and_then(|c| u64::try_from(c).ok()).unwrap_or(0)
}
