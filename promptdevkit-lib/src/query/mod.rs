//! Query keys and fetch options
//!
//! A [`QueryOptions`] pairs a structural [`QueryKey`] with the procedure that produces
//! its value and a staleness hint. Option factories gate their fetch procedures on the
//! identifiers held by a [`Session`]: when one is missing the procedure fails with
//! [`crate::remote::QueryError::MissingIdentifier`] before any remote call.

mod key;
mod options;

pub use key::{KeyPart, QueryKey};
pub use options::{DEFAULT_STALE_TIME, FetchFn, QueryOptions, Session, activity_options};
