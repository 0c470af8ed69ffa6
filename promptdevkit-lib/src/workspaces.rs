//! Workspace listing and slug resolution.

use crate::query::{KeyPart, QueryKey, QueryOptions, Session};
use crate::remote::{Direction, QueryError, ReadRequest, RemoteSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const TABLE: &str = "workspaces";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// List the workspaces visible to the caller, ordered by name.
///
/// Visibility is decided by the service's row-level security.
pub async fn list_workspaces<S: RemoteSource>(source: &S) -> Result<Vec<Workspace>, QueryError> {
    let request = ReadRequest::new(TABLE).select(["id", "name", "slug"]).order("name", Direction::Asc);
    source.select(&request).await
}

/// Look up a workspace by slug.
pub async fn resolve_workspace<S: RemoteSource>(source: &S, slug: &str) -> Result<Option<Workspace>, QueryError> {
    if slug.is_empty() {
        return Err(QueryError::MissingIdentifier("workspaceSlug"));
    }

    let request = ReadRequest::new(TABLE).select(["id", "name", "slug"]).eq("slug", slug);
    source.select_maybe_single(&request).await
}

/// Options for the caller's workspace list, keyed on `("workspaces", userId | null)`.
pub fn workspaces_options<S>(source: Arc<S>, session: &Session) -> QueryOptions<Vec<Workspace>>
where
    S: RemoteSource + 'static,
{
    let key = QueryKey::new([KeyPart::from(TABLE), KeyPart::from(session.user_id.as_deref())]);
    let session = session.clone();

    QueryOptions::new(key, session.user_id.is_some(), move || {
        let source = Arc::clone(&source);
        let session = session.clone();
        async move {
            let _ = session.require_user()?;
            list_workspaces(source.as_ref()).await
        }
    })
}
