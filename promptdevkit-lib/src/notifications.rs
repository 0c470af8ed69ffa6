//! Notifications and notification preferences
//!
//! Reads go through the `notifications` and `notification_preferences` tables. Mutations
//! are remote procedures, which apply the change as the calling user and return the
//! stored result.

use crate::query::{KeyPart, QueryKey, QueryOptions, Session};
use crate::remote::{Direction, QueryError, ReadRequest, RemoteSource, count_or_zero};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};

const LOG_TARGET: &str = "    notify";

const PREFERENCES_TABLE: &str = "notification_preferences";
const NOTIFICATIONS_TABLE: &str = "notifications";
const UPDATE_PREFERENCES_FN: &str = "update_notification_preferences";
const MARK_READ_FN: &str = "mark_notifications_read";

/// Default number of notifications returned by a listing.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// How often digest emails are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DigestFrequency {
    Never,
    Daily,
    #[default]
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: String,
    pub email_enabled: bool,
    pub in_app_enabled: bool,
    pub digest_frequency: DigestFrequency,
}

impl NotificationPreferences {
    /// Preferences of a user who never saved any.
    #[must_use]
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email_enabled: true,
            in_app_enabled: true,
            digest_frequency: DigestFrequency::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PreferencesRow {
    user_id: String,
    email_enabled: Option<bool>,
    in_app_enabled: Option<bool>,
    digest_frequency: Option<DigestFrequency>,
}

impl From<PreferencesRow> for NotificationPreferences {
    fn from(row: PreferencesRow) -> Self {
        let defaults = Self::defaults_for(&row.user_id);
        Self {
            email_enabled: row.email_enabled.unwrap_or(defaults.email_enabled),
            in_app_enabled: row.in_app_enabled.unwrap_or(defaults.in_app_enabled),
            digest_frequency: row.digest_frequency.unwrap_or(defaults.digest_frequency),
            user_id: row.user_id,
        }
    }
}

/// A partial preference change; `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreferencesUpdate {
    #[serde(rename = "p_email_enabled")]
    pub email_enabled: Option<bool>,

    #[serde(rename = "p_in_app_enabled")]
    pub in_app_enabled: Option<bool>,

    #[serde(rename = "p_digest_frequency")]
    pub digest_frequency: Option<DigestFrequency>,
}

impl PreferencesUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email_enabled.is_none() && self.in_app_enabled.is_none() && self.digest_frequency.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub const fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct NotificationRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// Which notifications a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
}

/// Read the caller's preferences, falling back to the defaults when none are stored.
pub async fn get_preferences<S: RemoteSource>(source: &S, user_id: &str) -> Result<NotificationPreferences, QueryError> {
    let request = ReadRequest::new(PREFERENCES_TABLE)
        .select(["user_id", "email_enabled", "in_app_enabled", "digest_frequency"])
        .eq("user_id", user_id);

    let row = source.select_maybe_single::<PreferencesRow>(&request).await?;
    Ok(row.map_or_else(|| NotificationPreferences::defaults_for(user_id), Into::into))
}

/// Apply a preference change and return the stored preferences.
pub async fn update_preferences<S: RemoteSource>(source: &S, update: &PreferencesUpdate) -> Result<NotificationPreferences, QueryError> {
    log::debug!(target: LOG_TARGET, "updating notification preferences: {update:?}");
    let row: PreferencesRow = source.rpc(UPDATE_PREFERENCES_FN, update).await?;
    Ok(row.into())
}

/// List the user's notifications, newest first.
pub async fn list_notifications<S: RemoteSource>(
    source: &S,
    user_id: &str,
    filter: NotificationFilter,
    limit: usize,
) -> Result<Vec<Notification>, QueryError> {
    let mut request = ReadRequest::new(NOTIFICATIONS_TABLE)
        .select(["id", "title", "body", "read_at", "created_at"])
        .eq("user_id", user_id);

    if filter == NotificationFilter::Unread {
        request = request.is_null("read_at");
    }

    let rows: Vec<NotificationRow> = source
        .select(&request.order("created_at", Direction::Desc).limit(limit))
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

#[derive(Debug, Serialize)]
struct MarkReadParams<'a> {
    p_notification_ids: &'a [String],
}

/// Mark notifications as read, returning how many were updated.
///
/// An empty id list is a no-op that makes no remote call.
pub async fn mark_read<S: RemoteSource>(source: &S, ids: &[String]) -> Result<u64, QueryError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let updated: Option<i64> = source.rpc(MARK_READ_FN, &MarkReadParams { p_notification_ids: ids }).await?;
    Ok(count_or_zero(updated))
}

/// Options for the user's preferences, keyed on `("notification-preferences", userId | null)`.
pub fn preferences_options<S>(source: Arc<S>, session: &Session) -> QueryOptions<NotificationPreferences>
where
    S: RemoteSource + 'static,
{
    let key = QueryKey::new([KeyPart::from("notification-preferences"), KeyPart::from(session.user_id.as_deref())]);
    let session = session.clone();

    QueryOptions::new(key, session.user_id.is_some(), move || {
        let source = Arc::clone(&source);
        let session = session.clone();
        async move {
            let user_id = session.require_user()?;
            get_preferences(source.as_ref(), user_id).await
        }
    })
}

/// Options for a notification listing, keyed on `("notifications", userId | null, "all" | "unread")`.
pub fn notifications_options<S>(
    source: Arc<S>,
    session: &Session,
    filter: NotificationFilter,
    limit: usize,
) -> QueryOptions<Vec<Notification>>
where
    S: RemoteSource + 'static,
{
    let key = QueryKey::new([
        KeyPart::from(NOTIFICATIONS_TABLE),
        KeyPart::from(session.user_id.as_deref()),
        KeyPart::from(filter.to_string()),
    ]);
    let session = session.clone();

    QueryOptions::new(key, session.user_id.is_some(), move || {
        let source = Arc::clone(&source);
        let session = session.clone();
        async move {
            let user_id = session.require_user()?;
            list_notifications(source.as_ref(), user_id, filter, limit).await
        }
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::remote::MemorySource;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    fn notifications() -> Vec<Value> {
        vec![
            json!({"id": "n-1", "user_id": "user-1", "title": "Prompt approved", "body": null, "read_at": null, "created_at": "2024-03-08T09:00:00Z"}),
            json!({"id": "n-2", "user_id": "user-1", "title": "New comment", "body": "Looks good", "read_at": "2024-03-09T10:00:00Z", "created_at": "2024-03-09T09:00:00Z"}),
            json!({"id": "n-3", "user_id": "user-1", "title": "Invited", "body": null, "read_at": null, "created_at": "2024-03-10T09:00:00Z"}),
            json!({"id": "n-4", "user_id": "user-2", "title": "Other user", "body": null, "read_at": null, "created_at": "2024-03-10T10:00:00Z"}),
        ]
    }

    #[test]
    fn digest_frequency_command_line_names() {
        assert_eq!(<DigestFrequency as ValueEnum>::from_str("daily", false).unwrap(), DigestFrequency::Daily);
        assert_eq!(<DigestFrequency as ValueEnum>::from_str("never", false).unwrap(), DigestFrequency::Never);
        let _ = <DigestFrequency as ValueEnum>::from_str("monthly", false).unwrap_err();
    }

    #[tokio::test]
    async fn missing_preferences_use_defaults() {
        let source = MemorySource::new().with_table(PREFERENCES_TABLE, Vec::new());
        let prefs = get_preferences(&source, "user-1").await.unwrap();
        assert_eq!(prefs, NotificationPreferences::defaults_for("user-1"));
        assert!(prefs.email_enabled);
        assert_eq!(prefs.digest_frequency, DigestFrequency::Weekly);
    }

    #[tokio::test]
    async fn stored_preferences_fill_nulls_with_defaults() {
        let source = MemorySource::new().with_table(
            PREFERENCES_TABLE,
            vec![json!({"user_id": "user-1", "email_enabled": false, "in_app_enabled": null, "digest_frequency": "daily"})],
        );

        let prefs = get_preferences(&source, "user-1").await.unwrap();
        assert!(!prefs.email_enabled);
        assert!(prefs.in_app_enabled);
        assert_eq!(prefs.digest_frequency, DigestFrequency::Daily);
        assert_eq!(
            serde_json::to_value(&prefs).unwrap(),
            json!({"userId": "user-1", "emailEnabled": false, "inAppEnabled": true, "digestFrequency": "daily"})
        );
    }

    #[tokio::test]
    async fn update_sends_prefixed_parameters() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let captured = Arc::clone(&seen);
        let source = MemorySource::new().with_procedure(UPDATE_PREFERENCES_FN, move |params| {
            *captured.lock().unwrap() = params;
            Ok(json!({"user_id": "user-1", "email_enabled": false, "in_app_enabled": true, "digest_frequency": "never"}))
        });

        let update = PreferencesUpdate {
            email_enabled: Some(false),
            digest_frequency: Some(DigestFrequency::Never),
            ..PreferencesUpdate::default()
        };
        let prefs = update_preferences(&source, &update).await.unwrap();

        assert_eq!(prefs.digest_frequency, DigestFrequency::Never);
        assert_eq!(
            *seen.lock().unwrap(),
            json!({"p_email_enabled": false, "p_in_app_enabled": null, "p_digest_frequency": "never"})
        );
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let source = MemorySource::new().with_table(NOTIFICATIONS_TABLE, notifications());

        let all = list_notifications(&source, "user-1", NotificationFilter::All, 10).await.unwrap();
        let ids: Vec<_> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["n-3", "n-2", "n-1"]);
        assert!(!all[1].is_unread());

        let unread = list_notifications(&source, "user-1", NotificationFilter::Unread, 1).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, "n-3");
    }

    #[tokio::test]
    async fn null_title_passes_through() {
        let source = MemorySource::new().with_table(
            NOTIFICATIONS_TABLE,
            vec![json!({"id": "n-1", "user_id": "user-1", "title": null, "body": null, "read_at": null, "created_at": "2024-03-08T09:00:00Z"})],
        );

        let list = list_notifications(&source, "user-1", NotificationFilter::All, 10).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, None);
        assert_eq!(serde_json::to_value(&list[0]).unwrap()["title"], Value::Null);
    }

    #[tokio::test]
    async fn mark_read_returns_count() {
        let source = MemorySource::new().with_procedure(MARK_READ_FN, |params| {
            let ids = params["p_notification_ids"].as_array().map_or(0, Vec::len);
            Ok(json!(ids))
        });

        let ids = vec!["n-1".to_string(), "n-3".to_string()];
        assert_eq!(mark_read(&source, &ids).await.unwrap(), 2);
        assert_eq!(mark_read(&source, &[]).await.unwrap(), 0);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn mark_read_null_count_is_zero() {
        let source = MemorySource::new().with_procedure(MARK_READ_FN, |_| Ok(Value::Null));
        assert_eq!(mark_read(&source, &["n-1".to_string()]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn options_keys_and_gating() {
        let source = Arc::new(MemorySource::new().with_table(NOTIFICATIONS_TABLE, notifications()));
        let session = Session::new(Some("user-1".to_string()), None);

        let unread = notifications_options(Arc::clone(&source), &session, NotificationFilter::Unread, 10);
        assert_eq!(unread.key.to_string(), r#"["notifications","user-1","unread"]"#);
        assert_eq!(unread.run().await.unwrap().len(), 2);

        let prefs = preferences_options(Arc::clone(&source), &Session::default());
        assert_eq!(prefs.key.to_string(), r#"["notification-preferences",null]"#);
        assert!(!prefs.enabled);

        let calls = source.call_count();
        assert!(matches!(prefs.run().await.unwrap_err(), QueryError::MissingIdentifier("userId")));
        assert_eq!(source.call_count(), calls);
    }
}
