use super::common::{Common, CommonArgs};
use super::{Host, render};
use crate::Result;
use crate::notifications::{
    DEFAULT_NOTIFICATION_LIMIT, DigestFrequency, NotificationFilter, PreferencesUpdate, mark_read, notifications_options,
    preferences_options, update_preferences,
};
use crate::query::{KeyPart, QueryKey};
use crate::remote::RemoteSource;
use clap::{Parser, Subcommand};
use ohno::bail;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct NotificationsArgs {
    /// Only list unread notifications
    #[arg(long)]
    pub unread: bool,

    /// Maximum number of notifications to list
    #[arg(long, value_name = "N", default_value_t = DEFAULT_NOTIFICATION_LIMIT)]
    pub limit: usize,

    /// Mark the listed unread notifications as read
    #[arg(long)]
    pub mark_read: bool,

    /// Print the notifications as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub action: PrefsAction,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    /// Show the current notification preferences
    Show {
        /// Print the preferences as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change notification preferences
    Set {
        /// Enable or disable email notifications
        #[arg(long, value_name = "BOOL")]
        email: Option<bool>,

        /// Enable or disable in-app notifications
        #[arg(long, value_name = "BOOL")]
        in_app: Option<bool>,

        /// How often digest emails are sent (never, daily, weekly)
        #[arg(long, value_name = "FREQUENCY")]
        digest: Option<DigestFrequency>,
    },
}

pub async fn process_notifications<H: Host>(host: &mut H, args: &NotificationsArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    show_notifications(&mut common, args).await
}

pub async fn process_prefs<H: Host>(host: &mut H, args: &PrefsArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    manage_prefs(&mut common, &args.action).await
}

pub async fn show_notifications<H: Host, S: RemoteSource + 'static>(
    common: &mut Common<'_, H, S>,
    args: &NotificationsArgs,
) -> Result<()> {
    let filter = if args.unread {
        NotificationFilter::Unread
    } else {
        NotificationFilter::All
    };

    let options = notifications_options(Arc::clone(&common.source), &common.session, filter, args.limit);
    let notifications = common.fetch(options).await?;

    if args.json {
        common.write_json(&*notifications)?;
    } else {
        let mut text = String::new();
        render::notifications(&mut text, &notifications, common.use_colors())?;
        common.write_output(&text);
    }

    if args.mark_read {
        let unread: Vec<String> = notifications.iter().filter(|n| n.is_unread()).map(|n| n.id.clone()).collect();
        let updated = mark_read(common.source.as_ref(), &unread).await?;
        let _ = common.invalidate(&QueryKey::new(["notifications"]));
        log::info!("marked {updated} notifications as read");
    }

    Ok(())
}

pub async fn manage_prefs<H: Host, S: RemoteSource + 'static>(common: &mut Common<'_, H, S>, action: &PrefsAction) -> Result<()> {
    let prefs = match action {
        PrefsAction::Show { json } => {
            let options = preferences_options(Arc::clone(&common.source), &common.session);
            let prefs = common.fetch(options).await?;
            if *json {
                return common.write_json(&*prefs);
            }
            prefs.as_ref().clone()
        }

        PrefsAction::Set { email, in_app, digest } => {
            let update = PreferencesUpdate {
                email_enabled: *email,
                in_app_enabled: *in_app,
                digest_frequency: *digest,
            };

            if update.is_empty() {
                bail!("nothing to change; pass --email, --in-app or --digest");
            }

            let _ = common.session.require_user()?;
            let prefs = update_preferences(common.source.as_ref(), &update).await?;
            let _ = common.invalidate(&QueryKey::new([
                KeyPart::from("notification-preferences"),
                KeyPart::from(common.session.user_id.as_deref()),
            ]));
            prefs
        }
    };

    let mut text = String::new();
    render::preferences(&mut text, &prefs)?;
    common.write_output(&text);
    Ok(())
}
