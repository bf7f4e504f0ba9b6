//! Per-user notifications.

use tracing::debug;

use pd_core::error::{PdError, PdResult};
use pd_models::{Database, Notification, User};

pub struct NotificationService {
    database: Database,
}

impl NotificationService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Notifications of `user`, newest first, optionally unread before read.
    pub fn list(&self, user: &User, unread_first: bool) -> PdResult<Vec<Notification>> {
        let conn = self.database.conn()?;
        Notification::list_for_user(&conn, &user.user_id, unread_first)
    }

    pub fn unread_count(&self, user: &User) -> PdResult<i64> {
        let conn = self.database.conn()?;
        Notification::count_unread(&conn, &user.user_id)
    }

    /// Mark one of the user's notifications read.
    pub fn mark_read(&self, user: &User, notification_id: i64) -> PdResult<Notification> {
        let conn = self.database.conn()?;
        let mut notification = Notification::find_by_id(&conn, notification_id)?
            .ok_or_else(|| PdError::not_found("notification", notification_id))?;
        if notification.user_id != user.user_id {
            return Err(PdError::PermissionDenied("not your notification".into()));
        }
        Notification::mark_read(&conn, notification_id)?;
        notification.is_read = true;
        debug!("notification {notification_id} read by {}", user.username);
        Ok(notification)
    }
}
