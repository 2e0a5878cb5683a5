//! In-memory per-user notification feeds.
//!
//! Feeds live for the process lifetime only. The store sits behind a trait
//! so a persistent backend can replace it without touching the callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feed length cap per user; the oldest entry is evicted on overflow.
pub const MAX_PER_USER: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Prepends a notification to the user's feed, evicting past the cap.
    /// `related` is an optional (entityType, entityId) pair.
    async fn add(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
        related: Option<(&str, &str)>,
    ) -> Notification;

    /// The user's feed, newest first.
    async fn list_for_user(&self, user_id: &str) -> Vec<Notification>;

    /// Marks one entry read. Unknown ids are a no-op.
    async fn mark_read(&self, user_id: &str, notification_id: &str);

    async fn mark_all_read(&self, user_id: &str);

    /// Removes one entry. Unknown ids are a no-op.
    async fn delete(&self, user_id: &str, notification_id: &str);

    async fn notify_case_created(&self, user_id: &str, case_title: &str, case_id: &str) {
        self.add(
            user_id,
            "New Case Created",
            &format!("Case \"{case_title}\" has been created"),
            NotificationKind::Success,
            Some(("case", case_id)),
        )
        .await;
    }

    async fn notify_evidence_uploaded(
        &self,
        user_id: &str,
        evidence_name: &str,
        evidence_id: &str,
    ) {
        self.add(
            user_id,
            "Evidence Uploaded",
            &format!("New evidence \"{evidence_name}\" has been uploaded"),
            NotificationKind::Info,
            Some(("evidence", evidence_id)),
        )
        .await;
    }

    async fn notify_critical_event(&self, user_id: &str, event_title: &str, case_id: &str) {
        self.add(
            user_id,
            "Critical Alert",
            event_title,
            NotificationKind::Error,
            Some(("event", case_id)),
        )
        .await;
    }
}

/// Concurrent-map implementation; one entry per user id.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    feeds: DashMap<String, Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn add(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
        related: Option<(&str, &str)>,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            message: message.to_owned(),
            kind,
            read: false,
            created_at: Utc::now(),
            related_entity_type: related.map(|(entity, _)| entity.to_owned()),
            related_entity_id: related.map(|(_, id)| id.to_owned()),
        };

        {
            let mut feed = self.feeds.entry(user_id.to_owned()).or_default();
            feed.insert(0, notification.clone());
            if feed.len() > MAX_PER_USER {
                feed.pop();
            }
        }

        tracing::debug!(user_id = %user_id, title = %notification.title, "notification created");
        notification
    }

    async fn list_for_user(&self, user_id: &str) -> Vec<Notification> {
        self.feeds
            .get(user_id)
            .map(|feed| feed.clone())
            .unwrap_or_default()
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) {
        if let Some(mut feed) = self.feeds.get_mut(user_id) {
            if let Some(notification) = feed.iter_mut().find(|n| n.id == notification_id) {
                notification.read = true;
            }
        }
    }

    async fn mark_all_read(&self, user_id: &str) {
        if let Some(mut feed) = self.feeds.get_mut(user_id) {
            for notification in feed.iter_mut() {
                notification.read = true;
            }
        }
    }

    async fn delete(&self, user_id: &str, notification_id: &str) {
        if let Some(mut feed) = self.feeds.get_mut(user_id) {
            feed.retain(|n| n.id != notification_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feed_is_newest_first_and_capped() {
        let store = InMemoryNotificationStore::new();
        for i in 0..55 {
            store
                .add("u1", &format!("n{i}"), "body", NotificationKind::Info, None)
                .await;
        }

        let feed = store.list_for_user("u1").await;
        assert_eq!(feed.len(), MAX_PER_USER);
        assert_eq!(feed[0].title, "n54");
        // The five oldest were evicted.
        assert_eq!(feed.last().unwrap().title, "n5");
    }

    #[tokio::test]
    async fn feeds_are_isolated_per_user() {
        let store = InMemoryNotificationStore::new();
        store.add("u1", "for u1", "body", NotificationKind::Info, None).await;

        assert_eq!(store.list_for_user("u1").await.len(), 1);
        assert!(store.list_for_user("u2").await.is_empty());
    }

    #[tokio::test]
    async fn read_flags_and_delete() {
        let store = InMemoryNotificationStore::new();
        let first = store.add("u1", "one", "body", NotificationKind::Warning, None).await;
        let second = store.add("u1", "two", "body", NotificationKind::Error, None).await;

        store.mark_read("u1", &first.id).await;
        let feed = store.list_for_user("u1").await;
        assert!(feed.iter().find(|n| n.id == first.id).unwrap().read);
        assert!(!feed.iter().find(|n| n.id == second.id).unwrap().read);

        store.mark_read("u1", "missing-id").await; // no-op

        store.mark_all_read("u1").await;
        assert!(store.list_for_user("u1").await.iter().all(|n| n.read));

        store.delete("u1", &second.id).await;
        let feed = store.list_for_user("u1").await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, first.id);
    }

    #[tokio::test]
    async fn emitters_fill_in_titles_and_related_entities() {
        let store = InMemoryNotificationStore::new();
        store.notify_case_created("u1", "AWS S3 Data Breach", "case-1").await;
        store.notify_evidence_uploaded("u1", "auth.log", "ev-1").await;
        store.notify_critical_event("u1", "Ransomware beacon detected", "case-1").await;

        let feed = store.list_for_user("u1").await;
        assert_eq!(feed.len(), 3);

        assert_eq!(feed[2].title, "New Case Created");
        assert_eq!(feed[2].kind, NotificationKind::Success);
        assert_eq!(feed[2].message, "Case \"AWS S3 Data Breach\" has been created");
        assert_eq!(feed[2].related_entity_type.as_deref(), Some("case"));

        assert_eq!(feed[1].title, "Evidence Uploaded");
        assert_eq!(feed[1].kind, NotificationKind::Info);

        assert_eq!(feed[0].title, "Critical Alert");
        assert_eq!(feed[0].kind, NotificationKind::Error);
        assert_eq!(feed[0].message, "Ransomware beacon detected");
    }
}
