use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::cases::recompute_case_stats_in;
use super::{decode_enum, decode_json_object, decode_string_list, encode_json, Database};
use crate::errors::ApiError;
use crate::models::{CaseRef, NewTimelineEvent, Severity, TimelineEvent, TimelineEventResponse};

/// Timeline rows joined with the owning case title.
const TIMELINE_SELECT: &str = "SELECT te.id, te.timestamp, te.event_type, te.source, \
     te.severity, te.title, te.description, te.metadata, te.ip_addresses, \
     te.usernames, te.files, te.devices, te.case_id, te.created_at, \
     c.title AS case_title \
     FROM timeline_events te \
     JOIN cases c ON c.id = te.case_id";

impl Database {
    /// Records a timeline event; the insert and the case counter recompute
    /// commit or roll back together.
    pub async fn create_timeline_event(
        &self,
        input: NewTimelineEvent,
    ) -> Result<TimelineEventResponse, ApiError> {
        let case = self
            .case_ref(&input.case_id)
            .await?
            .ok_or_else(|| ApiError::case_not_found(&input.case_id))?;

        let event = TimelineEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: input.timestamp,
            event_type: input.event_type,
            source: input.source,
            severity: input.severity,
            title: input.title,
            description: input.description,
            metadata: input.metadata,
            ip_addresses: input.ip_addresses,
            usernames: input.usernames,
            files: input.files,
            devices: input.devices,
            case_id: input.case_id,
            created_at: Utc::now(),
        };

        let mut tx = self.pool().begin().await?;
        insert_timeline_row(&mut tx, &event).await?;
        recompute_case_stats_in(&mut tx, &event.case_id).await?;
        tx.commit().await?;

        tracing::info!(
            event_id = %event.id,
            case_id = %event.case_id,
            severity = event.severity.as_str(),
            "timeline event recorded"
        );
        Ok(TimelineEventResponse { event, case: Some(case) })
    }

    /// Inserts a fully-formed row without the counter side effect.
    pub async fn insert_timeline_event(&self, event: &TimelineEvent) -> Result<(), ApiError> {
        let mut conn = self.pool().acquire().await?;
        insert_timeline_row(&mut conn, event).await
    }

    pub async fn list_timeline_events(
        &self,
        case_id: Option<&str>,
        severity: Option<Severity>,
    ) -> Result<Vec<TimelineEventResponse>, ApiError> {
        let mut sql = TIMELINE_SELECT.to_string();
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(case_id) = case_id {
            clauses.push("te.case_id = ?");
            binds.push(case_id.to_owned());
        }
        if let Some(severity) = severity {
            clauses.push("te.severity = ?");
            binds.push(severity.as_str().to_owned());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY te.timestamp DESC");

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(self.pool()).await?;
        rows.iter().map(map_event_row).collect()
    }

    pub async fn get_timeline_event(
        &self,
        id: &str,
    ) -> Result<Option<TimelineEventResponse>, ApiError> {
        let sql = format!("{TIMELINE_SELECT} WHERE te.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool()).await?;
        row.as_ref().map(map_event_row).transpose()
    }

    /// Deletes the event and recomputes the case counters in the same
    /// transaction. Returns the record as it was.
    pub async fn delete_timeline_event(
        &self,
        id: &str,
    ) -> Result<TimelineEventResponse, ApiError> {
        let existing = self.get_timeline_event(id).await?.ok_or_else(|| {
            ApiError::not_found(format!("Timeline event with ID {id} not found"))
        })?;

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM timeline_events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        recompute_case_stats_in(&mut tx, &existing.event.case_id).await?;
        tx.commit().await?;

        tracing::info!(event_id = %id, "timeline event deleted");
        Ok(existing)
    }
}

async fn insert_timeline_row(
    conn: &mut SqliteConnection,
    event: &TimelineEvent,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO timeline_events (id, timestamp, event_type, source, severity, title, \
         description, metadata, ip_addresses, usernames, files, devices, case_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(event.timestamp)
    .bind(event.event_type.as_str())
    .bind(&event.source)
    .bind(event.severity.as_str())
    .bind(&event.title)
    .bind(&event.description)
    .bind(encode_json(&event.metadata)?)
    .bind(encode_json(&event.ip_addresses)?)
    .bind(encode_json(&event.usernames)?)
    .bind(encode_json(&event.files)?)
    .bind(encode_json(&event.devices)?)
    .bind(&event.case_id)
    .bind(event.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn map_event_row(row: &SqliteRow) -> Result<TimelineEventResponse, ApiError> {
    let event_type: String = row.try_get("event_type")?;
    let severity: String = row.try_get("severity")?;
    let metadata: String = row.try_get("metadata")?;
    let ip_addresses: String = row.try_get("ip_addresses")?;
    let usernames: String = row.try_get("usernames")?;
    let files: String = row.try_get("files")?;
    let devices: String = row.try_get("devices")?;

    let event = TimelineEvent {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        event_type: decode_enum("type", &event_type)?,
        source: row.try_get("source")?,
        severity: decode_enum("severity", &severity)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        metadata: decode_json_object("metadata", &metadata),
        ip_addresses: decode_string_list("ip_addresses", &ip_addresses),
        usernames: decode_string_list("usernames", &usernames),
        files: decode_string_list("files", &files),
        devices: decode_string_list("devices", &devices),
        case_id: row.try_get("case_id")?,
        created_at: row.try_get("created_at")?,
    };
    let case = Some(CaseRef {
        id: event.case_id.clone(),
        title: row.try_get("case_title")?,
    });

    Ok(TimelineEventResponse { event, case })
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::errors::ApiError;
    use crate::models::{EventType, NewTimelineEvent, Severity};
    use chrono::{Duration, Utc};

    fn new_event(case_id: &str, severity: Severity, minutes_ago: i64) -> NewTimelineEvent {
        NewTimelineEvent {
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            event_type: EventType::Authentication,
            source: "auth-gateway".to_owned(),
            severity,
            title: "Failed login burst".to_owned(),
            description: "Multiple failed logins from a single address".to_owned(),
            case_id: case_id.to_owned(),
            metadata: serde_json::json!({}),
            ip_addresses: vec!["203.0.113.7".to_owned()],
            usernames: vec!["root".to_owned()],
            files: Vec::new(),
            devices: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_updates_counters_and_suspicious_count() {
        let db = test_support::database().await;
        let user = test_support::analyst(&db, "events@forensics.io").await;
        let case = db
            .create_case(&user.id, test_support::new_case("Event case"))
            .await
            .unwrap();

        db.create_timeline_event(new_event(&case.case.id, Severity::High, 30))
            .await
            .unwrap();
        db.create_timeline_event(new_event(&case.case.id, Severity::Low, 10))
            .await
            .unwrap();

        let refreshed = db.get_case(&case.case.id).await.unwrap().unwrap();
        assert_eq!(refreshed.case.events_count, 2);
        assert_eq!(refreshed.case.suspicious_activities, 1);
    }

    #[tokio::test]
    async fn list_orders_by_event_time_and_filters_by_severity() {
        let db = test_support::database().await;
        let user = test_support::analyst(&db, "order@forensics.io").await;
        let case = db
            .create_case(&user.id, test_support::new_case("Ordering case"))
            .await
            .unwrap();

        // Inserted out of chronological order on purpose.
        db.create_timeline_event(new_event(&case.case.id, Severity::Low, 5))
            .await
            .unwrap();
        db.create_timeline_event(new_event(&case.case.id, Severity::Critical, 60))
            .await
            .unwrap();

        let all = db.list_timeline_events(Some(&case.case.id), None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].event.timestamp > all[1].event.timestamp);

        let critical = db
            .list_timeline_events(Some(&case.case.id), Some(Severity::Critical))
            .await
            .unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].event.severity, Severity::Critical);
    }

    #[tokio::test]
    async fn delete_recomputes_counters() {
        let db = test_support::database().await;
        let user = test_support::analyst(&db, "cleanup@forensics.io").await;
        let case = db
            .create_case(&user.id, test_support::new_case("Cleanup case"))
            .await
            .unwrap();

        let event = db
            .create_timeline_event(new_event(&case.case.id, Severity::Critical, 1))
            .await
            .unwrap();
        let deleted = db.delete_timeline_event(&event.event.id).await.unwrap();
        assert_eq!(deleted.event.id, event.event.id);

        let refreshed = db.get_case(&case.case.id).await.unwrap().unwrap();
        assert_eq!(refreshed.case.events_count, 0);
        assert_eq!(refreshed.case.suspicious_activities, 0);

        let err = db.delete_timeline_event(&event.event.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn create_against_missing_case_is_not_found() {
        let db = test_support::database().await;

        let err = db
            .create_timeline_event(new_event("no-such-case", Severity::Low, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
