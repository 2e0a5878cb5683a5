use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{decode_enum, decode_string_list, encode_json, Database};
use crate::errors::ApiError;
use crate::models::{
    Case, CaseChanges, CaseDetailResponse, CaseFilter, CaseRef, CaseResponse, CaseStats, NewCase,
    User, UserSummary,
};

/// Case rows joined with their creator and (optionally) assignee.
const CASE_SELECT: &str = "SELECT c.id, c.title, c.description, c.status, c.severity, c.tags, \
     c.location_city, c.location_country, c.location_lat, c.location_lng, \
     c.evidence_count, c.events_count, c.suspicious_activities, \
     c.created_by_id, c.assigned_to_id, c.created_at, c.updated_at, \
     cb.name AS cb_name, cb.email AS cb_email, cb.role AS cb_role, \
     au.name AS au_name, au.email AS au_email, au.role AS au_role \
     FROM cases c \
     JOIN users cb ON cb.id = c.created_by_id \
     LEFT JOIN users au ON au.id = c.assigned_to_id";

impl Database {
    pub async fn create_case(
        &self,
        creator_id: &str,
        input: NewCase,
    ) -> Result<CaseResponse, ApiError> {
        let creator = self
            .find_user_by_id(creator_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let assigned_to = match &input.assigned_to_id {
            Some(id) => Some(self.find_user_by_id(id).await?.ok_or_else(|| {
                ApiError::not_found(format!("User with ID {id} not found"))
            })?),
            None => None,
        };

        let now = Utc::now();
        let case = Case {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            status: input.status,
            severity: input.severity,
            tags: input.tags,
            location_city: input.location_city,
            location_country: input.location_country,
            location_lat: input.location_lat,
            location_lng: input.location_lng,
            evidence_count: 0,
            events_count: 0,
            suspicious_activities: 0,
            created_by_id: creator.id.clone(),
            assigned_to_id: assigned_to.as_ref().map(|user| user.id.clone()),
            created_at: now,
            updated_at: now,
        };
        self.insert_case(&case).await?;

        tracing::info!(case_id = %case.id, severity = case.severity.as_str(), "case created");
        Ok(CaseResponse {
            created_by: creator.to_summary(),
            assigned_to: assigned_to.as_ref().map(User::to_summary),
            case,
        })
    }

    /// Inserts a fully-formed row, counters and id included.
    pub async fn insert_case(&self, case: &Case) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO cases (id, title, description, status, severity, tags, \
             location_city, location_country, location_lat, location_lng, \
             evidence_count, events_count, suspicious_activities, \
             created_by_id, assigned_to_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&case.id)
        .bind(&case.title)
        .bind(&case.description)
        .bind(case.status.as_str())
        .bind(case.severity.as_str())
        .bind(encode_json(&case.tags)?)
        .bind(&case.location_city)
        .bind(&case.location_country)
        .bind(case.location_lat)
        .bind(case.location_lng)
        .bind(case.evidence_count)
        .bind(case.events_count)
        .bind(case.suspicious_activities)
        .bind(&case.created_by_id)
        .bind(&case.assigned_to_id)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseResponse>, ApiError> {
        let mut sql = CASE_SELECT.to_string();
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("c.status = ?");
            binds.push(status.as_str().to_owned());
        }
        if let Some(severity) = filter.severity {
            clauses.push("c.severity = ?");
            binds.push(severity.as_str().to_owned());
        }
        if let Some(assigned_to_id) = &filter.assigned_to_id {
            clauses.push("c.assigned_to_id = ?");
            binds.push(assigned_to_id.clone());
        }
        if let Some(created_by_id) = &filter.created_by_id {
            clauses.push("c.created_by_id = ?");
            binds.push(created_by_id.clone());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY c.created_at DESC");

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(self.pool()).await?;
        rows.iter().map(map_case_row).collect()
    }

    pub async fn get_case(&self, id: &str) -> Result<Option<CaseResponse>, ApiError> {
        let sql = format!("{CASE_SELECT} WHERE c.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool()).await?;
        row.as_ref().map(map_case_row).transpose()
    }

    pub(crate) async fn case_ref(&self, id: &str) -> Result<Option<CaseRef>, ApiError> {
        let row = sqlx::query("SELECT id, title FROM cases WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        match row {
            Some(row) => Ok(Some(CaseRef {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
            })),
            None => Ok(None),
        }
    }

    /// Case plus its nested evidence (with custody chains) and timeline.
    pub async fn get_case_detail(
        &self,
        id: &str,
    ) -> Result<Option<CaseDetailResponse>, ApiError> {
        let Some(case) = self.get_case(id).await? else {
            return Ok(None);
        };

        // The nested records sit under the case itself, so the per-record
        // case ref would only repeat it.
        let mut evidence = self.list_evidence(Some(id)).await?;
        for item in &mut evidence {
            item.case = None;
        }
        let mut timeline_events = self.list_timeline_events(Some(id), None).await?;
        for event in &mut timeline_events {
            event.case = None;
        }

        Ok(Some(CaseDetailResponse { case, evidence, timeline_events }))
    }

    pub async fn update_case(
        &self,
        id: &str,
        changes: &CaseChanges,
    ) -> Result<CaseResponse, ApiError> {
        if self.case_ref(id).await?.is_none() {
            return Err(ApiError::case_not_found(id));
        }
        if let Some(Some(assigned_id)) = &changes.assigned_to_id {
            if self.find_user_by_id(assigned_id).await?.is_none() {
                return Err(ApiError::not_found(format!(
                    "User with ID {assigned_id} not found"
                )));
            }
        }

        // SET clauses and binds are pushed in lockstep; `updated_at` always
        // moves.
        let mut sets: Vec<&'static str> = Vec::new();
        if changes.title.is_some() {
            sets.push("title = ?");
        }
        if changes.description.is_some() {
            sets.push("description = ?");
        }
        if changes.status.is_some() {
            sets.push("status = ?");
        }
        if changes.severity.is_some() {
            sets.push("severity = ?");
        }
        if changes.tags.is_some() {
            sets.push("tags = ?");
        }
        if changes.assigned_to_id.is_some() {
            sets.push("assigned_to_id = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE cases SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(title) = &changes.title {
            query = query.bind(title);
        }
        if let Some(description) = &changes.description {
            query = query.bind(description);
        }
        if let Some(status) = changes.status {
            query = query.bind(status.as_str());
        }
        if let Some(severity) = changes.severity {
            query = query.bind(severity.as_str());
        }
        if let Some(tags) = &changes.tags {
            query = query.bind(encode_json(tags)?);
        }
        if let Some(assigned) = &changes.assigned_to_id {
            query = query.bind(assigned.as_deref());
        }
        query = query.bind(Utc::now()).bind(id);
        query.execute(self.pool()).await?;

        self.get_case(id)
            .await?
            .ok_or_else(|| ApiError::case_not_found(id))
    }

    /// Deletes the case and everything hanging off it in one transaction:
    /// timeline events, custody entries of its evidence, evidence, then the
    /// case row. Returns the case as it was before deletion.
    pub async fn delete_case(&self, id: &str) -> Result<CaseResponse, ApiError> {
        let existing = self
            .get_case(id)
            .await?
            .ok_or_else(|| ApiError::case_not_found(id))?;

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM timeline_events WHERE case_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM chain_of_custody WHERE evidence_id IN \
             (SELECT id FROM evidence WHERE case_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM evidence WHERE case_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cases WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(case_id = %id, "case deleted with related records");
        Ok(existing)
    }

    /// Standalone counter recompute in its own transaction. Idempotent.
    pub async fn recompute_case_stats(&self, case_id: &str) -> Result<CaseStats, ApiError> {
        let mut tx = self.pool().begin().await?;
        let stats = recompute_case_stats_in(&mut tx, case_id).await?;
        tx.commit().await?;
        Ok(stats)
    }
}

/// Recomputes all three case counters from live counts and writes them onto
/// the case row. Runs on the caller's connection so mutating operations can
/// include it in their own transaction.
pub(crate) async fn recompute_case_stats_in(
    conn: &mut SqliteConnection,
    case_id: &str,
) -> Result<CaseStats, ApiError> {
    let evidence_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM evidence WHERE case_id = ?")
            .bind(case_id)
            .fetch_one(&mut *conn)
            .await?;
    let events_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM timeline_events WHERE case_id = ?")
            .bind(case_id)
            .fetch_one(&mut *conn)
            .await?;
    let suspicious_activities: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM timeline_events \
         WHERE case_id = ? AND severity IN ('HIGH', 'CRITICAL')",
    )
    .bind(case_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "UPDATE cases SET evidence_count = ?, events_count = ?, \
         suspicious_activities = ?, updated_at = ? WHERE id = ?",
    )
    .bind(evidence_count)
    .bind(events_count)
    .bind(suspicious_activities)
    .bind(Utc::now())
    .bind(case_id)
    .execute(&mut *conn)
    .await?;

    Ok(CaseStats { evidence_count, events_count, suspicious_activities })
}

fn map_case_row(row: &SqliteRow) -> Result<CaseResponse, ApiError> {
    let status: String = row.try_get("status")?;
    let severity: String = row.try_get("severity")?;
    let tags: String = row.try_get("tags")?;

    let case = Case {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: decode_enum("status", &status)?,
        severity: decode_enum("severity", &severity)?,
        tags: decode_string_list("tags", &tags),
        location_city: row.try_get("location_city")?,
        location_country: row.try_get("location_country")?,
        location_lat: row.try_get("location_lat")?,
        location_lng: row.try_get("location_lng")?,
        evidence_count: row.try_get("evidence_count")?,
        events_count: row.try_get("events_count")?,
        suspicious_activities: row.try_get("suspicious_activities")?,
        created_by_id: row.try_get("created_by_id")?,
        assigned_to_id: row.try_get("assigned_to_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    let created_by_role: String = row.try_get("cb_role")?;
    let created_by = UserSummary {
        id: case.created_by_id.clone(),
        name: row.try_get("cb_name")?,
        email: row.try_get("cb_email")?,
        role: decode_enum("role", &created_by_role)?,
    };

    let assigned_to = match &case.assigned_to_id {
        Some(assigned_id) => {
            let name: Option<String> = row.try_get("au_name")?;
            let email: Option<String> = row.try_get("au_email")?;
            let role: Option<String> = row.try_get("au_role")?;
            match (name, email, role) {
                (Some(name), Some(email), Some(role)) => Some(UserSummary {
                    id: assigned_id.clone(),
                    name,
                    email,
                    role: decode_enum("role", &role)?,
                }),
                _ => None,
            }
        }
        None => None,
    };

    Ok(CaseResponse { case, created_by, assigned_to })
}
