use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

use super::cases::recompute_case_stats_in;
use super::{decode_enum, decode_json_object, encode_json, Database};
use crate::errors::ApiError;
use crate::models::{
    CaseRef, ChainOfCustodyEntry, CustodyAction, CustodyEntryResponse, Evidence,
    EvidenceResponse, NewEvidence, UserRef, UserSummary,
};

/// Evidence rows joined with the uploader and owning case title.
const EVIDENCE_SELECT: &str = "SELECT e.id, e.name, e.evidence_type, e.description, \
     e.file_path, e.file_size, e.md5_hash, e.sha256_hash, e.metadata, \
     e.case_id, e.uploaded_by_id, e.created_at, e.updated_at, \
     u.name AS up_name, u.email AS up_email, u.role AS up_role, \
     c.title AS case_title \
     FROM evidence e \
     JOIN users u ON u.id = e.uploaded_by_id \
     JOIN cases c ON c.id = e.case_id";

impl Database {
    /// Records evidence. The row insert, its COLLECTED custody entry, and
    /// the case counter recompute commit or roll back together.
    pub async fn create_evidence(
        &self,
        uploader_id: &str,
        input: NewEvidence,
    ) -> Result<EvidenceResponse, ApiError> {
        let case = self
            .case_ref(&input.case_id)
            .await?
            .ok_or_else(|| ApiError::case_not_found(&input.case_id))?;
        let uploader = self
            .find_user_by_id(uploader_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let now = Utc::now();
        let evidence = Evidence {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            evidence_type: input.evidence_type,
            description: input.description,
            file_path: input.file_path,
            file_size: input.file_size,
            md5_hash: input.md5_hash,
            sha256_hash: input.sha256_hash,
            metadata: input.metadata,
            case_id: input.case_id,
            uploaded_by_id: uploader.id.clone(),
            created_at: now,
            updated_at: now,
        };
        let custody = ChainOfCustodyEntry {
            id: Uuid::new_v4().to_string(),
            action: CustodyAction::Collected,
            notes: Some("Evidence collected and uploaded".to_owned()),
            timestamp: now,
            evidence_id: evidence.id.clone(),
            performed_by_id: uploader.id.clone(),
        };

        let mut tx = self.pool().begin().await?;
        insert_evidence_row(&mut tx, &evidence).await?;
        insert_custody_row(&mut tx, &custody).await?;
        recompute_case_stats_in(&mut tx, &evidence.case_id).await?;
        tx.commit().await?;

        tracing::info!(evidence_id = %evidence.id, case_id = %evidence.case_id, "evidence recorded");
        Ok(EvidenceResponse {
            uploaded_by: uploader.to_summary(),
            case: Some(case),
            chain_of_custody: Some(vec![CustodyEntryResponse {
                performed_by: UserRef { id: uploader.id.clone(), name: uploader.name.clone() },
                entry: custody,
            }]),
            evidence,
        })
    }

    /// Inserts a fully-formed row without custody or counter side effects.
    pub async fn insert_evidence(&self, evidence: &Evidence) -> Result<(), ApiError> {
        let mut conn = self.pool().acquire().await?;
        insert_evidence_row(&mut conn, evidence).await
    }

    pub async fn add_custody_entry(
        &self,
        evidence_id: &str,
        action: CustodyAction,
        notes: Option<String>,
        performed_by_id: &str,
    ) -> Result<CustodyEntryResponse, ApiError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evidence WHERE id = ?")
            .bind(evidence_id)
            .fetch_one(self.pool())
            .await?;
        if exists == 0 {
            return Err(ApiError::not_found(format!(
                "Evidence with ID {evidence_id} not found"
            )));
        }
        let user = self
            .find_user_by_id(performed_by_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let entry = ChainOfCustodyEntry {
            id: Uuid::new_v4().to_string(),
            action,
            notes,
            timestamp: Utc::now(),
            evidence_id: evidence_id.to_owned(),
            performed_by_id: user.id.clone(),
        };
        let mut conn = self.pool().acquire().await?;
        insert_custody_row(&mut conn, &entry).await?;

        Ok(CustodyEntryResponse {
            performed_by: UserRef { id: user.id.clone(), name: user.name },
            entry,
        })
    }

    pub async fn list_evidence(
        &self,
        case_id: Option<&str>,
    ) -> Result<Vec<EvidenceResponse>, ApiError> {
        let mut sql = EVIDENCE_SELECT.to_string();
        if case_id.is_some() {
            sql.push_str(" WHERE e.case_id = ?");
        }
        sql.push_str(" ORDER BY e.created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(case_id) = case_id {
            query = query.bind(case_id);
        }
        let rows = query.fetch_all(self.pool()).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(map_evidence_row(row)?);
        }

        let ids: Vec<String> = items.iter().map(|item| item.evidence.id.clone()).collect();
        let mut custody = self.custody_for_evidence(&ids).await?;
        for item in &mut items {
            item.chain_of_custody = Some(custody.remove(&item.evidence.id).unwrap_or_default());
        }
        Ok(items)
    }

    pub async fn get_evidence(&self, id: &str) -> Result<Option<EvidenceResponse>, ApiError> {
        let sql = format!("{EVIDENCE_SELECT} WHERE e.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool()).await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut item = map_evidence_row(&row)?;
        let mut custody = self
            .custody_for_evidence(std::slice::from_ref(&item.evidence.id))
            .await?;
        item.chain_of_custody = Some(custody.remove(&item.evidence.id).unwrap_or_default());
        Ok(Some(item))
    }

    /// Deletes the evidence and its custody entries, recomputing the case
    /// counters in the same transaction. Returns the record as it was.
    pub async fn delete_evidence(&self, id: &str) -> Result<EvidenceResponse, ApiError> {
        let existing = self
            .get_evidence(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Evidence with ID {id} not found")))?;

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM chain_of_custody WHERE evidence_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM evidence WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        recompute_case_stats_in(&mut tx, &existing.evidence.case_id).await?;
        tx.commit().await?;

        tracing::info!(evidence_id = %id, "evidence deleted");
        Ok(existing)
    }

    /// Custody entries for a batch of evidence ids, oldest first, grouped by
    /// evidence id.
    async fn custody_for_evidence(
        &self,
        evidence_ids: &[String],
    ) -> Result<HashMap<String, Vec<CustodyEntryResponse>>, ApiError> {
        if evidence_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; evidence_ids.len()].join(", ");
        let sql = format!(
            "SELECT coc.id, coc.action, coc.notes, coc.timestamp, coc.evidence_id, \
             coc.performed_by_id, u.name AS performed_by_name \
             FROM chain_of_custody coc \
             JOIN users u ON u.id = coc.performed_by_id \
             WHERE coc.evidence_id IN ({placeholders}) \
             ORDER BY coc.timestamp ASC"
        );
        let mut query = sqlx::query(&sql);
        for id in evidence_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(self.pool()).await?;

        let mut grouped: HashMap<String, Vec<CustodyEntryResponse>> = HashMap::new();
        for row in &rows {
            let entry = map_custody_row(row)?;
            grouped
                .entry(entry.entry.evidence_id.clone())
                .or_default()
                .push(entry);
        }
        Ok(grouped)
    }
}

async fn insert_evidence_row(
    conn: &mut SqliteConnection,
    evidence: &Evidence,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO evidence (id, name, evidence_type, description, file_path, file_size, \
         md5_hash, sha256_hash, metadata, case_id, uploaded_by_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&evidence.id)
    .bind(&evidence.name)
    .bind(evidence.evidence_type.as_str())
    .bind(&evidence.description)
    .bind(&evidence.file_path)
    .bind(evidence.file_size)
    .bind(&evidence.md5_hash)
    .bind(&evidence.sha256_hash)
    .bind(encode_json(&evidence.metadata)?)
    .bind(&evidence.case_id)
    .bind(&evidence.uploaded_by_id)
    .bind(evidence.created_at)
    .bind(evidence.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_custody_row(
    conn: &mut SqliteConnection,
    entry: &ChainOfCustodyEntry,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO chain_of_custody (id, action, notes, timestamp, evidence_id, \
         performed_by_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(entry.action.as_str())
    .bind(&entry.notes)
    .bind(entry.timestamp)
    .bind(&entry.evidence_id)
    .bind(&entry.performed_by_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn map_evidence_row(row: &SqliteRow) -> Result<EvidenceResponse, ApiError> {
    let evidence_type: String = row.try_get("evidence_type")?;
    let metadata: String = row.try_get("metadata")?;

    let evidence = Evidence {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        evidence_type: decode_enum("type", &evidence_type)?,
        description: row.try_get("description")?,
        file_path: row.try_get("file_path")?,
        file_size: row.try_get("file_size")?,
        md5_hash: row.try_get("md5_hash")?,
        sha256_hash: row.try_get("sha256_hash")?,
        metadata: decode_json_object("metadata", &metadata),
        case_id: row.try_get("case_id")?,
        uploaded_by_id: row.try_get("uploaded_by_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    let uploader_role: String = row.try_get("up_role")?;
    let uploaded_by = UserSummary {
        id: evidence.uploaded_by_id.clone(),
        name: row.try_get("up_name")?,
        email: row.try_get("up_email")?,
        role: decode_enum("role", &uploader_role)?,
    };
    let case = Some(CaseRef {
        id: evidence.case_id.clone(),
        title: row.try_get("case_title")?,
    });

    Ok(EvidenceResponse { evidence, uploaded_by, case, chain_of_custody: None })
}

fn map_custody_row(row: &SqliteRow) -> Result<CustodyEntryResponse, ApiError> {
    let action: String = row.try_get("action")?;
    let entry = ChainOfCustodyEntry {
        id: row.try_get("id")?,
        action: decode_enum("action", &action)?,
        notes: row.try_get("notes")?,
        timestamp: row.try_get("timestamp")?,
        evidence_id: row.try_get("evidence_id")?,
        performed_by_id: row.try_get("performed_by_id")?,
    };
    let performed_by = UserRef {
        id: entry.performed_by_id.clone(),
        name: row.try_get("performed_by_name")?,
    };
    Ok(CustodyEntryResponse { entry, performed_by })
}
