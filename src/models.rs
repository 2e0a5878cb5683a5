use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::CanonicalEnum;

macro_rules! canonical_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl CanonicalEnum for $name {
            const VALUES: &'static [&'static str] = &[$($text),+];

            fn from_canonical(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

canonical_enum!(Role {
    Analyst => "ANALYST",
    Admin => "ADMIN",
});

canonical_enum!(CaseStatus {
    Open => "OPEN",
    InProgress => "IN_PROGRESS",
    Closed => "CLOSED",
    Archived => "ARCHIVED",
});

canonical_enum!(Severity {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

canonical_enum!(EvidenceType {
    Log => "LOG",
    NetworkCapture => "NETWORK_CAPTURE",
    DiskImage => "DISK_IMAGE",
    MemoryDump => "MEMORY_DUMP",
    File => "FILE",
    ApiResponse => "API_RESPONSE",
});

canonical_enum!(EventType {
    Authentication => "AUTHENTICATION",
    Network => "NETWORK",
    FileAccess => "FILE_ACCESS",
    System => "SYSTEM",
    ApiCall => "API_CALL",
    Alert => "ALERT",
});

canonical_enum!(CustodyAction {
    Collected => "COLLECTED",
    Analyzed => "ANALYZED",
    Transferred => "TRANSFERRED",
    Archived => "ARCHIVED",
});

/// Full user row. Never serialized to the API because it carries the
/// password hash; responses use the projections below.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            created_at: self.created_at,
        }
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// User shape returned by the auth endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// User shape returned by the users endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User projection embedded in case responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Minimal user projection embedded in custody entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

/// Minimal case projection embedded in evidence and timeline responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub location_city: Option<String>,
    pub location_country: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub evidence_count: i64,
    pub events_count: i64,
    pub suspicious_activities: i64,
    pub created_by_id: String,
    pub assigned_to_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResponse {
    #[serde(flatten)]
    pub case: Case,
    pub created_by: UserSummary,
    pub assigned_to: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetailResponse {
    #[serde(flatten)]
    pub case: CaseResponse,
    pub evidence: Vec<EvidenceResponse>,
    pub timeline_events: Vec<TimelineEventResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub md5_hash: String,
    pub sha256_hash: String,
    pub metadata: serde_json::Value,
    pub case_id: String,
    pub uploaded_by_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceResponse {
    #[serde(flatten)]
    pub evidence: Evidence,
    pub uploaded_by: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<CaseRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_of_custody: Option<Vec<CustodyEntryResponse>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOfCustodyEntry {
    pub id: String,
    pub action: CustodyAction,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub evidence_id: String,
    pub performed_by_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyEntryResponse {
    #[serde(flatten)]
    pub entry: ChainOfCustodyEntry,
    pub performed_by: UserRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub source: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub ip_addresses: Vec<String>,
    pub usernames: Vec<String>,
    pub files: Vec<String>,
    pub devices: Vec<String>,
    pub case_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventResponse {
    #[serde(flatten)]
    pub event: TimelineEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<CaseRef>,
}

/// Validated payload for creating a case.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub location_city: Option<String>,
    pub location_country: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub assigned_to_id: Option<String>,
}

/// Validated partial update for a case. `assigned_to_id` distinguishes
/// "leave untouched" (None) from "clear the assignee" (Some(None)).
#[derive(Debug, Clone, Default)]
pub struct CaseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub tags: Option<Vec<String>>,
    pub assigned_to_id: Option<Option<String>>,
}

impl CaseChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.severity.is_none()
            && self.tags.is_none()
            && self.assigned_to_id.is_none()
    }
}

/// Filters accepted by the case listing.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub severity: Option<Severity>,
    pub assigned_to_id: Option<String>,
    pub created_by_id: Option<String>,
}

/// Validated payload for creating an evidence record.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub name: String,
    pub evidence_type: EvidenceType,
    pub description: Option<String>,
    pub case_id: String,
    pub metadata: serde_json::Value,
    pub md5_hash: String,
    pub sha256_hash: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
}

/// Validated payload for creating a timeline event.
#[derive(Debug, Clone)]
pub struct NewTimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub source: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub case_id: String,
    pub metadata: serde_json::Value,
    pub ip_addresses: Vec<String>,
    pub usernames: Vec<String>,
    pub files: Vec<String>,
    pub devices: Vec<String>,
}

/// The three denormalized counters maintained on a case row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStats {
    pub evidence_count: i64,
    pub events_count: i64,
    pub suspicious_activities: i64,
}
