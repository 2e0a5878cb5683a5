//! Rebuilds the demo dataset: two accounts, four cloud-incident cases, and a
//! fully worked AWS breach case with evidence, custody history and timeline.
//! Destructive; it wipes existing rows first.
//!
//! Run with `cargo run --bin seed`.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use case_service::auth::PasswordService;
use case_service::config::AppConfig;
use case_service::models::{
    Case, CaseStatus, CustodyAction, EventType, Evidence, EvidenceType, Role, Severity,
    TimelineEvent, User,
};
use case_service::repository::Database;

const ANALYST_ID: &str = "00000000-0000-0000-0000-000000000001";
const ADMIN_ID: &str = "00000000-0000-0000-0000-000000000002";
const CASE_AWS_ID: &str = "00000000-0000-0000-0000-000000000011";
const CASE_IOT_ID: &str = "00000000-0000-0000-0000-000000000012";
const CASE_AZURE_ID: &str = "00000000-0000-0000-0000-000000000013";
const CASE_GCP_ID: &str = "00000000-0000-0000-0000-000000000014";
const EVIDENCE_CLOUDTRAIL_ID: &str = "00000000-0000-0000-0000-000000000021";
const EVIDENCE_S3_LOGS_ID: &str = "00000000-0000-0000-0000-000000000022";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;
    db.create_tables().await.context("ensuring database schema")?;

    tracing::info!("clearing existing data");
    db.clear_all().await?;

    tracing::info!("creating users");
    let password_hash = PasswordService::hash_password("demo123")?;
    let now = Utc::now();

    let analyst = User {
        id: ANALYST_ID.to_string(),
        email: "analyst@forensics.io".to_string(),
        password_hash: password_hash.clone(),
        name: "Alex Johnson".to_string(),
        role: Role::Analyst,
        avatar: None,
        created_at: now,
    };
    let admin = User {
        id: ADMIN_ID.to_string(),
        email: "admin@forensics.io".to_string(),
        password_hash,
        name: "Sarah Admin".to_string(),
        role: Role::Admin,
        avatar: None,
        created_at: now,
    };
    db.insert_user(&analyst).await?;
    db.insert_user(&admin).await?;

    tracing::info!("creating cases");
    let cases = [
        Case {
            id: CASE_AWS_ID.to_string(),
            title: "AWS S3 Bucket Data Breach".to_string(),
            description: "Unauthorized access detected to production S3 bucket containing \
                          customer PII. Multiple GET requests from unknown IP addresses."
                .to_string(),
            status: CaseStatus::InProgress,
            severity: Severity::Critical,
            tags: tags(&["aws", "data-breach", "s3", "pii"]),
            location_city: Some("San Francisco".to_string()),
            location_country: Some("USA".to_string()),
            location_lat: Some(37.7749),
            location_lng: Some(-122.4194),
            evidence_count: 0,
            events_count: 0,
            suspicious_activities: 0,
            created_by_id: analyst.id.clone(),
            assigned_to_id: Some(analyst.id.clone()),
            created_at: now,
            updated_at: now,
        },
        Case {
            id: CASE_IOT_ID.to_string(),
            title: "IoT Camera Botnet Activity".to_string(),
            description: "Smart security cameras exhibiting unusual network behavior. \
                          Suspected Mirai variant infection across 50+ devices."
                .to_string(),
            status: CaseStatus::Open,
            severity: Severity::High,
            tags: tags(&["iot", "botnet", "mirai", "cameras"]),
            location_city: Some("London".to_string()),
            location_country: Some("UK".to_string()),
            location_lat: Some(51.5074),
            location_lng: Some(-0.1278),
            evidence_count: 0,
            events_count: 0,
            suspicious_activities: 0,
            created_by_id: admin.id.clone(),
            assigned_to_id: None,
            created_at: now,
            updated_at: now,
        },
        Case {
            id: CASE_AZURE_ID.to_string(),
            title: "Azure Container Registry Compromise".to_string(),
            description: "Malicious Docker image pushed to private ACR. Image contains \
                          cryptocurrency miner and reverse shell."
                .to_string(),
            status: CaseStatus::InProgress,
            severity: Severity::Critical,
            tags: tags(&["azure", "container", "malware", "cryptominer"]),
            location_city: Some("Berlin".to_string()),
            location_country: Some("Germany".to_string()),
            location_lat: Some(52.52),
            location_lng: Some(13.405),
            evidence_count: 0,
            events_count: 0,
            suspicious_activities: 0,
            created_by_id: analyst.id.clone(),
            assigned_to_id: Some(analyst.id.clone()),
            created_at: now,
            updated_at: now,
        },
        Case {
            id: CASE_GCP_ID.to_string(),
            title: "GCP API Key Exposure".to_string(),
            description: "GCP service account key found in public GitHub repository. \
                          Multiple API calls from various locations detected."
                .to_string(),
            status: CaseStatus::Closed,
            severity: Severity::High,
            tags: tags(&["gcp", "credential-leak", "github", "api"]),
            location_city: Some("Tokyo".to_string()),
            location_country: Some("Japan".to_string()),
            location_lat: Some(35.6762),
            location_lng: Some(139.6503),
            evidence_count: 0,
            events_count: 0,
            suspicious_activities: 0,
            created_by_id: analyst.id.clone(),
            assigned_to_id: Some(analyst.id.clone()),
            created_at: now,
            updated_at: now,
        },
    ];
    for case in &cases {
        db.insert_case(case).await?;
    }

    tracing::info!("creating evidence");
    let evidence = [
        Evidence {
            id: EVIDENCE_CLOUDTRAIL_ID.to_string(),
            name: "cloudtrail_logs_20241220.json".to_string(),
            evidence_type: EvidenceType::Log,
            description: Some(
                "AWS CloudTrail logs showing unauthorized S3 access attempts".to_string(),
            ),
            file_path: Some("/evidence/cloudtrail_logs_20241220.json".to_string()),
            file_size: Some(2_457_600),
            md5_hash: "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6".to_string(),
            sha256_hash: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                .to_string(),
            metadata: json!({
                "source": "AWS CloudTrail",
                "region": "us-west-2",
                "timeRange": "2024-12-20 00:00:00 - 08:30:00",
            }),
            case_id: CASE_AWS_ID.to_string(),
            uploaded_by_id: analyst.id.clone(),
            created_at: now,
            updated_at: now,
        },
        Evidence {
            id: EVIDENCE_S3_LOGS_ID.to_string(),
            name: "s3_access_logs.csv".to_string(),
            evidence_type: EvidenceType::Log,
            description: Some("S3 bucket access logs for the affected bucket".to_string()),
            file_path: Some("/evidence/s3_access_logs.csv".to_string()),
            file_size: Some(1_843_200),
            md5_hash: "b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7".to_string(),
            sha256_hash: "f4a8c55d8ed8b5c8e3a4f3c8996fb92427ae41e4649b934ca495991b7852b855"
                .to_string(),
            metadata: json!({
                "source": "S3 Server Access Logs",
                "bucket": "prod-customer-data",
            }),
            case_id: CASE_AWS_ID.to_string(),
            uploaded_by_id: analyst.id.clone(),
            created_at: now,
            updated_at: now,
        },
    ];
    for item in &evidence {
        db.insert_evidence(item).await?;
    }

    tracing::info!("creating chain of custody");
    db.add_custody_entry(
        EVIDENCE_CLOUDTRAIL_ID,
        CustodyAction::Collected,
        Some("Collected from AWS CloudTrail via API".to_string()),
        &analyst.id,
    )
    .await?;
    db.add_custody_entry(
        EVIDENCE_CLOUDTRAIL_ID,
        CustodyAction::Analyzed,
        Some("Initial analysis completed".to_string()),
        &analyst.id,
    )
    .await?;

    tracing::info!("creating timeline events");
    let events = [
        TimelineEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: parse_utc("2024-12-20T03:24:15Z")?,
            event_type: EventType::Authentication,
            source: "AWS CloudTrail".to_string(),
            severity: Severity::Medium,
            title: "Unusual API Authentication".to_string(),
            description: "API authentication from unknown IP address 185.220.101.42".to_string(),
            metadata: json!({
                "ipAddress": "185.220.101.42",
                "userAgent": "aws-cli/2.13.0",
                "country": "Russia",
            }),
            ip_addresses: vec!["185.220.101.42".to_string()],
            usernames: vec!["arn:aws:iam::123456789012:user/unknown".to_string()],
            files: Vec::new(),
            devices: Vec::new(),
            case_id: CASE_AWS_ID.to_string(),
            created_at: now,
        },
        TimelineEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: parse_utc("2024-12-20T03:25:03Z")?,
            event_type: EventType::ApiCall,
            source: "AWS CloudTrail".to_string(),
            severity: Severity::Critical,
            title: "S3 ListBucket Operation".to_string(),
            description: "Unauthorized ListBucket operation on prod-customer-data".to_string(),
            metadata: json!({
                "bucket": "prod-customer-data",
                "operation": "ListBucket",
                "success": true,
            }),
            ip_addresses: vec!["185.220.101.42".to_string()],
            usernames: Vec::new(),
            files: Vec::new(),
            devices: Vec::new(),
            case_id: CASE_AWS_ID.to_string(),
            created_at: now,
        },
        TimelineEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: parse_utc("2024-12-20T03:26:18Z")?,
            event_type: EventType::ApiCall,
            source: "AWS CloudTrail".to_string(),
            severity: Severity::Critical,
            title: "Multiple S3 GetObject Calls".to_string(),
            description: "247 GetObject operations performed within 3 minutes".to_string(),
            metadata: json!({
                "bucket": "prod-customer-data",
                "objectsAccessed": 247,
                "dataTransferred": "1.2 GB",
            }),
            ip_addresses: vec!["185.220.101.42".to_string()],
            usernames: Vec::new(),
            files: Vec::new(),
            devices: Vec::new(),
            case_id: CASE_AWS_ID.to_string(),
            created_at: now,
        },
        TimelineEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: parse_utc("2024-12-20T03:42:05Z")?,
            event_type: EventType::Alert,
            source: "AWS GuardDuty".to_string(),
            severity: Severity::Critical,
            title: "GuardDuty Alert: Exfiltration".to_string(),
            description: "Data exfiltration detected from S3 bucket".to_string(),
            metadata: json!({
                "alertType": "Exfiltration:S3/ObjectRead.Unusual",
                "confidence": "High",
            }),
            ip_addresses: vec!["185.220.101.42".to_string()],
            usernames: Vec::new(),
            files: Vec::new(),
            devices: Vec::new(),
            case_id: CASE_AWS_ID.to_string(),
            created_at: now,
        },
    ];
    for event in &events {
        db.insert_timeline_event(event).await?;
    }

    tracing::info!("refreshing case statistics");
    let stats = db.recompute_case_stats(CASE_AWS_ID).await?;
    tracing::info!(
        evidence = stats.evidence_count,
        events = stats.events_count,
        suspicious = stats.suspicious_activities,
        "AWS breach case statistics"
    );

    tracing::info!("seed completed");
    tracing::info!("demo credentials: analyst@forensics.io / demo123, admin@forensics.io / demo123");
    tracing::info!("demo case: {CASE_AWS_ID}");
    Ok(())
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn parse_utc(value: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(value.parse::<DateTime<Utc>>()?)
}
