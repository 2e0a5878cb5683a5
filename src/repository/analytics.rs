use sqlx::Row;

use super::{decode_enum, Database};
use crate::analytics::{DashboardCounts, SeverityCount, SourceCount};
use crate::errors::ApiError;
use crate::models::Severity;

impl Database {
    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, ApiError> {
        let total_events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM timeline_events")
            .fetch_one(self.pool())
            .await?;
        let critical_cases: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cases WHERE severity = 'CRITICAL'")
                .fetch_one(self.pool())
                .await?;
        let active_cases: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE status IN ('OPEN', 'IN_PROGRESS')",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(DashboardCounts { total_events, critical_cases, active_cases })
    }

    pub async fn severity_distribution(&self) -> Result<Vec<SeverityCount>, ApiError> {
        let rows = sqlx::query(
            "SELECT severity, COUNT(*) AS count FROM timeline_events \
             GROUP BY severity ORDER BY count DESC",
        )
        .fetch_all(self.pool())
        .await?;

        let mut distribution = Vec::with_capacity(rows.len());
        for row in &rows {
            let severity: String = row.try_get("severity")?;
            distribution.push(SeverityCount {
                severity: decode_enum::<Severity>("severity", &severity)?,
                count: row.try_get("count")?,
            });
        }
        Ok(distribution)
    }

    /// Top ten event sources with their share of all events.
    pub async fn source_distribution(&self) -> Result<Vec<SourceCount>, ApiError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM timeline_events")
            .fetch_one(self.pool())
            .await?;
        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS count FROM timeline_events \
             GROUP BY source ORDER BY count DESC LIMIT 10",
        )
        .fetch_all(self.pool())
        .await?;

        let mut distribution = Vec::with_capacity(rows.len());
        for row in &rows {
            let count: i64 = row.try_get("count")?;
            let percentage = if total == 0 {
                "0.00".to_owned()
            } else {
                format!("{:.2}", (count as f64 / total as f64) * 100.0)
            };
            distribution.push(SourceCount {
                source: row.try_get("source")?,
                count,
                percentage,
            });
        }
        Ok(distribution)
    }
}
