//! Read-only analytics: dashboard aggregates over real rows plus a
//! synthetic per-hour activity series for the frontend charts.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::Severity;

/// Fixed posture score surfaced on the dashboard; no scoring model sits
/// behind it.
pub const SECURITY_SCORE: i64 = 87;

/// Raw counts the dashboard is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct DashboardCounts {
    pub total_events: i64,
    pub critical_cases: i64,
    pub active_cases: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_events: i64,
    pub critical_alerts: i64,
    pub active_incidents: i64,
    pub security_score: i64,
    pub threats_blocked: i64,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesPoint {
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub events: i64,
    pub threats: i64,
    pub critical: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
    /// Share of all events, rendered with two decimals (`"42.86"`).
    pub percentage: String,
}

pub fn dashboard(counts: DashboardCounts, now: DateTime<Utc>) -> DashboardResponse {
    DashboardResponse {
        total_events: counts.total_events,
        critical_alerts: counts.critical_cases,
        active_incidents: counts.active_cases,
        security_score: SECURITY_SCORE,
        threats_blocked: (counts.total_events as f64 * 0.3) as i64,
        last_update: now,
    }
}

/// One point per hour for the trailing `hours` hours plus the current one.
/// Volumes are synthetic: a business-hours (08:00-18:00 UTC) base of 400
/// events against 200 off-hours, plus random variance.
pub fn time_series(hours: i64, now: DateTime<Utc>) -> Vec<TimeSeriesPoint> {
    let mut rng = rand::thread_rng();
    let mut points = Vec::with_capacity((hours + 1).max(0) as usize);

    for i in 0..=hours {
        let timestamp = now - Duration::hours(hours - i);
        let hour = timestamp.hour();
        let base_events = if (8..=18).contains(&hour) { 400 } else { 200 };

        points.push(TimeSeriesPoint {
            time: timestamp.format("%I:%M %p").to_string(),
            timestamp,
            events: base_events + rng.gen_range(0..150),
            threats: rng.gen_range(10..60),
            critical: rng.gen_range(5..25),
        });
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dashboard_derives_threats_blocked_from_events() {
        let now = Utc::now();
        let response = dashboard(
            DashboardCounts { total_events: 7, critical_cases: 2, active_cases: 3 },
            now,
        );
        assert_eq!(response.total_events, 7);
        assert_eq!(response.threats_blocked, 2); // floor(7 * 0.3)
        assert_eq!(response.security_score, 87);
        assert_eq!(response.last_update, now);
    }

    #[test]
    fn series_has_one_point_per_hour_inclusive() {
        let now = Utc::now();
        let points = time_series(24, now);
        assert_eq!(points.len(), 25);
        assert_eq!(points.last().unwrap().timestamp, now);
        assert_eq!(points[0].timestamp, now - Duration::hours(24));

        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
    }

    #[test]
    fn volumes_stay_in_their_documented_ranges() {
        let business = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        for point in time_series(0, business) {
            assert!((400..550).contains(&point.events));
            assert!((10..60).contains(&point.threats));
            assert!((5..25).contains(&point.critical));
        }

        let off_hours = Utc.with_ymd_and_hms(2025, 6, 2, 3, 0, 0).unwrap();
        for point in time_series(0, off_hours) {
            assert!((200..350).contains(&point.events));
        }
    }

    #[test]
    fn time_label_uses_twelve_hour_clock() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0).unwrap();
        let points = time_series(0, now);
        assert_eq!(points[0].time, "02:30 PM");
    }
}
