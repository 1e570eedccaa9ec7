//! Component heartbeat storage and the `/status` health rollup.
//!
//! Each running worker process PATCHes its own `component_status` row on
//! every work cycle. A component is considered healthy if its
//! last heartbeat is within `FRESHNESS_THRESHOLD` of now; the rollup at
//! `/status` reports OK only if every known component is fresh.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

pub const FRESHNESS_THRESHOLD_SECONDS: i64 = 300;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ComponentStatus {
    pub component: String,
    pub timestamp: DateTime<Utc>,
    pub counters: sqlx::types::Json<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    Ok,
    Warn,
}

impl ComponentStatus {
    pub fn health(&self, now: DateTime<Utc>) -> Health {
        let age = now - self.timestamp;
        if age <= Duration::seconds(FRESHNESS_THRESHOLD_SECONDS) {
            Health::Ok
        } else {
            Health::Warn
        }
    }
}

/// Upsert a component's heartbeat. `counters` is an opaque, component-chosen
/// JSON object (e.g. `{"success": 12, "failure": 0}`).
pub async fn upsert_status(
    pool: &PgPool,
    component: &str,
    counters: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO component_status (component, timestamp, counters)
        VALUES ($1, $2, $3)
        ON CONFLICT (component) DO UPDATE
        SET timestamp = EXCLUDED.timestamp, counters = EXCLUDED.counters
        "#,
    )
    .bind(component)
    .bind(Utc::now())
    .bind(sqlx::types::Json(counters.clone()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_status(pool: &PgPool, component: &str) -> Result<Option<ComponentStatus>, sqlx::Error> {
    sqlx::query_as::<_, ComponentStatus>("SELECT * FROM component_status WHERE component = $1")
        .bind(component)
        .fetch_optional(pool)
        .await
}

pub async fn list_statuses(pool: &PgPool) -> Result<Vec<ComponentStatus>, sqlx::Error> {
    sqlx::query_as::<_, ComponentStatus>("SELECT * FROM component_status ORDER BY component ASC")
        .fetch_all(pool)
        .await
}

/// Overall rollup: OK only if every component's last heartbeat is fresh.
pub fn overall_health(statuses: &[ComponentStatus], now: DateTime<Utc>) -> Health {
    if statuses.iter().any(|s| s.health(now) == Health::Warn) {
        Health::Warn
    } else {
        Health::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_at(seconds_ago: i64) -> ComponentStatus {
        ComponentStatus {
            component: "picker-1".to_string(),
            timestamp: Utc::now() - Duration::seconds(seconds_ago),
            counters: sqlx::types::Json(json!({})),
        }
    }

    #[test]
    fn fresh_heartbeat_is_ok() {
        let s = status_at(10);
        assert_eq!(s.health(Utc::now()), Health::Ok);
    }

    #[test]
    fn stale_heartbeat_warns() {
        let s = status_at(FRESHNESS_THRESHOLD_SECONDS + 60);
        assert_eq!(s.health(Utc::now()), Health::Warn);
    }

    #[test]
    fn rollup_warns_if_any_component_stale() {
        let fresh = status_at(5);
        let stale = status_at(FRESHNESS_THRESHOLD_SECONDS + 5);
        assert_eq!(overall_health(&[fresh.clone()], Utc::now()), Health::Ok);
        assert_eq!(overall_health(&[fresh, stale], Utc::now()), Health::Warn);
    }
}
