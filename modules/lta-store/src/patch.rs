//! Generic JSON-patch application over a safelist of columns.
//!
//! The REST surface's PATCH endpoints accept an arbitrary JSON object and
//! merge it onto the stored row, returning the merged view. Since the
//! column set per entity is small and fixed, each entity
//! declares a safelist mapping JSON field names to a `ColumnKind`, and
//! `apply_patch` builds one dynamic `UPDATE ... SET ...` statement from
//! whichever of those fields are present in the request body.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::Postgres;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    OptText,
    Bool,
    OptBool,
    OptTimestampTz,
    OptBigInt,
    Jsonb,
    OptJsonb,
    TextArray,
}

pub struct ColumnSpec {
    pub field: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

pub const fn col(field: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { field, column: field, kind }
}

/// Apply `patch` onto `table` row `id` using the given safelist. Unknown
/// fields in `patch` are ignored (mirrors the original's permissive dict
/// update — the REST layer is responsible for 400ing identity-changing
/// fields like `uuid` before calling this). Returns the number of rows
/// affected (0 or 1 for a single-row patch).
pub async fn apply_patch(
    pool: &PgPool,
    table: &str,
    id_column: &str,
    id: Uuid,
    columns: &[ColumnSpec],
    patch: &serde_json::Map<String, Value>,
) -> Result<u64, sqlx::Error> {
    let mut sets: Vec<(&ColumnSpec, &Value)> = Vec::new();
    for spec in columns {
        if let Some(value) = patch.get(spec.field) {
            sets.push((spec, value));
        }
    }
    if sets.is_empty() {
        return Ok(1); // nothing to change is not an error
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("UPDATE {table} SET "));
    let mut first = true;
    for (spec, value) in &sets {
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(format!("{} = ", spec.column));
        push_bound_value(&mut qb, spec.kind, value);
    }
    qb.push(format!(" WHERE {id_column} = "));
    qb.push_bind(id);

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

fn push_bound_value(qb: &mut QueryBuilder<Postgres>, kind: ColumnKind, value: &Value) {
    match kind {
        ColumnKind::Text => {
            qb.push_bind(value.as_str().unwrap_or_default().to_string());
        }
        ColumnKind::OptText => {
            qb.push_bind(value.as_str().map(|s| s.to_string()));
        }
        ColumnKind::Bool => {
            qb.push_bind(value.as_bool().unwrap_or(false));
        }
        ColumnKind::OptBool => {
            qb.push_bind(value.as_bool());
        }
        ColumnKind::OptTimestampTz => {
            let dt: Option<DateTime<Utc>> = if value.is_null() {
                None
            } else {
                value
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
            };
            qb.push_bind(dt);
        }
        ColumnKind::OptBigInt => {
            qb.push_bind(value.as_i64());
        }
        ColumnKind::Jsonb => {
            qb.push_bind(sqlx::types::Json(value.clone()));
        }
        ColumnKind::OptJsonb => {
            if value.is_null() {
                qb.push_bind(None::<sqlx::types::Json<Value>>);
            } else {
                qb.push_bind(Some(sqlx::types::Json(value.clone())));
            }
        }
        ColumnKind::TextArray => {
            let arr: Vec<String> = value
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_else(|| value.as_str().map(|s| vec![s.to_string()]).unwrap_or_default());
            qb.push_bind(arr);
        }
    }
}

/// Safelist for `bundles`. `uuid` is deliberately absent — the REST layer
/// rejects a PATCH body that attempts to change it before reaching here.
pub fn bundle_columns() -> Vec<ColumnSpec> {
    vec![
        col("source", ColumnKind::Text),
        col("dest", ColumnKind::Text),
        col("path", ColumnKind::Text),
        col("bundle_path", ColumnKind::OptText),
        col("size", ColumnKind::OptBigInt),
        col("checksum", ColumnKind::Jsonb),
        col("status", ColumnKind::Text),
        col("reason", ColumnKind::Text),
        col("reason_details", ColumnKind::OptText),
        col("transfer_reference", ColumnKind::OptText),
        col("transfer_dest_path", ColumnKind::OptText),
        col("final_dest_location", ColumnKind::OptJsonb),
        col("update_timestamp", ColumnKind::OptTimestampTz),
        col("work_priority_timestamp", ColumnKind::OptTimestampTz),
        col("claimant", ColumnKind::OptText),
        col("claimed", ColumnKind::Bool),
        col("claim_timestamp", ColumnKind::OptTimestampTz),
        col("original_status", ColumnKind::OptText),
    ]
}

/// Safelist for `transfer_requests`.
pub fn transfer_request_columns() -> Vec<ColumnSpec> {
    vec![
        col("source", ColumnKind::Text),
        col("dest", ColumnKind::TextArray),
        col("path", ColumnKind::Text),
        col("status", ColumnKind::Text),
        col("update_timestamp", ColumnKind::OptTimestampTz),
        col("claimant", ColumnKind::OptText),
        col("claimed", ColumnKind::Bool),
        col("claim_timestamp", ColumnKind::OptTimestampTz),
        col("reason", ColumnKind::Text),
        col("work_priority_timestamp", ColumnKind::OptTimestampTz),
    ]
}
