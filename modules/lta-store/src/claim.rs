//! Atomic claim ("pop") of the next unclaimed row matching a stage's
//! criteria: "lock one row out of many, ordered by priority" using
//! Postgres `FOR UPDATE SKIP LOCKED`. Two concurrent pops against the
//! same pool are guaranteed to either return two distinct rows or one
//! row and an empty result, never the same row twice.

use chrono::Utc;
use lta_common::{Bundle, BundleStatus, TransferRequest, TransferRequestStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Claim the oldest (by work-priority, then creation order) unclaimed bundle
/// matching `source`/`dest`/`status`. Returns `None` when nothing matches.
pub async fn pop_bundle(
    pool: &PgPool,
    source: &str,
    dest: &str,
    status: BundleStatus,
    claimant: &str,
) -> Result<Option<Bundle>, sqlx::Error> {
    let claim_timestamp = Utc::now();
    sqlx::query_as::<_, Bundle>(
        r#"
        UPDATE bundles SET claimed = true, claimant = $1, claim_timestamp = $2
        WHERE uuid = (
            SELECT uuid FROM bundles
            WHERE source = $3 AND dest = $4 AND status = $5 AND claimed = false
            ORDER BY work_priority_timestamp ASC NULLS FIRST, create_timestamp ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING *
        "#,
    )
    .bind(claimant)
    .bind(claim_timestamp)
    .bind(source)
    .bind(dest)
    .bind(status)
    .fetch_optional(pool)
    .await
}

/// Claim the oldest unclaimed transfer request for `source`, transitioning
/// it from `unclaimed` to `processing`.
pub async fn pop_transfer_request(
    pool: &PgPool,
    source: &str,
    claimant: &str,
) -> Result<Option<TransferRequest>, sqlx::Error> {
    let claim_timestamp = Utc::now();
    sqlx::query_as::<_, TransferRequest>(
        r#"
        UPDATE transfer_requests
        SET claimed = true, claimant = $1, claim_timestamp = $2, status = $3,
            update_timestamp = $2
        WHERE uuid = (
            SELECT uuid FROM transfer_requests
            WHERE source = $4 AND status = $5 AND claimed = false
            ORDER BY work_priority_timestamp ASC NULLS FIRST, create_timestamp ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING *
        "#,
    )
    .bind(claimant)
    .bind(claim_timestamp)
    .bind(TransferRequestStatus::Processing)
    .bind(source)
    .bind(TransferRequestStatus::Unclaimed)
    .fetch_optional(pool)
    .await
}

/// Release a claim without changing status, used when a stage gives up a
/// bundle it can't presently process (e.g. re-queue on transient failure).
pub async fn release_bundle(
    pool: &PgPool,
    uuid: Uuid,
    work_priority_timestamp: chrono::DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE bundles
        SET claimed = false, claimant = NULL, claim_timestamp = NULL,
            work_priority_timestamp = $2
        WHERE uuid = $1
        "#,
    )
    .bind(uuid)
    .bind(work_priority_timestamp)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
