//! `Store`: the single point of contact between the REST surface and
//! Postgres. Every handler in `lta-rest` goes through here rather than
//! touching `sqlx` directly, so the query surface stays in one crate.

use chrono::Utc;
use lta_common::{Bundle, BundleStatus, LtaError, Metadata, TransferRequest};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::claim;
use crate::filter::{self, BundleFilter, MetadataFilter, TransferRequestFilter};
use crate::patch::{self, ColumnSpec};
use crate::status::{self, ComponentStatus};

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -- TransferRequests ------------------------------------------------

    pub async fn create_transfer_request(&self, req: &TransferRequest) -> Result<(), LtaError> {
        sqlx::query(
            r#"
            INSERT INTO transfer_requests
                (uuid, source, dest, path, status, create_timestamp, update_timestamp,
                 claimant, claimed, claim_timestamp, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(req.uuid)
        .bind(&req.source)
        .bind(&req.dest)
        .bind(&req.path)
        .bind(req.status)
        .bind(req.create_timestamp)
        .bind(req.update_timestamp)
        .bind(&req.claimant)
        .bind(req.claimed)
        .bind(req.claim_timestamp)
        .bind(&req.reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_transfer_request(&self, uuid: Uuid) -> Result<Option<TransferRequest>, LtaError> {
        let row = sqlx::query_as::<_, TransferRequest>("SELECT * FROM transfer_requests WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_transfer_requests(
        &self,
        filter: &TransferRequestFilter,
    ) -> Result<Vec<TransferRequest>, LtaError> {
        Ok(filter::list_transfer_requests(&self.pool, filter).await?)
    }

    /// Idempotent: deleting an already-absent row is not an error.
    pub async fn delete_transfer_request(&self, uuid: Uuid) -> Result<(), LtaError> {
        sqlx::query("DELETE FROM transfer_requests WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn patch_transfer_request(
        &self,
        uuid: Uuid,
        body: &serde_json::Map<String, Value>,
    ) -> Result<u64, LtaError> {
        let columns: Vec<ColumnSpec> = patch::transfer_request_columns();
        Ok(patch::apply_patch(&self.pool, "transfer_requests", "uuid", uuid, &columns, body).await?)
    }

    pub async fn pop_transfer_request(
        &self,
        source: &str,
        claimant: &str,
    ) -> Result<Option<TransferRequest>, LtaError> {
        Ok(claim::pop_transfer_request(&self.pool, source, claimant).await?)
    }

    // -- Bundles -----------------------------------------------------------

    pub async fn create_bundle(&self, bundle: &Bundle) -> Result<(), LtaError> {
        sqlx::query(
            r#"
            INSERT INTO bundles
                (uuid, request, source, dest, path, bundle_path, size, checksum, status,
                 reason, reason_details, transfer_reference, transfer_dest_path,
                 final_dest_location, create_timestamp, update_timestamp,
                 work_priority_timestamp, claimant, claimed, claim_timestamp, original_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21)
            "#,
        )
        .bind(bundle.uuid)
        .bind(bundle.request)
        .bind(&bundle.source)
        .bind(&bundle.dest)
        .bind(&bundle.path)
        .bind(&bundle.bundle_path)
        .bind(bundle.size)
        .bind(&bundle.checksum)
        .bind(bundle.status)
        .bind(&bundle.reason)
        .bind(&bundle.reason_details)
        .bind(&bundle.transfer_reference)
        .bind(&bundle.transfer_dest_path)
        .bind(&bundle.final_dest_location)
        .bind(bundle.create_timestamp)
        .bind(bundle.update_timestamp)
        .bind(bundle.work_priority_timestamp)
        .bind(&bundle.claimant)
        .bind(bundle.claimed)
        .bind(bundle.claim_timestamp)
        .bind(bundle.original_status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn bulk_create_bundles(&self, bundles: &[Bundle]) -> Result<(), LtaError> {
        for bundle in bundles {
            self.create_bundle(bundle).await?;
        }
        Ok(())
    }

    pub async fn get_bundle(&self, uuid: Uuid) -> Result<Option<Bundle>, LtaError> {
        let row = sqlx::query_as::<_, Bundle>("SELECT * FROM bundles WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_bundles(&self, filter: &BundleFilter) -> Result<Vec<Bundle>, LtaError> {
        Ok(filter::list_bundles(&self.pool, filter).await?)
    }

    pub async fn delete_bundle(&self, uuid: Uuid) -> Result<(), LtaError> {
        sqlx::query("DELETE FROM bundles WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bulk_delete_bundles(&self, uuids: &[Uuid]) -> Result<u64, LtaError> {
        let result = sqlx::query("DELETE FROM bundles WHERE uuid = ANY($1)")
            .bind(uuids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn patch_bundle(
        &self,
        uuid: Uuid,
        body: &serde_json::Map<String, Value>,
    ) -> Result<u64, LtaError> {
        let columns: Vec<ColumnSpec> = patch::bundle_columns();
        Ok(patch::apply_patch(&self.pool, "bundles", "uuid", uuid, &columns, body).await?)
    }

    pub async fn bulk_update_bundles(
        &self,
        uuids: &[Uuid],
        body: &serde_json::Map<String, Value>,
    ) -> Result<u64, LtaError> {
        let mut total = 0;
        for uuid in uuids {
            total += self.patch_bundle(*uuid, body).await?;
        }
        Ok(total)
    }

    pub async fn pop_bundle(
        &self,
        source: &str,
        dest: &str,
        status: BundleStatus,
        claimant: &str,
    ) -> Result<Option<Bundle>, LtaError> {
        Ok(claim::pop_bundle(&self.pool, source, dest, status, claimant).await?)
    }

    /// Count non-terminal bundles belonging to `request`, used by the
    /// finisher stage to decide whether a transfer request is complete.
    pub async fn count_nonterminal_bundles(&self, request: Uuid) -> Result<i64, LtaError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bundles WHERE request = $1 AND status NOT IN ($2, $3)",
        )
        .bind(request)
        .bind(BundleStatus::Finished)
        .bind(BundleStatus::Deleted)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // -- Metadata ------------------------------------------------------------

    pub async fn create_metadata(&self, metadata: &Metadata) -> Result<(), LtaError> {
        sqlx::query("INSERT INTO metadata (uuid, bundle_uuid, file_catalog_uuid) VALUES ($1, $2, $3)")
            .bind(metadata.uuid)
            .bind(metadata.bundle_uuid)
            .bind(metadata.file_catalog_uuid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bulk_create_metadata(&self, rows: &[Metadata]) -> Result<(), LtaError> {
        for row in rows {
            self.create_metadata(row).await?;
        }
        Ok(())
    }

    pub async fn list_metadata_for_bundle(&self, bundle_uuid: Uuid) -> Result<Vec<Metadata>, LtaError> {
        let rows = sqlx::query_as::<_, Metadata>("SELECT * FROM metadata WHERE bundle_uuid = $1")
            .bind(bundle_uuid)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_metadata(&self, filter: &MetadataFilter) -> Result<Vec<Metadata>, LtaError> {
        Ok(filter::list_metadata(&self.pool, filter).await?)
    }

    pub async fn get_metadata(&self, uuid: Uuid) -> Result<Option<Metadata>, LtaError> {
        let row = sqlx::query_as::<_, Metadata>("SELECT * FROM metadata WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Idempotent: deleting an already-absent row is not an error.
    pub async fn delete_metadata(&self, uuid: Uuid) -> Result<(), LtaError> {
        sqlx::query("DELETE FROM metadata WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_metadata_for_bundle(&self, bundle_uuid: Uuid) -> Result<u64, LtaError> {
        let result = sqlx::query("DELETE FROM metadata WHERE bundle_uuid = $1")
            .bind(bundle_uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn bulk_delete_metadata(&self, uuids: &[Uuid]) -> Result<u64, LtaError> {
        let result = sqlx::query("DELETE FROM metadata WHERE uuid = ANY($1)")
            .bind(uuids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // -- Status ----------------------------------------------------------

    pub async fn upsert_status(&self, component: &str, counters: &Value) -> Result<(), LtaError> {
        Ok(status::upsert_status(&self.pool, component, counters).await?)
    }

    pub async fn get_status(&self, component: &str) -> Result<Option<ComponentStatus>, LtaError> {
        Ok(status::get_status(&self.pool, component).await?)
    }

    pub async fn list_statuses(&self) -> Result<Vec<ComponentStatus>, LtaError> {
        Ok(status::list_statuses(&self.pool).await?)
    }

    pub async fn overall_health(&self) -> Result<status::Health, LtaError> {
        let statuses = self.list_statuses().await?;
        Ok(status::overall_health(&statuses, Utc::now()))
    }
}

