//! Query-string filter construction for the list endpoints
//! (`GET /TransferRequests`, `GET /Bundles`, `GET /Metadata`).
//!
//! Filters are plain equality unless noted. The one exception is `location`,
//! a `SITE:/path/prefix` filter matching bundles whose `dest` is `SITE` and
//! whose `path` starts with the given prefix.

use lta_common::{Bundle, Metadata, TransferRequest};
use sqlx::postgres::Postgres;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct BundleFilter {
    pub source: Option<String>,
    pub dest: Option<String>,
    pub status: Option<String>,
    pub request: Option<Uuid>,
    /// `SITE:/prefix` — split into (site, path prefix) before querying.
    pub location: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TransferRequestFilter {
    pub source: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    pub bundle_uuid: Option<Uuid>,
    pub limit: Option<i64>,
}

fn split_location(location: &str) -> (String, String) {
    match location.split_once(':') {
        Some((site, prefix)) => (site.to_string(), prefix.to_string()),
        None => (location.to_string(), String::new()),
    }
}

pub async fn list_bundles(pool: &PgPool, filter: &BundleFilter) -> Result<Vec<Bundle>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM bundles WHERE 1 = 1");

    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source.clone());
    }
    if let Some(dest) = &filter.dest {
        qb.push(" AND dest = ").push_bind(dest.clone());
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(request) = filter.request {
        qb.push(" AND request = ").push_bind(request);
    }
    if let Some(location) = &filter.location {
        let (site, prefix) = split_location(location);
        qb.push(" AND dest = ").push_bind(site);
        qb.push(" AND path LIKE ").push_bind(format!("{prefix}%"));
    }
    qb.push(" ORDER BY create_timestamp ASC");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    qb.build_query_as::<Bundle>().fetch_all(pool).await
}

pub async fn list_transfer_requests(
    pool: &PgPool,
    filter: &TransferRequestFilter,
) -> Result<Vec<TransferRequest>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM transfer_requests WHERE 1 = 1");

    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source.clone());
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    qb.push(" ORDER BY create_timestamp ASC");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    qb.build_query_as::<TransferRequest>().fetch_all(pool).await
}

pub async fn list_metadata(pool: &PgPool, filter: &MetadataFilter) -> Result<Vec<Metadata>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM metadata WHERE 1 = 1");

    if let Some(bundle_uuid) = filter.bundle_uuid {
        qb.push(" AND bundle_uuid = ").push_bind(bundle_uuid);
    }
    qb.push(" ORDER BY uuid ASC");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    qb.build_query_as::<Metadata>().fetch_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_site_and_prefix() {
        assert_eq!(
            split_location("WIPAC:/data/exp/foo"),
            ("WIPAC".to_string(), "/data/exp/foo".to_string())
        );
    }

    #[test]
    fn bare_site_has_empty_prefix() {
        assert_eq!(split_location("WIPAC"), ("WIPAC".to_string(), String::new()));
    }
}
