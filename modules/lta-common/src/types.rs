use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Truncate a timestamp to second precision and render RFC 3339 — the
/// wire format is ISO-8601 UTC to seconds. Storage keeps full
/// `TIMESTAMPTZ` precision; only the JSON boundary truncates.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.trunc_subsecs(0).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The three bearer-token roles recognized by the REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::System => "system",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "system" => Ok(Role::System),
            _ => Err(()),
        }
    }
}

/// Status of a `TransferRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferRequestStatus {
    Unclaimed,
    Processing,
    Completed,
    Quarantined,
}

/// Status of a `Bundle`. Canonical progression:
/// `specified -> created -> staged -> transferring -> taping -> verifying ->
/// completed -> detached -> deleted -> finished`. Retrieval path:
/// `requested -> located -> staged -> unpacking -> completed`. `quarantined`
/// is a sticky side state reachable from any of the above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BundleStatus {
    Specified,
    Created,
    Staged,
    Transferring,
    Taping,
    Verifying,
    Completed,
    Detached,
    Deleted,
    Finished,
    Requested,
    Located,
    Unpacking,
    Quarantined,
}

impl BundleStatus {
    /// True for the two statuses that count as "terminal" for the purposes
    /// of transfer-request completion.
    pub fn is_terminal(self) -> bool {
        matches!(self, BundleStatus::Finished | BundleStatus::Deleted)
    }
}

/// `{sha512, adler32}` checksum pair carried on a `Bundle`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checksum {
    pub sha512: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adler32: Option<String>,
}

/// `{site, path}` pair recording where a bundle ultimately landed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalDestLocation {
    pub site: String,
    pub path: String,
}

/// The user-facing unit of work: a warehouse path to relocate from `source`
/// to one or more `dest` sites.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransferRequest {
    pub uuid: Uuid,
    pub source: String,
    pub dest: Vec<String>,
    pub path: String,
    pub status: TransferRequestStatus,
    pub create_timestamp: DateTime<Utc>,
    pub update_timestamp: DateTime<Utc>,
    pub claimant: Option<String>,
    pub claimed: bool,
    pub claim_timestamp: Option<DateTime<Utc>>,
    pub reason: String,
}

impl TransferRequest {
    pub fn new(source: String, dest: Vec<String>, path: String) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            source,
            dest,
            path,
            status: TransferRequestStatus::Unclaimed,
            create_timestamp: now,
            update_timestamp: now,
            claimant: None,
            claimed: false,
            claim_timestamp: None,
            reason: String::new(),
        }
    }
}

/// A ZIP archive aggregating warehouse files, plus its database record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bundle {
    pub uuid: Uuid,
    pub request: Uuid,
    pub source: String,
    pub dest: String,
    pub path: String,
    pub bundle_path: Option<String>,
    pub size: Option<i64>,
    pub checksum: sqlx::types::Json<Checksum>,
    pub status: BundleStatus,
    pub reason: String,
    pub reason_details: Option<String>,
    pub transfer_reference: Option<String>,
    pub transfer_dest_path: Option<String>,
    pub final_dest_location: Option<sqlx::types::Json<FinalDestLocation>>,
    pub create_timestamp: DateTime<Utc>,
    pub update_timestamp: DateTime<Utc>,
    pub work_priority_timestamp: Option<DateTime<Utc>>,
    pub claimant: Option<String>,
    pub claimed: bool,
    pub claim_timestamp: Option<DateTime<Utc>>,
    pub original_status: Option<BundleStatus>,
}

impl Bundle {
    pub fn new(request: Uuid, source: String, dest: String, path: String) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            request,
            source,
            dest,
            path,
            bundle_path: None,
            size: None,
            checksum: sqlx::types::Json(Checksum::default()),
            status: BundleStatus::Specified,
            reason: String::new(),
            reason_details: None,
            transfer_reference: None,
            transfer_dest_path: None,
            final_dest_location: None,
            create_timestamp: now,
            update_timestamp: now,
            work_priority_timestamp: None,
            claimant: None,
            claimed: false,
            claim_timestamp: None,
            original_status: None,
        }
    }
}

/// One (bundle, catalog-file) association awaiting catalog registration.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Metadata {
    pub uuid: Uuid,
    pub bundle_uuid: Uuid,
    pub file_catalog_uuid: Uuid,
}

impl Metadata {
    pub fn new(bundle_uuid: Uuid, file_catalog_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            bundle_uuid,
            file_catalog_uuid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(BundleStatus::Finished.is_terminal());
        assert!(BundleStatus::Deleted.is_terminal());
        assert!(!BundleStatus::Completed.is_terminal());
        assert!(!BundleStatus::Quarantined.is_terminal());
    }

    #[test]
    fn role_roundtrip() {
        use std::str::FromStr;
        assert_eq!(Role::from_str("system"), Ok(Role::System));
        assert_eq!(Role::System.to_string(), "system");
    }
}
