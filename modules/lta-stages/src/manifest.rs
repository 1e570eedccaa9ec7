//! Bundle manifest reader/writer: the persisted record of which files a
//! bundle packs.
//!
//! Two formats coexist on disk: legacy v2 is a single JSON document
//! (`<uuid>.metadata.json`) with the file list embedded as an array field.
//! v3 is NDJSON (`<uuid>.metadata.ndjson`): the first line is the
//! bundle-describing header object, every following line is one file
//! record. Readers accept either; every manifest this crate writes is v3 —
//! the original's own migration direction (lta_types.py grew the NDJSON
//! path specifically so bundler could stream entries instead of holding
//! one giant JSON array in memory).

use std::path::Path;

use chrono::Utc;
use lta_common::Checksum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StageError;

/// One warehouse file captured in a bundle, as recorded in its manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub logical_name: String,
    pub file_size: i64,
    pub checksum: Checksum,
    pub uuid: Uuid,
}

/// A bundle's manifest: a free-form header (the bundle-describing object —
/// v2 callers may have put arbitrary extra fields there) plus the ordered
/// list of files it packs.
#[derive(Debug, Clone)]
pub struct BundleManifest {
    pub header: Value,
    pub files: Vec<ManifestEntry>,
}

impl BundleManifest {
    pub fn new(bundle_uuid: Uuid) -> Self {
        Self {
            header: serde_json::json!({
                "uuid": bundle_uuid,
                "create_timestamp": lta_common::format_timestamp(&Utc::now()),
            }),
            files: Vec::new(),
        }
    }

    pub fn total_size(&self) -> i64 {
        self.files.iter().map(|f| f.file_size).sum()
    }
}

/// Read a manifest file, accepting either the v2 single-document shape
/// (`{"header": {...}, "files": [...]}` or a bare header object with a
/// top-level `files` array) or the v3 NDJSON shape.
pub async fn read_manifest(path: &Path) -> Result<BundleManifest, StageError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StageError::Manifest(format!("{} is empty", path.display())));
    }

    if trimmed.starts_with('{') && trimmed.lines().count() <= 1 {
        return read_v2(trimmed);
    }
    read_v3(trimmed)
}

fn read_v2(document: &str) -> Result<BundleManifest, StageError> {
    let mut value: Value =
        serde_json::from_str(document).map_err(|e| StageError::Manifest(format!("invalid v2 manifest json: {e}")))?;
    let files_value = value
        .as_object_mut()
        .and_then(|obj| obj.remove("files"))
        .ok_or_else(|| StageError::Manifest("v2 manifest missing 'files' array".to_string()))?;
    let files: Vec<ManifestEntry> =
        serde_json::from_value(files_value).map_err(|e| StageError::Manifest(format!("invalid v2 file entry: {e}")))?;
    Ok(BundleManifest { header: value, files })
}

fn read_v3(document: &str) -> Result<BundleManifest, StageError> {
    let mut lines = document.lines();
    let header: Value = lines
        .next()
        .ok_or_else(|| StageError::Manifest("empty v3 manifest".to_string()))
        .and_then(|line| serde_json::from_str(line).map_err(|e| StageError::Manifest(format!("invalid v3 header: {e}"))))?;

    let mut files = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ManifestEntry =
            serde_json::from_str(line).map_err(|e| StageError::Manifest(format!("invalid v3 file line: {e}")))?;
        files.push(entry);
    }
    Ok(BundleManifest { header, files })
}

/// Write a manifest in v3 NDJSON form.
pub async fn write_manifest_v3(path: &Path, manifest: &BundleManifest) -> Result<(), StageError> {
    let mut out = serde_json::to_string(&manifest.header).map_err(|e| StageError::Manifest(e.to_string()))?;
    out.push('\n');
    for entry in &manifest.files {
        out.push_str(&serde_json::to_string(entry).map_err(|e| StageError::Manifest(e.to_string()))?);
        out.push('\n');
    }
    tokio::fs::write(path, out).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(name: &str) -> ManifestEntry {
        ManifestEntry {
            logical_name: name.to_string(),
            file_size: 1024,
            checksum: Checksum { sha512: "abc123".to_string(), adler32: None },
            uuid: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn v3_round_trips_through_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.metadata.ndjson");
        let mut manifest = BundleManifest::new(Uuid::new_v4());
        manifest.files.push(sample_entry("run001/file_a.dat"));
        manifest.files.push(sample_entry("run001/file_b.dat"));

        write_manifest_v3(&path, &manifest).await.unwrap();
        let read_back = read_manifest(&path).await.unwrap();

        assert_eq!(read_back.files.len(), 2);
        assert_eq!(read_back.files[0].logical_name, "run001/file_a.dat");
        assert_eq!(read_back.total_size(), 2048);
    }

    #[tokio::test]
    async fn legacy_v2_single_document_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.metadata.json");
        let entry = sample_entry("run002/file_c.dat");
        let document = serde_json::json!({
            "uuid": Uuid::new_v4(),
            "files": [entry],
        });
        tokio::fs::write(&path, document.to_string()).await.unwrap();

        let manifest = read_manifest(&path).await.unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.files[0].logical_name, "run002/file_c.dat");
    }

    #[tokio::test]
    async fn empty_manifest_is_a_manifest_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ndjson");
        tokio::fs::write(&path, "").await.unwrap();
        let err = read_manifest(&path).await.unwrap_err();
        assert!(matches!(err, StageError::Manifest(_)));
    }
}
