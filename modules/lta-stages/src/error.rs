use uuid::Uuid;

/// Classifies what went wrong in a stage's work cycle so `do_work_claim` can
/// decide between propagating the error (transient, retry next cycle) and
/// quarantining the claimed item (the item itself is bad).
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("rest client error: {0}")]
    Rest(#[from] lta_client::RestError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Whether this cause should quarantine the claimed item rather than
    /// bubble up as a bare work-cycle failure. Checksum mismatches and
    /// malformed manifests are properties of the bundle itself; REST/IO
    /// failures are treated as transient infrastructure trouble.
    pub fn quarantines(&self) -> bool {
        matches!(self, StageError::ChecksumMismatch { .. } | StageError::Manifest(_))
    }
}

/// Convenience carrier for building a [`lta_worker::Outcome::QuarantineNow`]
/// from a claimed bundle's uuid/original status plus a `StageError`.
pub fn quarantine_bundle(uuid: Uuid, original_status: &'static str, err: &StageError) -> lta_worker::Outcome {
    lta_worker::Outcome::QuarantineNow {
        target: lta_worker::QuarantineTarget::Bundle { uuid, original_status },
        cause: err.to_string(),
        trace: format!("{err:?}"),
    }
}
