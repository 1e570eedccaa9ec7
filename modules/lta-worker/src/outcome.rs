use uuid::Uuid;

/// Which table a quarantine patch targets. The framework applies the patch,
/// not the stage, so every stage reports this instead of calling the client
/// itself.
#[derive(Debug, Clone, Copy)]
pub enum QuarantineTarget {
    Bundle { uuid: Uuid, original_status: &'static str },
    TransferRequest { uuid: Uuid, original_status: &'static str },
}

/// Result of a single work cycle, mirroring the original
/// `Component._do_work_claim`'s three-way return: did useful work, found
/// nothing to claim, or hit a condition that demands quarantining the item
/// it was working on.
#[derive(Debug)]
pub enum Outcome {
    Successful,
    NothingClaimed,
    QuarantineNow {
        target: QuarantineTarget,
        cause: String,
        trace: String,
    },
}
