//! Mover: writes a `transferring` bundle to tape over HPSS. Reuses
//! [`crate::replicator::Replicator`]'s claim/put/patch shape against an
//! [`crate::transport::HpssTransport`] — `nersc_mover.py` and
//! `globus_replicator.py` differed only in which transport client they
//! drove, not in the surrounding claim/patch logic, so the two original
//! Python components collapse into one generic Rust stage here.

use crate::replicator::Replicator;
use crate::transport::HpssTransport;

pub type Mover = Replicator<HpssTransport>;

pub fn new_mover(hsi_binary: String) -> Mover {
    Replicator::with_component_type(HpssTransport::new(hsi_binary), "mover")
}
