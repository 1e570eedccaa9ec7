//! Drain semaphore: the operator drops a `.lta-<component>-drain` file in
//! the component's working directory to request a clean exit at the next
//! work-cycle boundary, without killing mid-claim.

use std::path::Path;

pub fn drain_requested(component_type: &str) -> bool {
    Path::new(&lta_common::constants::drain_semaphore_filename(component_type)).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absent_file_means_no_drain() {
        assert!(!drain_requested("nonexistent-test-component-xyz"));
    }

    #[test]
    fn present_file_means_drain() {
        let name = lta_common::constants::drain_semaphore_filename("drain-test-component");
        fs::write(&name, "").unwrap();
        assert!(drain_requested("drain-test-component"));
        fs::remove_file(&name).unwrap();
    }
}
