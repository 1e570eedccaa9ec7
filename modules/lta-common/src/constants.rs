//! Central catalog of LTA constants and constant functions.

/// The canonical drain semaphore filename for a component type. Presence of
/// this file in the component's working directory signals a clean exit at
/// the next work-cycle boundary.
pub fn drain_semaphore_filename(component_type: &str) -> String {
    format!(".lta-{component_type}-drain")
}

/// The canonical pid filename for a component type.
pub fn pid_filename(component_type: &str) -> String {
    format!(".lta-{component_type}-pid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_semaphore_name() {
        assert_eq!(drain_semaphore_filename("picker"), ".lta-picker-drain");
    }

    #[test]
    fn pid_name() {
        assert_eq!(pid_filename("picker"), ".lta-picker-pid");
    }
}
