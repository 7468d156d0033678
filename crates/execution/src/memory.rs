//! Memory sampling
//!
//! Resident memory of the current process, read once when an execution
//! completes. This is the orchestrator's footprint, not the child's.

use sysinfo::{ProcessesToUpdate, System};

/// Resident memory of this process in bytes, or 0 when it cannot be read
pub fn sample_process_memory() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    fn test_sample_is_nonzero_on_supported_platforms() {
        assert!(sample_process_memory() > 0);
    }
}
