//! Read-hotness accounting for the replication policy.

use std::collections::HashMap;

use crate::path::FsPath;

/// Shared acquires of one file before a copy to a fresh node is ordered.
pub const DEFAULT_REPLICATION_THRESHOLD: u32 = 20;

/// Per-file shared-acquire counters. Guarded by the namespace monitor;
/// missing entries read as zero.
#[derive(Debug)]
pub struct ReplicationPolicy {
    threshold: u32,
    read_counts: HashMap<FsPath, u32>,
}

impl ReplicationPolicy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold: threshold.max(1), read_counts: HashMap::new() }
    }

    /// Counts one shared acquire of `path`. Returns `true` when the counter
    /// just hit the threshold; the counter resets whenever it fires.
    pub fn note_read(&mut self, path: &FsPath) -> bool {
        let count = self.read_counts.entry(path.clone()).or_insert(0);
        *count += 1;
        if *count >= self.threshold {
            *count = 0;
            true
        } else {
            false
        }
    }

    /// Drops counters for everything under `root`.
    pub fn forget_subtree(&mut self, root: &FsPath) {
        self.read_counts.retain(|path, _| !path.is_subpath_of(root));
    }

    #[cfg(test)]
    pub(crate) fn count(&self, path: &FsPath) -> u32 {
        self.read_counts.get(path).copied().unwrap_or(0)
    }
}
