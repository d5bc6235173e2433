//! Build progress reporting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information during a build.
#[derive(Debug, Clone)]
pub struct BuildProgress {
    /// Number of folders joined so far.
    pub folders_resolved: u64,
    /// Number of documents read so far.
    pub documents_resolved: u64,
    /// Total bytes read so far.
    pub bytes_read: u64,
    /// Path most recently resolved.
    pub current_path: PathBuf,
    /// Time elapsed since the build started.
    pub elapsed: Duration,
}

impl BuildProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            folders_resolved: 0,
            documents_resolved: 0,
            bytes_read: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate read rate in documents per second.
    pub fn documents_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.documents_resolved as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate read rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_read as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items resolved (folders + documents).
    pub fn total_items(&self) -> u64 {
        self.folders_resolved + self.documents_resolved
    }
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared counters updated concurrently by build tasks.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    folders_resolved: AtomicU64,
    documents_resolved: AtomicU64,
    bytes_read: AtomicU64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            folders_resolved: AtomicU64::new(0),
            documents_resolved: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
        }
    }

    /// Returns the new folder count.
    pub fn record_folder(&self) -> u64 {
        self.folders_resolved.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the new document count.
    pub fn record_document(&self, bytes: u64) -> u64 {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.documents_resolved.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self, current_path: PathBuf) -> BuildProgress {
        BuildProgress {
            folders_resolved: self.folders_resolved.load(Ordering::Relaxed),
            documents_resolved: self.documents_resolved.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            current_path,
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_snapshot() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.record_document(10), 1);
        assert_eq!(tracker.record_document(5), 2);
        assert_eq!(tracker.record_folder(), 1);

        let progress = tracker.snapshot(PathBuf::from("/x"));
        assert_eq!(progress.total_items(), 3);
        assert_eq!(progress.bytes_read, 15);
        assert_eq!(progress.current_path, PathBuf::from("/x"));
    }

    #[test]
    fn test_rates_without_elapsed() {
        let progress = BuildProgress::new();
        assert_eq!(progress.documents_per_second(), 0.0);
        assert_eq!(progress.bytes_per_second(), 0.0);
    }
}
