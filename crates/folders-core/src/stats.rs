//! Summary statistics gathered by traversing a tree.

use std::cmp::Ordering;
use std::path::PathBuf;

use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};

use crate::node::Entry;

/// Summary statistics for a traversed tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Number of folders seen.
    pub folders: u64,
    /// Number of documents seen.
    pub documents: u64,
    /// Total bytes of document contents.
    pub content_bytes: u64,
    /// Largest document (path, bytes).
    pub largest_document: Option<(PathBuf, u64)>,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather stats from a sequential traversal.
    pub fn collect<'a>(entries: impl IntoIterator<Item = Entry<'a>>) -> Self {
        entries.into_iter().fold(Self::new(), |mut stats, entry| {
            stats.record(entry);
            stats
        })
    }

    /// Gather stats from a parallel traversal.
    pub fn par_collect<'a>(entries: impl ParallelIterator<Item = Entry<'a>>) -> Self {
        entries
            .fold(Self::new, |mut stats, entry| {
                stats.record(entry);
                stats
            })
            .reduce(Self::new, Self::merge)
    }

    /// Update stats with one entry.
    pub fn record(&mut self, entry: Entry<'_>) {
        match entry {
            Entry::Folder(_) => self.folders += 1,
            Entry::Document(doc) => {
                let len = doc.len() as u64;
                self.documents += 1;
                self.content_bytes += len;
                let candidate = (doc.path().to_path_buf(), len);
                self.largest_document = Some(match self.largest_document.take() {
                    Some(current) => larger(current, candidate),
                    None => candidate,
                });
            }
        }
    }

    /// Combine stats gathered from disjoint parts of a tree.
    pub fn merge(mut self, other: Self) -> Self {
        self.folders += other.folders;
        self.documents += other.documents;
        self.content_bytes += other.content_bytes;
        self.largest_document = match (self.largest_document, other.largest_document) {
            (Some(a), Some(b)) => Some(larger(a, b)),
            (a, b) => a.or(b),
        };
        self
    }

    /// Total entries seen (folders + documents).
    pub fn total_entries(&self) -> u64 {
        self.folders + self.documents
    }
}

/// Pick the larger document; equal sizes go to the smaller path so the
/// result does not depend on traversal order.
fn larger(a: (PathBuf, u64), b: (PathBuf, u64)) -> (PathBuf, u64) {
    match b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)) {
        Ordering::Greater => b,
        _ => a,
    }
}
