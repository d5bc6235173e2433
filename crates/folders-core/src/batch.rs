//! Single-batch splitting over a folder tree.

use tracing::debug;

use crate::config::TraversalConfig;
use crate::cursor::FolderCursor;
use crate::node::{Entry, Folder};
use crate::split::{SplitStep, Splittable};

#[derive(Debug)]
enum State<'a> {
    Source {
        cursor: FolderCursor<'a>,
        batch_size: usize,
        split: bool,
    },
    Buffer(std::vec::IntoIter<Entry<'a>>),
}

/// Cursor that splits once, handing a flat batch of entries to the caller.
///
/// The batch size is fixed up front from the tree size and the configured
/// parallelism. The first split drains up to that many entries into a
/// buffer; the buffer itself cannot be split, and the source never splits
/// again.
#[derive(Debug)]
pub struct BatchCursor<'a> {
    state: State<'a>,
}

impl<'a> BatchCursor<'a> {
    /// Create a batch cursor over everything below `root`.
    pub fn new(root: &'a Folder, config: &TraversalConfig) -> Self {
        let batch_size = batch_size(root.size(), config.effective_parallelism());
        Self::with_batch_size(root, batch_size)
    }

    /// Create a batch cursor with an explicit batch size.
    pub fn with_batch_size(root: &'a Folder, batch_size: usize) -> Self {
        Self {
            state: State::Source {
                cursor: FolderCursor::new(root),
                batch_size: batch_size.max(1),
                split: false,
            },
        }
    }

    /// Target batch size, or `None` for a split-off buffer.
    pub fn batch_size(&self) -> Option<usize> {
        match self.state {
            State::Source { batch_size, .. } => Some(batch_size),
            State::Buffer(_) => None,
        }
    }
}

/// `ceil(total / parallelism)`, at least 1.
fn batch_size(total: u64, parallelism: usize) -> usize {
    let parallelism = parallelism.max(1) as u64;
    total.div_ceil(parallelism).max(1) as usize
}

impl<'a> Splittable for BatchCursor<'a> {
    fn split_step(&mut self) -> SplitStep<Self> {
        let State::Source {
            cursor,
            batch_size,
            split,
        } = &mut self.state
        else {
            return SplitStep::Declined;
        };
        if *split {
            return SplitStep::Declined;
        }
        *split = true;

        let batch: Vec<Entry<'a>> = cursor.by_ref().take(*batch_size).collect();
        if batch.is_empty() {
            return SplitStep::Declined;
        }
        debug!(entries = batch.len(), "split off batch");
        SplitStep::Split(BatchCursor {
            state: State::Buffer(batch.into_iter()),
        })
    }
}

impl<'a> Iterator for BatchCursor<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            State::Source { cursor, .. } => cursor.next(),
            State::Buffer(buffer) => buffer.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::Source { .. } => (0, None),
            State::Buffer(buffer) => buffer.size_hint(),
        }
    }
}

impl Folder {
    /// Sequential cursor that splits into at most one flat batch.
    pub fn batch_iter(&self, config: &TraversalConfig) -> BatchCursor<'_> {
        BatchCursor::new(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Document;

    fn flat(count: usize) -> Folder {
        let documents = (0..count)
            .map(|i| Document::new(format!("/f/{i}"), Vec::new()))
            .collect();
        Folder::new("/f", Vec::new(), documents)
    }

    #[test]
    fn test_batch_size_rounds_up() {
        assert_eq!(batch_size(10, 4), 3);
        assert_eq!(batch_size(8, 4), 2);
        assert_eq!(batch_size(1, 8), 1);
        assert_eq!(batch_size(5, 0), 5);
    }

    #[test]
    fn test_first_split_only() {
        let root = flat(10);
        let mut cursor = BatchCursor::with_batch_size(&root, 4);

        let mut batch = cursor.try_split().expect("first split yields a batch");
        assert_eq!(batch.batch_size(), None);
        assert_eq!(batch.size_hint(), (4, Some(4)));
        assert!(batch.try_split().is_none());
        assert!(cursor.try_split().is_none());

        assert_eq!(batch.count() + cursor.count(), 10);
    }

    #[test]
    fn test_empty_tree_declines() {
        let root = Folder::empty("/e");
        let mut cursor = BatchCursor::with_batch_size(&root, 4);
        assert!(cursor.try_split().is_none());
        assert_eq!(cursor.count(), 0);
    }

    #[test]
    fn test_batch_size_from_config() {
        let root = flat(11);
        let config = TraversalConfig::builder().parallelism(4usize).build().unwrap();
        // size = 12 (root + 11 documents)
        assert_eq!(root.batch_iter(&config).batch_size(), Some(3));
    }
}
