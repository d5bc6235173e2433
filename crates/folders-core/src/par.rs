//! Parallel consumption of splittable cursors with rayon.

use rayon::iter::plumbing::{Folder as Sink, UnindexedConsumer, UnindexedProducer, bridge_unindexed};
use rayon::iter::{Either, IntoParallelIterator, ParallelIterator};

use crate::batch::BatchCursor;
use crate::config::{SplitStrategy, TraversalConfig};
use crate::cursor::FolderCursor;
use crate::node::{Entry, Folder};
use crate::split::Splittable;

/// Parallel iterator driven by repeatedly splitting a cursor.
///
/// Each split-off cursor is moved to whichever worker rayon picks, so a
/// cursor is only ever driven by one thread at a time.
#[derive(Debug)]
pub struct ParEntries<S> {
    cursor: S,
}

impl<S> ParEntries<S> {
    /// Wrap a cursor for parallel consumption.
    pub fn new(cursor: S) -> Self {
        Self { cursor }
    }
}

impl<S> ParallelIterator for ParEntries<S>
where
    S: Splittable + Send,
    S::Item: Send,
{
    type Item = S::Item;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        bridge_unindexed(CursorProducer(self.cursor), consumer)
    }
}

struct CursorProducer<S>(S);

impl<S> UnindexedProducer for CursorProducer<S>
where
    S: Splittable + Send,
    S::Item: Send,
{
    type Item = S::Item;

    fn split(mut self) -> (Self, Option<Self>) {
        let other = self.0.split_eager();
        (self, other.map(CursorProducer))
    }

    fn fold_with<F>(self, folder: F) -> F
    where
        F: Sink<Self::Item>,
    {
        folder.consume_iter(self.0)
    }
}

impl Folder {
    /// Parallel iterator over every entry below this folder, split recursively.
    pub fn par_iter(&self) -> ParEntries<FolderCursor<'_>> {
        ParEntries::new(self.iter())
    }

    /// Parallel iterator split into at most one flat batch.
    pub fn par_batch_iter(&self, config: &TraversalConfig) -> ParEntries<BatchCursor<'_>> {
        ParEntries::new(self.batch_iter(config))
    }

    /// Sequential iterator using the configured strategy.
    pub fn entries(&self, config: &TraversalConfig) -> Either<FolderCursor<'_>, BatchCursor<'_>> {
        match config.strategy {
            SplitStrategy::Binary => Either::Left(self.iter()),
            SplitStrategy::Batch => Either::Right(self.batch_iter(config)),
        }
    }

    /// Parallel iterator using the configured strategy.
    pub fn par_entries(
        &self,
        config: &TraversalConfig,
    ) -> Either<ParEntries<FolderCursor<'_>>, ParEntries<BatchCursor<'_>>> {
        match config.strategy {
            SplitStrategy::Binary => Either::Left(self.par_iter()),
            SplitStrategy::Batch => Either::Right(self.par_batch_iter(config)),
        }
    }
}

impl<'a> IntoParallelIterator for &'a Folder {
    type Iter = ParEntries<FolderCursor<'a>>;
    type Item = Entry<'a>;

    fn into_par_iter(self) -> Self::Iter {
        self.par_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Document;

    fn tree(depth: u32, fan_out: usize, prefix: &str) -> Folder {
        let documents = (0..fan_out)
            .map(|i| Document::new(format!("{prefix}/doc{i}"), format!("{prefix}:{i}")))
            .collect();
        let subfolders = if depth == 0 {
            Vec::new()
        } else {
            (0..fan_out)
                .map(|i| tree(depth - 1, fan_out, &format!("{prefix}/dir{i}")))
                .collect()
        };
        Folder::new(prefix, subfolders, documents)
    }

    #[test]
    fn test_par_iter_counts_every_entry() {
        let root = tree(3, 3, "/p");
        let count = root.par_iter().count() as u64;
        assert_eq!(count, root.size() - 1);
    }

    #[test]
    fn test_par_iter_matches_sequential() {
        let root = tree(3, 4, "/p");
        let mut sequential: Vec<_> = root.iter().map(|e| e.path().to_path_buf()).collect();
        let mut parallel: Vec<_> = root.par_iter().map(|e| e.path().to_path_buf()).collect();
        sequential.sort();
        parallel.sort();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_par_entries_by_strategy() {
        let root = tree(2, 3, "/p");
        let batch = TraversalConfig::builder()
            .strategy(SplitStrategy::Batch)
            .parallelism(2usize)
            .build()
            .unwrap();
        assert_eq!(root.par_entries(&batch).count() as u64, root.size() - 1);
        assert_eq!(root.entries(&batch).count() as u64, root.size() - 1);
        assert_eq!(
            root.par_entries(&TraversalConfig::default()).count() as u64,
            root.size() - 1
        );
    }

    #[test]
    fn test_into_par_iter() {
        let root = tree(1, 2, "/p");
        let documents = (&root)
            .into_par_iter()
            .filter(Entry::is_document)
            .count();
        assert_eq!(documents as u64, root.document_count());
    }
}
