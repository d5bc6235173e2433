//! Binary-splitting cursor over a folder tree.
//!
//! A [`FolderCursor`] walks a [`Folder`] with an explicit stack of frames
//! instead of recursion. Each frame owns the still-unvisited tail of some
//! folder's children. Splitting hands half of one frame's children to a new
//! cursor, so every node reference lives in exactly one frame of exactly one
//! cursor and two cursors never share work.
//!
//! Yield order is stack order: the children of a folder are visited from the
//! last subfolder to the first, then from the last document to the first,
//! and a subfolder is yielded before anything below it.

use std::fmt;

use tracing::trace;

use crate::node::{Document, Entry, Folder};
use crate::split::{SplitStep, Splittable};

/// Unvisited children of one unit of work.
enum Frame<'a> {
    /// Remaining children of a real folder of the tree.
    Folder {
        folder: &'a Folder,
        subfolders: &'a [Folder],
        documents: &'a [Document],
    },
    /// A synthetic share of some folder's children, created by a split.
    Partition(Partition<'a>),
}

/// Synthetic placeholder holding part of a folder's children.
///
/// Partitions exist only inside cursor state. They are never yielded:
/// [`Entry`] has no variant that could carry one.
struct Partition<'a> {
    level: u32,
    subfolders: Vec<&'a Folder>,
    /// Entries yielded without descending: documents, and folders whose
    /// children were already hoisted into this partition.
    leaves: Vec<Entry<'a>>,
}

impl<'a> Partition<'a> {
    /// Debug label made of the child names and the split level.
    fn label(&self) -> String {
        let mut label = String::new();
        for name in self
            .subfolders
            .iter()
            .map(|folder| folder.name())
            .chain(self.leaves.iter().map(|entry| entry.name()))
        {
            if !label.is_empty() {
                label.push('+');
            }
            label.push_str(name);
        }
        label.push_str(&format!("#{}", self.level));
        label
    }
}

impl<'a> Frame<'a> {
    fn of(folder: &'a Folder) -> Self {
        Frame::Folder {
            folder,
            subfolders: folder.subfolders(),
            documents: folder.documents(),
        }
    }

    fn pop_subfolder(&mut self) -> Option<&'a Folder> {
        match self {
            Frame::Folder { subfolders, .. } => {
                let (last, rest) = subfolders.split_last()?;
                *subfolders = rest;
                Some(last)
            }
            Frame::Partition(partition) => partition.subfolders.pop(),
        }
    }

    fn pop_leaf(&mut self) -> Option<Entry<'a>> {
        match self {
            Frame::Folder { documents, .. } => {
                let (last, rest) = documents.split_last()?;
                *documents = rest;
                Some(Entry::Document(last))
            }
            Frame::Partition(partition) => partition.leaves.pop(),
        }
    }

    /// Number of remaining (subfolders, leaves).
    fn counts(&self) -> (usize, usize) {
        match self {
            Frame::Folder {
                subfolders,
                documents,
                ..
            } => (subfolders.len(), documents.len()),
            Frame::Partition(partition) => (partition.subfolders.len(), partition.leaves.len()),
        }
    }

    fn into_parts(self) -> (Vec<&'a Folder>, Vec<Entry<'a>>) {
        match self {
            Frame::Folder {
                subfolders,
                documents,
                ..
            } => (
                subfolders.iter().collect(),
                documents.iter().map(Entry::Document).collect(),
            ),
            Frame::Partition(partition) => (partition.subfolders, partition.leaves),
        }
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (subfolders, leaves) = self.counts();
        match self {
            Frame::Folder { folder, .. } => f
                .debug_struct("Folder")
                .field("path", &folder.path())
                .field("subfolders", &subfolders)
                .field("documents", &leaves)
                .finish(),
            Frame::Partition(partition) => f
                .debug_struct("Partition")
                .field("label", &partition.label())
                .field("subfolders", &subfolders)
                .field("leaves", &leaves)
                .finish(),
        }
    }
}

/// An entry taken off the stack but not yet handed to the consumer.
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    /// Yielded as is; nothing below it belongs to this cursor's stack.
    Atomic(Entry<'a>),
    /// A folder whose frame sits on top of the stack.
    Descended(&'a Folder),
}

impl<'a> Resolved<'a> {
    fn entry(self) -> Entry<'a> {
        match self {
            Resolved::Atomic(entry) => entry,
            Resolved::Descended(folder) => Entry::Folder(folder),
        }
    }
}

/// Lazy, splittable sequence of every entry below a folder.
///
/// The root folder itself is not yielded. Draining a cursor and every cursor
/// ever split off it yields each entry of the tree exactly once.
#[derive(Debug)]
pub struct FolderCursor<'a> {
    current: Option<Frame<'a>>,
    stack: Vec<Frame<'a>>,
    lookahead: Option<Resolved<'a>>,
    level: u32,
}

impl<'a> FolderCursor<'a> {
    /// Create a cursor over everything below `root`.
    pub fn new(root: &'a Folder) -> Self {
        Self {
            current: None,
            stack: vec![Frame::of(root)],
            lookahead: None,
            level: 0,
        }
    }

    fn from_partition(partition: Partition<'a>) -> Self {
        Self {
            current: None,
            level: partition.level,
            stack: vec![Frame::Partition(partition)],
            lookahead: None,
        }
    }

    /// Number of splits that led to this cursor.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Take the next entry off the stack.
    fn advance(&mut self) -> Option<Resolved<'a>> {
        loop {
            if self.current.is_none() {
                self.current = Some(self.stack.pop()?);
            }
            let current = self.current.as_mut()?;

            if let Some(subfolder) = current.pop_subfolder() {
                self.stack.push(Frame::of(subfolder));
                return Some(Resolved::Descended(subfolder));
            }
            if let Some(leaf) = current.pop_leaf() {
                return Some(Resolved::Atomic(leaf));
            }
            self.current = None;
        }
    }

    /// Check that the next unit of work is the frame on top of the stack,
    /// resolving one entry into the lookahead if needed.
    fn next_unit_is_top_frame(&mut self) -> bool {
        match self.lookahead {
            Some(Resolved::Atomic(_)) => return false,
            Some(Resolved::Descended(_)) => return true,
            None => {}
        }
        if self.current.is_none() && !self.stack.is_empty() {
            return true;
        }
        match self.advance() {
            Some(resolved) => {
                self.lookahead = Some(resolved);
                matches!(resolved, Resolved::Descended(_))
            }
            None => false,
        }
    }
}

impl<'a> Splittable for FolderCursor<'a> {
    fn split_step(&mut self) -> SplitStep<Self> {
        if !self.next_unit_is_top_frame() {
            return SplitStep::Declined;
        }
        let Some(top) = self.stack.last() else {
            return SplitStep::Declined;
        };

        let (subfolders, leaves) = top.counts();
        if subfolders < 2 && leaves < 2 {
            if subfolders == 0 {
                return SplitStep::Declined;
            }
            // A single subfolder: hoist its children into this unit and retry.
            let Some(frame) = self.stack.pop() else {
                return SplitStep::Declined;
            };
            let (mut single, mut leaves) = frame.into_parts();
            let Some(only) = single.pop() else {
                return SplitStep::Declined;
            };
            leaves.push(Entry::Folder(only));
            leaves.extend(only.documents().iter().map(Entry::Document));
            let partition = Partition {
                level: self.level,
                subfolders: only.subfolders().iter().collect(),
                leaves,
            };
            trace!(label = %partition.label(), "deferred split");
            self.stack.push(Frame::Partition(partition));
            return SplitStep::Deferred;
        }

        let Some(frame) = self.stack.pop() else {
            return SplitStep::Declined;
        };
        let (subfolders, leaves) = frame.into_parts();
        let (left_subfolders, right_subfolders) = halve(subfolders);
        let (left_leaves, right_leaves) = halve(leaves);

        self.level += 1;
        let left = Partition {
            level: self.level,
            subfolders: left_subfolders,
            leaves: left_leaves,
        };
        let right = Partition {
            level: self.level,
            subfolders: right_subfolders,
            leaves: right_leaves,
        };
        trace!(left = %left.label(), right = %right.label(), "split");

        self.stack.push(Frame::Partition(right));
        SplitStep::Split(FolderCursor::from_partition(left))
    }
}

impl<'a> Iterator for FolderCursor<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lookahead
            .take()
            .or_else(|| self.advance())
            .map(Resolved::entry)
    }
}

/// Split at `len / 2`; a single item goes to the right.
fn halve<T>(mut items: Vec<T>) -> (Vec<T>, Vec<T>) {
    if items.len() < 2 {
        return (Vec::new(), items);
    }
    let right = items.split_off(items.len() / 2);
    (items, right)
}

impl Folder {
    /// Sequential cursor over every entry below this folder.
    pub fn iter(&self) -> FolderCursor<'_> {
        FolderCursor::new(self)
    }
}

impl<'a> IntoIterator for &'a Folder {
    type Item = Entry<'a>;
    type IntoIter = FolderCursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        FolderCursor::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> Document {
        Document::new(path, path.as_bytes().to_vec())
    }

    /// root/{a.txt, sub/{b.txt, c.txt}}
    fn scenario() -> Folder {
        Folder::new(
            "/root",
            vec![Folder::new(
                "/root/sub",
                Vec::new(),
                vec![doc("/root/sub/b.txt"), doc("/root/sub/c.txt")],
            )],
            vec![doc("/root/a.txt")],
        )
    }

    fn wide(count: usize) -> Folder {
        let subfolders = (0..count)
            .map(|i| {
                Folder::new(
                    format!("/w/d{i}"),
                    Vec::new(),
                    vec![doc(&format!("/w/d{i}/f.txt"))],
                )
            })
            .collect();
        Folder::new("/w", subfolders, vec![doc("/w/top.txt")])
    }

    fn names<'a>(entries: impl IntoIterator<Item = Entry<'a>>) -> Vec<String> {
        entries
            .into_iter()
            .map(|entry| entry.path().display().to_string())
            .collect()
    }

    #[test]
    fn test_lifo_order() {
        let root = scenario();
        assert_eq!(
            names(root.iter()),
            vec![
                "/root/sub",
                "/root/a.txt",
                "/root/sub/c.txt",
                "/root/sub/b.txt"
            ]
        );
    }

    #[test]
    fn test_siblings_reverse_order() {
        let root = Folder::new(
            "/r",
            vec![Folder::empty("/r/x"), Folder::empty("/r/y")],
            vec![doc("/r/1"), doc("/r/2")],
        );
        assert_eq!(names(&root), vec!["/r/y", "/r/x", "/r/2", "/r/1"]);
    }

    #[test]
    fn test_empty_folder_yields_nothing() {
        let root = Folder::empty("/empty");
        let mut cursor = root.iter();
        assert!(cursor.try_split().is_none());
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_split_on_document_declines() {
        let root = Folder::new("/r", Vec::new(), vec![doc("/r/only")]);
        let mut cursor = root.iter();
        assert!(cursor.try_split().is_none());
        assert_eq!(names(cursor), vec!["/r/only"]);
    }

    #[test]
    fn test_split_after_resolving_document_declines() {
        let root = Folder::new("/r", Vec::new(), vec![doc("/r/1"), doc("/r/2")]);
        let mut cursor = root.iter();
        assert!(cursor.next().is_some());
        assert!(cursor.try_split().is_none());
        assert_eq!(names(cursor), vec!["/r/1"]);
    }

    #[test]
    fn test_split_fresh_cursor_halves_root() {
        let root = wide(4);
        let mut cursor = root.iter();
        let other = cursor.try_split().expect("root has four subfolders");
        assert_eq!(other.level(), 1);

        let left = names(other);
        let right = names(cursor);
        assert_eq!(left.len() + right.len(), 9);
        assert!(left.contains(&"/w/d0".to_string()));
        assert!(right.contains(&"/w/d3".to_string()));
        assert!(right.contains(&"/w/top.txt".to_string()));
    }

    #[test]
    fn test_single_subfolder_defers() {
        // One subfolder, no splittable documents.
        let root = Folder::new(
            "/r",
            vec![Folder::new(
                "/r/only",
                vec![Folder::empty("/r/only/a"), Folder::empty("/r/only/b")],
                vec![doc("/r/only/x")],
            )],
            vec![doc("/r/top")],
        );
        let mut cursor = root.iter();
        assert!(matches!(cursor.split_step(), SplitStep::Deferred));
        let other = cursor.try_split().expect("hoisted children split");

        let mut all = names(other);
        all.extend(names(cursor));
        all.sort();
        assert_eq!(
            all,
            vec!["/r/only", "/r/only/a", "/r/only/b", "/r/only/x", "/r/top"]
        );
    }

    #[test]
    fn test_hoisted_leaves_split() {
        let root = Folder::new(
            "/r",
            vec![Folder::new("/r/s", Vec::new(), vec![doc("/r/s/x")])],
            Vec::new(),
        );
        let mut cursor = root.iter();
        assert!(matches!(cursor.split_step(), SplitStep::Deferred));
        // Partition now holds the hoisted folder and its document.
        assert!(cursor.try_split().is_some());
    }

    #[test]
    fn test_repeated_splitting_preserves_entries() {
        let root = Folder::new(
            "/t",
            vec![wide(5), scenario(), wide(2)],
            vec![doc("/t/a"), doc("/t/b"), doc("/t/c")],
        );
        let mut expected = names(root.iter());
        expected.sort();
        assert_eq!(expected.len() as u64, root.size() - 1);

        let mut pending = vec![root.iter()];
        let mut seen = Vec::new();
        while let Some(mut cursor) = pending.pop() {
            // Interleave yielding and splitting.
            if let Some(entry) = cursor.next() {
                seen.push(entry.path().display().to_string());
            }
            match cursor.split_eager() {
                Some(other) => {
                    pending.push(other);
                    pending.push(cursor);
                }
                None => seen.extend(names(cursor)),
            }
        }
        seen.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_partition_label() {
        let root = wide(2);
        let partition = Partition {
            level: 3,
            subfolders: root.subfolders().iter().collect(),
            leaves: vec![Entry::Document(&root.documents()[0])],
        };
        assert_eq!(partition.label(), "d0+d1+top.txt#3");
    }
}
