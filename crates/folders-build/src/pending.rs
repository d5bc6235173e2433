//! Folder accumulator used while children are still resolving.

use std::path::PathBuf;

use futures::future::try_join_all;
use itertools::{Either, Itertools};
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;

use folders_core::{BuildError, Dirent, Folder};

/// Handle to a child being resolved on the runtime. Dropping it aborts the task.
pub(crate) type ChildHandle = AbortOnDropHandle<Result<Dirent, BuildError>>;

/// A folder whose children have been dispatched but not yet joined.
pub(crate) struct PendingFolder {
    path: PathBuf,
    subfolders: Vec<ChildHandle>,
    documents: Vec<ChildHandle>,
}

impl PendingFolder {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            subfolders: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub(crate) fn push_subfolder(&mut self, handle: ChildHandle) {
        self.subfolders.push(handle);
    }

    pub(crate) fn push_document(&mut self, handle: ChildHandle) {
        self.documents.push(handle);
    }

    /// Number of dispatched children.
    pub(crate) fn len(&self) -> usize {
        self.subfolders.len() + self.documents.len()
    }

    /// Combine two partial accumulations of the same folder.
    ///
    /// Associative; only the handle lists are touched.
    pub(crate) fn merge(mut self, other: PendingFolder) -> PendingFolder {
        debug_assert_eq!(self.path, other.path);
        self.subfolders.extend(other.subfolders);
        self.documents.extend(other.documents);
        self
    }

    /// Await every child and produce the resolved folder.
    ///
    /// The first failure is returned and the remaining children are aborted.
    pub(crate) async fn join(self) -> Result<Folder, BuildError> {
        let PendingFolder {
            path,
            subfolders,
            documents,
        } = self;
        let children = subfolders.len() + documents.len();

        let handles = subfolders.into_iter().chain(documents);
        let resolved = try_join_all(handles.map(|handle| async move {
            handle.await.map_err(|e| BuildError::Task {
                message: e.to_string(),
            })?
        }))
        .await?;

        let (subfolders, documents): (Vec<_>, Vec<_>) =
            resolved.into_iter().partition_map(|dirent| match dirent {
                Dirent::Folder(folder) => Either::Left(folder),
                Dirent::Document(doc) => Either::Right(doc),
            });

        let folder = Folder::new(path, subfolders, documents);
        debug!(
            path = %folder.path().display(),
            children,
            size = folder.size(),
            "joined folder"
        );
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folders_core::Document;

    fn ready(dirent: Dirent) -> ChildHandle {
        AbortOnDropHandle::new(tokio::spawn(async move { Ok(dirent) }))
    }

    #[tokio::test]
    async fn test_merge_then_join() {
        let mut left = PendingFolder::new(PathBuf::from("/p"));
        left.push_document(ready(Document::new("/p/a", "a").into()));
        let mut right = PendingFolder::new(PathBuf::from("/p"));
        right.push_subfolder(ready(Folder::empty("/p/s").into()));
        right.push_document(ready(Document::new("/p/b", "b").into()));

        let merged = left.merge(right);
        assert_eq!(merged.len(), 3);

        let folder = merged.join().await.unwrap();
        assert_eq!(folder.size(), 4);
        assert_eq!(folder.subfolders().len(), 1);
        let names: Vec<_> = folder.documents().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_join_fails_fast() {
        let mut pending = PendingFolder::new(PathBuf::from("/p"));
        pending.push_document(ready(Document::new("/p/a", "a").into()));
        pending.push_document(AbortOnDropHandle::new(tokio::spawn(async {
            Err(BuildError::NotFound {
                path: PathBuf::from("/p/gone"),
            })
        })));

        let err = pending.join().await.unwrap_err();
        assert!(matches!(err, BuildError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_join_empty() {
        let folder = PendingFolder::new(PathBuf::from("/p")).join().await.unwrap();
        assert_eq!(folder.size(), 1);
        assert!(folder.is_empty());
    }
}
