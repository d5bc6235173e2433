//! Storage backends the tree builder reads from.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};

use folders_core::BuildError;

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// A directory that can be listed.
    Directory,
    /// A regular file that can be read.
    File,
    /// A symbolic link, not yet resolved.
    Symlink,
}

/// Directory-listing and file-reading primitives.
///
/// Methods return boxed futures so the trait stays object safe and the
/// builder can spawn work onto a multi-threaded runtime.
pub trait Storage: Send + Sync + 'static {
    /// Resolve what `path` is without following a symbolic link. Fails if it
    /// does not exist or is neither a directory, a regular file nor a link.
    fn kind<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<StorageKind, BuildError>>;

    /// Resolve what `path` is, following symbolic links. Never returns
    /// [`StorageKind::Symlink`].
    fn resolve<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<StorageKind, BuildError>> {
        self.kind(path)
    }

    /// Direct children of a directory, not including the directory itself.
    fn list_children<'a>(&'a self, path: &'a Path)
        -> BoxFuture<'a, Result<Vec<PathBuf>, BuildError>>;

    /// Full contents of a file.
    fn read_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Vec<u8>, BuildError>>;
}

/// Local filesystem backed by `tokio::fs`.
///
/// [`Storage::kind`] reports links as [`StorageKind::Symlink`];
/// [`Storage::resolve`] follows them, and a broken link fails with `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a new local storage.
    pub fn new() -> Self {
        Self
    }
}

fn local_kind(path: &Path, file_type: std::fs::FileType) -> Result<StorageKind, BuildError> {
    if file_type.is_symlink() {
        Ok(StorageKind::Symlink)
    } else if file_type.is_dir() {
        Ok(StorageKind::Directory)
    } else if file_type.is_file() {
        Ok(StorageKind::File)
    } else {
        Err(BuildError::UnsupportedKind {
            path: path.to_path_buf(),
        })
    }
}

impl Storage for LocalStorage {
    fn kind<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<StorageKind, BuildError>> {
        async move {
            let metadata = tokio::fs::symlink_metadata(path)
                .await
                .map_err(|e| BuildError::io(path, e))?;
            local_kind(path, metadata.file_type())
        }
        .boxed()
    }

    fn resolve<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<StorageKind, BuildError>> {
        async move {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| BuildError::io(path, e))?;
            local_kind(path, metadata.file_type())
        }
        .boxed()
    }

    fn list_children<'a>(
        &'a self,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<PathBuf>, BuildError>> {
        async move {
            let mut entries = tokio::fs::read_dir(path)
                .await
                .map_err(|e| BuildError::io(path, e))?;
            let mut children = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| BuildError::io(path, e))?
            {
                children.push(entry.path());
            }
            Ok(children)
        }
        .boxed()
    }

    fn read_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Vec<u8>, BuildError>> {
        async move { tokio::fs::read(path).await.map_err(|e| BuildError::io(path, e)) }.boxed()
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    Directory,
    File(Vec<u8>),
}

/// In-memory storage with optional injected failures.
///
/// Adding a file creates its missing ancestors as directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    nodes: BTreeMap<PathBuf, MemoryNode>,
    failures: BTreeSet<PathBuf>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and its missing ancestors.
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.insert_ancestors_and(path.into(), MemoryNode::Directory);
        self
    }

    /// Add a file and its missing ancestors.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert_ancestors_and(path.into(), MemoryNode::File(contents.into()));
        self
    }

    /// Make every operation on `path` fail with a permission error.
    pub fn fail_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into());
        self
    }

    fn insert_ancestors_and(&mut self, path: PathBuf, node: MemoryNode) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(MemoryNode::Directory);
        }
        self.nodes.insert(path, node);
    }

    fn lookup(&self, path: &Path) -> Result<&MemoryNode, BuildError> {
        if self.failures.contains(path) {
            return Err(BuildError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
            ));
        }
        self.nodes.get(path).ok_or_else(|| BuildError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

impl Storage for MemoryStorage {
    fn kind<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<StorageKind, BuildError>> {
        async move {
            // Failures surface when the path is listed or read, not probed.
            match self.nodes.get(path) {
                Some(MemoryNode::Directory) => Ok(StorageKind::Directory),
                Some(MemoryNode::File(_)) => Ok(StorageKind::File),
                None => Err(BuildError::NotFound {
                    path: path.to_path_buf(),
                }),
            }
        }
        .boxed()
    }

    fn list_children<'a>(
        &'a self,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<PathBuf>, BuildError>> {
        async move {
            match self.lookup(path)? {
                MemoryNode::Directory => Ok(self
                    .nodes
                    .keys()
                    .filter(|child| child.parent() == Some(path))
                    .cloned()
                    .collect()),
                MemoryNode::File(_) => Err(BuildError::NotADirectory {
                    path: path.to_path_buf(),
                }),
            }
        }
        .boxed()
    }

    fn read_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Vec<u8>, BuildError>> {
        async move {
            match self.lookup(path)? {
                MemoryNode::File(contents) => Ok(contents.clone()),
                MemoryNode::Directory => Err(BuildError::io(
                    path,
                    io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
                )),
            }
        }
        .boxed()
    }
}
