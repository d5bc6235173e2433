//! Folder and document node types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A leaf of the tree: a file and its full contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    name: CompactString,
    path: PathBuf,
    contents: Vec<u8>,
}

impl Document {
    /// Create a document from its location and the bytes read from it.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            name: last_segment(&path),
            path,
            contents: contents.into(),
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw contents, exactly as read at build time.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }

    /// Length of the contents in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Check if the document has no contents.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// An interior node of the tree.
///
/// A `Folder` is only ever handed out fully resolved: every descendant has
/// been read and `size` already accounts for the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    name: CompactString,
    path: PathBuf,
    subfolders: Vec<Folder>,
    documents: Vec<Document>,
    size: u64,
}

impl Folder {
    /// Create a folder from its resolved children.
    pub fn new(
        path: impl Into<PathBuf>,
        subfolders: Vec<Folder>,
        documents: Vec<Document>,
    ) -> Self {
        let path = path.into();
        let size = 1
            + documents.len() as u64
            + subfolders.iter().map(|folder| folder.size).sum::<u64>();
        Self {
            name: last_segment(&path),
            path,
            subfolders,
            documents,
            size,
        }
    }

    /// Create a folder with no children.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Vec::new(), Vec::new())
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full location of the folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Direct subfolders, in the order they were resolved.
    pub fn subfolders(&self) -> &[Folder] {
        &self.subfolders
    }

    /// Direct documents, in the order they were resolved.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of nodes in this subtree, counting the folder itself.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if the folder has no direct children.
    pub fn is_empty(&self) -> bool {
        self.subfolders.is_empty() && self.documents.is_empty()
    }

    /// Total number of documents in this subtree.
    pub fn document_count(&self) -> u64 {
        self.documents.len() as u64
            + self
                .subfolders
                .iter()
                .map(Folder::document_count)
                .sum::<u64>()
    }

    /// Total number of folders below this one.
    pub fn folder_count(&self) -> u64 {
        self.subfolders.len() as u64
            + self
                .subfolders
                .iter()
                .map(Folder::folder_count)
                .sum::<u64>()
    }

    /// Total bytes of document contents in this subtree.
    pub fn content_bytes(&self) -> u64 {
        self.documents.iter().map(|doc| doc.len() as u64).sum::<u64>()
            + self
                .subfolders
                .iter()
                .map(Folder::content_bytes)
                .sum::<u64>()
    }

    /// Look up a direct subfolder by name.
    pub fn subfolder(&self, name: &str) -> Option<&Folder> {
        self.subfolders.iter().find(|folder| folder.name == name)
    }

    /// Look up a direct document by name.
    pub fn document(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.name == name)
    }
}

/// A resolved child, owned. Produced by the tree builder for every path it
/// dispatches and partitioned back into a parent folder on join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dirent {
    /// A resolved subdirectory.
    Folder(Folder),
    /// A resolved file.
    Document(Document),
}

impl Dirent {
    /// Last path segment.
    pub fn name(&self) -> &str {
        match self {
            Dirent::Folder(folder) => folder.name(),
            Dirent::Document(doc) => doc.name(),
        }
    }

    /// Full location.
    pub fn path(&self) -> &Path {
        match self {
            Dirent::Folder(folder) => folder.path(),
            Dirent::Document(doc) => doc.path(),
        }
    }

    /// Number of nodes this entry contributes to its parent's size.
    pub fn size(&self) -> u64 {
        match self {
            Dirent::Folder(folder) => folder.size(),
            Dirent::Document(_) => 1,
        }
    }

    /// Borrow as a traversal entry.
    pub fn as_entry(&self) -> Entry<'_> {
        match self {
            Dirent::Folder(folder) => Entry::Folder(folder),
            Dirent::Document(doc) => Entry::Document(doc),
        }
    }
}

impl From<Folder> for Dirent {
    fn from(folder: Folder) -> Self {
        Dirent::Folder(folder)
    }
}

impl From<Document> for Dirent {
    fn from(doc: Document) -> Self {
        Dirent::Document(doc)
    }
}

/// A node yielded by traversal, borrowed from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    /// A real folder of the tree.
    Folder(&'a Folder),
    /// A document of the tree.
    Document(&'a Document),
}

impl<'a> Entry<'a> {
    /// Last path segment.
    pub fn name(&self) -> &'a str {
        match *self {
            Entry::Folder(folder) => folder.name(),
            Entry::Document(doc) => doc.name(),
        }
    }

    /// Full location.
    pub fn path(&self) -> &'a Path {
        match *self {
            Entry::Folder(folder) => folder.path(),
            Entry::Document(doc) => doc.path(),
        }
    }

    /// Check if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    /// Check if this entry is a document.
    pub fn is_document(&self) -> bool {
        matches!(self, Entry::Document(_))
    }

    /// The folder, if this entry is one.
    pub fn as_folder(&self) -> Option<&'a Folder> {
        match *self {
            Entry::Folder(folder) => Some(folder),
            Entry::Document(_) => None,
        }
    }

    /// The document, if this entry is one.
    pub fn as_document(&self) -> Option<&'a Document> {
        match *self {
            Entry::Document(doc) => Some(doc),
            Entry::Folder(_) => None,
        }
    }
}

fn last_segment(path: &Path) -> CompactString {
    path.file_name()
        .map(|name| CompactString::new(name.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
