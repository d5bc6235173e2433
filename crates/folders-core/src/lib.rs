//! Core types for folders.
//!
//! This crate provides the in-memory tree model ([`Folder`], [`Document`]),
//! configuration and error types, and the traversal engine that exposes a
//! tree as a lazy sequence of [`Entry`] values, consumable sequentially or
//! split across rayon workers without flattening the tree.
//!
//! # Example
//!
//! ```rust
//! use folders_core::{Document, Folder};
//! use rayon::prelude::*;
//!
//! let root = Folder::new(
//!     "/root",
//!     vec![Folder::new(
//!         "/root/sub",
//!         Vec::new(),
//!         vec![Document::new("/root/sub/b.txt", "b")],
//!     )],
//!     vec![Document::new("/root/a.txt", "a")],
//! );
//!
//! assert_eq!(root.iter().count(), 3);
//! assert_eq!(root.par_iter().filter(|e| e.is_document()).count(), 2);
//! ```

mod batch;
mod config;
mod cursor;
mod error;
mod node;
mod par;
mod split;
mod stats;

pub use batch::BatchCursor;
pub use config::{
    BuildConfig, BuildConfigBuilder, SplitStrategy, TraversalConfig, TraversalConfigBuilder,
};
pub use cursor::FolderCursor;
pub use error::BuildError;
pub use node::{Dirent, Document, Entry, Folder};
pub use par::ParEntries;
pub use split::{SplitStep, Splittable};
pub use stats::TreeStats;
