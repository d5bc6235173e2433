//! Concurrent tree construction for folders.
//!
//! This crate turns a directory on some [`Storage`] into a fully resolved
//! in-memory [`Folder`] tree. Every child of a folder is resolved as its own
//! tokio task: subdirectories recurse, files are read whole.
//!
//! # Overview
//!
//! - **Fail-fast**: the first listing or read error fails the whole build and
//!   aborts the tasks still running
//! - **Progress updates** via broadcast channels
//! - **Resolution hook** called once per node, children before parents
//! - **Pluggable storage**: [`LocalStorage`] for the local filesystem,
//!   [`MemoryStorage`] for in-process trees
//!
//! # Example
//!
//! ```rust,no_run
//! use folders_build::{BuildConfig, LocalStorage, TreeBuilder};
//!
//! # async fn run() -> Result<(), folders_build::BuildError> {
//! let builder = TreeBuilder::new(LocalStorage::new(), BuildConfig::new("/path/to/tree"))?;
//! let root = builder.build().await?;
//!
//! println!("Entries: {}", root.size() - 1);
//! println!("Documents: {}", root.document_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use folders_build::{BuildConfig, LocalStorage, TreeBuilder};
//!
//! # async fn run() -> Result<(), folders_build::BuildError> {
//! let builder = TreeBuilder::new(LocalStorage::new(), BuildConfig::new("."))?;
//! let mut progress_rx = builder.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Read {} documents", progress.documents_resolved);
//!     }
//! });
//! let _root = builder.build().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod pending;
mod progress;
mod storage;

pub use builder::{ResolvedCallback, TreeBuilder, build_tree};
pub use progress::BuildProgress;
pub use storage::{LocalStorage, MemoryStorage, Storage, StorageKind};

// Re-export core types for convenience
pub use folders_core::{BuildConfig, BuildError, Dirent, Document, Entry, Folder};
