//! Concurrent tree builder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, try_join_all};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::{Semaphore, broadcast};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info};

use folders_core::{BuildConfig, BuildError, Dirent, Document, Entry, Folder};

use crate::pending::PendingFolder;
use crate::progress::{BuildProgress, ProgressTracker};
use crate::storage::{Storage, StorageKind};

/// Notification hook called once per resolved node.
///
/// A node is reported after all of its children, and before its parent.
pub type ResolvedCallback = Arc<dyn Fn(Entry<'_>) + Send + Sync>;

/// Send a progress update every this many resolved documents.
const PROGRESS_INTERVAL: u64 = 1000;

/// Builds in-memory [`Folder`] trees from a [`Storage`].
pub struct TreeBuilder<S> {
    storage: Arc<S>,
    config: BuildConfig,
    ignore: GlobSet,
    on_resolved: Option<ResolvedCallback>,
    progress_tx: broadcast::Sender<BuildProgress>,
}

impl<S: Storage> TreeBuilder<S> {
    /// Create a new builder.
    pub fn new(storage: S, config: BuildConfig) -> Result<Self, BuildError> {
        if config.listing_chunk == 0 || config.max_open_files == 0 {
            return Err(BuildError::InvalidConfig {
                message: "listing_chunk and max_open_files must be at least 1".to_string(),
            });
        }
        let ignore = compile_patterns(&config.ignore_patterns)?;
        let (progress_tx, _) = broadcast::channel(100);
        Ok(Self {
            storage: Arc::new(storage),
            config,
            ignore,
            on_resolved: None,
            progress_tx,
        })
    }

    /// Register a callback invoked once per resolved folder or document.
    pub fn on_resolved(mut self, callback: impl Fn(Entry<'_>) + Send + Sync + 'static) -> Self {
        self.on_resolved = Some(Arc::new(callback));
        self
    }

    /// Subscribe to build progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<BuildProgress> {
        self.progress_tx.subscribe()
    }

    /// Build the tree rooted at the configured root.
    pub async fn build(&self) -> Result<Folder, BuildError> {
        self.build_path(self.config.root.clone()).await
    }

    /// Build the tree rooted at `root`.
    ///
    /// Fails if `root` is not a directory, or if any listing or read below
    /// it fails. No partial tree is returned.
    pub async fn build_path(&self, root: impl Into<PathBuf>) -> Result<Folder, BuildError> {
        let root = root.into();
        let ctx = Arc::new(BuildContext {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            ignore: self.ignore.clone(),
            on_resolved: self.on_resolved.clone(),
            read_permits: Semaphore::new(self.config.max_open_files),
            progress_tx: self.progress_tx.clone(),
            tracker: ProgressTracker::new(),
        });

        if ctx.storage.resolve(&root).await? != StorageKind::Directory {
            return Err(BuildError::NotADirectory { path: root });
        }

        info!(root = %root.display(), "building tree");
        let folder = build_folder(Arc::clone(&ctx), root.clone()).await?;

        let progress = ctx.tracker.snapshot(root);
        info!(
            size = folder.size(),
            documents = progress.documents_resolved,
            bytes = progress.bytes_read,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            "tree built"
        );
        let _ = ctx.progress_tx.send(progress);
        Ok(folder)
    }
}

/// Build the tree rooted at `root` with the default configuration.
pub async fn build_tree<S: Storage>(
    storage: S,
    root: impl Into<PathBuf>,
    on_resolved: Option<ResolvedCallback>,
) -> Result<Folder, BuildError> {
    let root = root.into();
    let mut builder = TreeBuilder::new(storage, BuildConfig::new(&root))?;
    builder.on_resolved = on_resolved;
    builder.build_path(root).await
}

/// State shared by every task of one build.
struct BuildContext<S> {
    storage: Arc<S>,
    config: BuildConfig,
    ignore: GlobSet,
    on_resolved: Option<ResolvedCallback>,
    read_permits: Semaphore,
    progress_tx: broadcast::Sender<BuildProgress>,
    tracker: ProgressTracker,
}

impl<S: Storage> BuildContext<S> {
    fn should_skip(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        self.config.should_skip_hidden(&name.to_string_lossy()) || self.ignore.is_match(name)
    }

    /// Kind of a listed child, or `None` when it is a link that is not
    /// followed.
    async fn probe(&self, path: &Path) -> Result<Option<StorageKind>, BuildError> {
        match self.storage.kind(path).await? {
            StorageKind::Symlink if self.config.follow_symlinks => {
                self.storage.resolve(path).await.map(Some)
            }
            StorageKind::Symlink => {
                debug!(path = %path.display(), "skipping symlink");
                Ok(None)
            }
            kind => Ok(Some(kind)),
        }
    }

    fn resolved(&self, entry: Entry<'_>) {
        if let Some(callback) = &self.on_resolved {
            callback(entry);
        }
    }
}

/// List, dispatch and join one folder. Children run as separate tasks.
fn build_folder<S: Storage>(
    ctx: Arc<BuildContext<S>>,
    path: PathBuf,
) -> BoxFuture<'static, Result<Folder, BuildError>> {
    async move {
        let children: Vec<PathBuf> = ctx
            .storage
            .list_children(&path)
            .await?
            .into_iter()
            .filter(|child| child != &path && !ctx.should_skip(child))
            .collect();

        let partials = try_join_all(
            children
                .chunks(ctx.config.listing_chunk)
                .map(|chunk| dispatch_chunk(Arc::clone(&ctx), path.clone(), chunk.to_vec())),
        )
        .await?;
        let pending = partials
            .into_iter()
            .fold(PendingFolder::new(path.clone()), PendingFolder::merge);

        let folder = pending.join().await?;
        ctx.tracker.record_folder();
        ctx.resolved(Entry::Folder(&folder));
        Ok(folder)
    }
    .boxed()
}

/// Probe one chunk of children and spawn a task per child.
async fn dispatch_chunk<S: Storage>(
    ctx: Arc<BuildContext<S>>,
    parent: PathBuf,
    chunk: Vec<PathBuf>,
) -> Result<PendingFolder, BuildError> {
    let kinds = try_join_all(chunk.iter().map(|child| ctx.probe(child))).await?;

    let mut pending = PendingFolder::new(parent.clone());
    for (child, kind) in chunk.into_iter().zip(kinds) {
        let task_ctx = Arc::clone(&ctx);
        match kind {
            Some(StorageKind::Directory) => {
                pending.push_subfolder(AbortOnDropHandle::new(tokio::spawn(async move {
                    build_folder(task_ctx, child).await.map(Dirent::Folder)
                })));
            }
            Some(StorageKind::File) => {
                pending.push_document(AbortOnDropHandle::new(tokio::spawn(read_document(
                    task_ctx, child,
                ))));
            }
            Some(StorageKind::Symlink) | None => {}
        }
    }
    debug!(parent = %parent.display(), children = pending.len(), "dispatched chunk");
    Ok(pending)
}

async fn read_document<S: Storage>(
    ctx: Arc<BuildContext<S>>,
    path: PathBuf,
) -> Result<Dirent, BuildError> {
    let contents = {
        let _permit = ctx
            .read_permits
            .acquire()
            .await
            .map_err(|e| BuildError::Task {
                message: e.to_string(),
            })?;
        ctx.storage.read_all(&path).await?
    };

    let document = Document::new(path, contents);
    let count = ctx.tracker.record_document(document.len() as u64);
    if count % PROGRESS_INTERVAL == 0 {
        let _ = ctx
            .progress_tx
            .send(ctx.tracker.snapshot(document.path().to_path_buf()));
    }
    ctx.resolved(Entry::Document(&document));
    Ok(Dirent::Document(document))
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, BuildError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| BuildError::InvalidConfig {
            message: format!("invalid ignore pattern {pattern:?}: {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| BuildError::InvalidConfig {
        message: e.to_string(),
    })
}
