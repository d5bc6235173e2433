//! Build and traversal configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for building a tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BuildConfig {
    /// Root directory to build from.
    pub root: PathBuf,

    /// Number of listed children accumulated per pending chunk.
    #[builder(default = "64")]
    #[serde(default = "default_listing_chunk")]
    pub listing_chunk: usize,

    /// Maximum number of files read at the same time.
    #[builder(default = "64")]
    #[serde(default = "default_max_open_files")]
    pub max_open_files: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links below the root. Links are skipped otherwise.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Glob patterns matched against child names; matches are skipped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_listing_chunk() -> usize {
    64
}

fn default_max_open_files() -> usize {
    64
}

impl BuildConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.listing_chunk == Some(0) {
            return Err("Listing chunk must be at least 1".to_string());
        }
        if self.max_open_files == Some(0) {
            return Err("Max open files must be at least 1".to_string());
        }
        Ok(())
    }
}

impl BuildConfig {
    /// Create a new build config builder.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }

    /// Create a simple config for building from a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listing_chunk: default_listing_chunk(),
            max_open_files: default_max_open_files(),
            include_hidden: true,
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
        }
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// How a folder is divided for parallel consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Recursive halving of folder contents.
    #[default]
    Binary,
    /// One flat batch sized from the tree size and the parallelism.
    Batch,
}

/// Configuration for traversing a tree.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct TraversalConfig {
    /// Number of parallel workers assumed when sizing batches (0 = auto-detect).
    #[serde(default)]
    pub parallelism: usize,

    /// Splitting strategy for parallel traversal.
    #[serde(default)]
    pub strategy: SplitStrategy,
}

impl TraversalConfig {
    /// Create a new traversal config builder.
    pub fn builder() -> TraversalConfigBuilder {
        TraversalConfigBuilder::default()
    }

    /// Effective parallelism, resolving 0 to the current rayon pool size.
    pub fn effective_parallelism(&self) -> usize {
        match self.parallelism {
            0 => rayon::current_num_threads().max(1),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BuildConfig::builder()
            .root("/home/user")
            .listing_chunk(8usize)
            .include_hidden(false)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.listing_chunk, 8);
        assert_eq!(config.max_open_files, 64);
        assert!(!config.include_hidden);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_config_builder_rejects_zero_chunk() {
        let result = BuildConfig::builder()
            .root("/home/user")
            .listing_chunk(0usize)
            .build();
        assert!(result.is_err());

        assert!(BuildConfig::builder().build().is_err());
    }

    #[test]
    fn test_should_skip_hidden() {
        let mut config = BuildConfig::new("/test");
        assert!(!config.should_skip_hidden(".git"));

        config.include_hidden = false;
        assert!(config.should_skip_hidden(".git"));
        assert!(!config.should_skip_hidden("src"));
    }

    #[test]
    fn test_traversal_config() {
        let config = TraversalConfig::builder()
            .parallelism(3usize)
            .strategy(SplitStrategy::Batch)
            .build()
            .unwrap();
        assert_eq!(config.effective_parallelism(), 3);
        assert_eq!(config.strategy, SplitStrategy::Batch);

        assert!(TraversalConfig::default().effective_parallelism() >= 1);
    }
}
