//! Fold configuration

use std::path::Path;

use normalize::NormalizeOptions;
use serde::{Deserialize, Serialize};

use crate::error::{FoldError, Result};

/// Settings for one fold run, loadable from a JSON file
///
/// ```json
/// { "prefetch": true, "normalize": { "table_style": "TableGrid" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldOptions {
    /// Style names the normalizer emits
    pub normalize: NormalizeOptions,
    /// Read and normalize sources ahead of the fold on worker threads
    pub prefetch: bool,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            prefetch: true,
        }
    }
}

impl FoldOptions {
    /// Load options from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FoldError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| FoldError::Config(format!("{}: {}", path.display(), e)))
    }
}
