//! Reading and normalizing sources ahead of the fold
//!
//! Preparing a source does not depend on the target, so every source can be
//! read and normalized on a blocking worker while earlier ones are folded.
//! The fold itself still takes the sources one at a time, in caller order.

use std::path::PathBuf;

use normalize::NormalizeOptions;
use store::Package;
use tokio::task::JoinHandle;

use crate::engine::{commit, FoldEngine, FoldReport};
use crate::error::{FoldError, Result};
use crate::options::FoldOptions;
use crate::source::PreparedSource;

/// Start preparing every source on the blocking pool
///
/// The handles come back in the order of `paths`.
pub fn prefetch_sources(
    paths: &[PathBuf],
    options: &NormalizeOptions,
) -> Vec<JoinHandle<Result<PreparedSource>>> {
    paths
        .iter()
        .cloned()
        .map(|path| {
            let options = options.clone();
            tokio::task::spawn_blocking(move || PreparedSource::load(&path, &options))
        })
        .collect()
}

async fn join(handle: JoinHandle<Result<PreparedSource>>) -> Result<PreparedSource> {
    handle
        .await
        .map_err(|e| FoldError::Prefetch(e.to_string()))?
}

/// Async form of [`crate::merge_documents`]
///
/// With `options.prefetch` set, all sources are read and normalized up
/// front in parallel; otherwise each one is prepared just before it is
/// folded. Either way the first failing source, in caller order, ends the
/// run and `output` is left as it was.
pub async fn merge_documents_async(
    template: PathBuf,
    sources: Vec<PathBuf>,
    output: PathBuf,
    options: FoldOptions,
) -> Result<FoldReport> {
    tracing::info!(
        "Merging {} sources into {} (template {}, prefetch {})",
        sources.len(),
        output.display(),
        template.display(),
        options.prefetch
    );

    let handles = if options.prefetch {
        prefetch_sources(&sources, &options.normalize)
    } else {
        Vec::new()
    };
    let mut pending = handles.into_iter();

    let package = tokio::task::spawn_blocking(move || Package::open(template))
        .await
        .map_err(|e| FoldError::Prefetch(e.to_string()))?
        .map_err(FoldError::Template)?;
    let mut engine = FoldEngine::new(package, &options)?;

    for path in sources {
        let source = match pending.next() {
            Some(handle) => join(handle).await?,
            None => {
                let normalize = options.normalize.clone();
                join(tokio::task::spawn_blocking(move || {
                    PreparedSource::load(&path, &normalize)
                }))
                .await?
            }
        };
        engine.fold(&source)?;
    }

    tokio::task::spawn_blocking(move || commit(engine, &output))
        .await
        .map_err(|e| FoldError::Prefetch(e.to_string()))?
}
