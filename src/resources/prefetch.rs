//! Worker-side file reads.
//!
//! Reading level, shader, mesh and image files is the slow part of a load and
//! needs no GPU access, so it can run on the tokio runtime ahead of time. The
//! resulting [`Prefetched`] bytes are handed to the render thread's
//! [`Context`](crate::context::Context), which uploads from them.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Bytes of files read ahead of time, keyed by the path they were read from.
#[derive(Debug, Default)]
pub struct Prefetched {
    files: HashMap<PathBuf, Vec<u8>>,
    failed: Vec<PathBuf>,
}

impl Prefetched {
    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths that could not be read. Loading them later reports the error
    /// from the render thread's own read.
    pub fn failed(&self) -> &[PathBuf] {
        &self.failed
    }

    pub(crate) fn into_files(self) -> HashMap<PathBuf, Vec<u8>> {
        self.files
    }
}

/// Read all `paths` concurrently.
pub async fn prefetch(paths: Vec<PathBuf>) -> Prefetched {
    let reads = paths.into_iter().map(|path| async move {
        let result = tokio::fs::read(&path).await;
        (path, result)
    });

    let mut prefetched = Prefetched::default();
    for (path, result) in futures::future::join_all(reads).await {
        match result {
            Ok(bytes) => {
                prefetched.files.insert(path, bytes);
            }
            Err(e) => {
                log::warn!("prefetch of {} failed: {e}", path.display());
                prefetched.failed.push(path);
            }
        }
    }
    prefetched
}
