use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::LoadError;

use super::loader::load_dataset;
use super::query::Dataset;

// ---------------------------------------------------------------------------
// Memoized dataset keyed by the identity of both source files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::unreadable(path, e),
        })?;
        Ok(FileStamp {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Holds at most one loaded [`Dataset`]. Reloads only when either source
/// file changes (path, size or modification time) or after [`invalidate`].
///
/// [`invalidate`]: DatasetCache::invalidate
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<((FileStamp, FileStamp), Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn load(
        &mut self,
        index_path: &Path,
        industry_path: &Path,
    ) -> Result<Arc<Dataset>, LoadError> {
        let stamps = FileStamp::of(index_path)
            .and_then(|index| Ok((index, FileStamp::of(industry_path)?)));
        let key = match stamps {
            Ok(key) => key,
            Err(e) => {
                self.entry = None;
                return Err(e);
            }
        };

        if let Some((cached_key, dataset)) = &self.entry {
            if *cached_key == key {
                log::debug!("Source files unchanged; reusing cached dataset");
                return Ok(Arc::clone(dataset));
            }
        }

        self.entry = None;
        let dataset = Arc::new(load_dataset(index_path, industry_path)?);
        self.entry = Some((key, Arc::clone(&dataset)));
        Ok(dataset)
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::info!("Dataset cache invalidated");
        }
    }
}
