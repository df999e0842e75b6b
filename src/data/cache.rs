use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::loader::{self, LoadError};
use super::model::InjuryDataset;

// ---------------------------------------------------------------------------
// Process-wide dataset cache
// ---------------------------------------------------------------------------

static CACHE: Mutex<Option<HashMap<PathBuf, CachedDataset>>> = Mutex::new(None);

struct CachedDataset {
    modified: Option<SystemTime>,
    dataset: Arc<InjuryDataset>,
}

/// Load a dataset through the process-wide cache.
///
/// Keyed by canonical path; the cached copy is reused as long as the file's
/// modification time is unchanged.  The returned `Arc` is shared across all
/// consumers; the dataset itself is immutable after enrichment.
pub fn load_cached(path: &Path) -> Result<Arc<InjuryDataset>, LoadError> {
    let key = cache_key(path);
    let modified = file_mtime(path);

    {
        let mut guard = CACHE.lock().expect("dataset cache lock poisoned");
        let cache = guard.get_or_insert_with(HashMap::new);
        if let Some(entry) = cache.get(&key) {
            if modified.is_some() && entry.modified == modified {
                log::info!("dataset cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
        }
    }

    let dataset = Arc::new(loader::load_file(path)?);

    let mut guard = CACHE.lock().expect("dataset cache lock poisoned");
    let cache = guard.get_or_insert_with(HashMap::new);
    cache.insert(
        key,
        CachedDataset {
            modified,
            dataset: Arc::clone(&dataset),
        },
    );
    Ok(dataset)
}

/// Drop the cached entry for one source path.
pub fn invalidate(path: &Path) {
    let mut guard = CACHE.lock().expect("dataset cache lock poisoned");
    if let Some(cache) = guard.as_mut() {
        cache.remove(&cache_key(path));
    }
}

/// Drop every cached dataset.
pub fn clear() {
    let mut guard = CACHE.lock().expect("dataset cache lock poisoned");
    if let Some(cache) = guard.as_mut() {
        cache.clear();
    }
}

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn temp_csv(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("footlens_cache_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}_{name}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn repeated_loads_share_one_dataset() {
        let path = temp_csv("shared.csv", "Name,Team Name\nSaka,Arsenal\n");
        let first = load_cached(&path).unwrap();
        let second = load_cached(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidation_forces_a_reload() {
        let path = temp_csv("invalidate.csv", "Name,Team Name\nSaka,Arsenal\n");
        let first = load_cached(&path).unwrap();
        invalidate(&path);
        let second = load_cached(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn missing_file_error_passes_through() {
        let err = load_cached(Path::new("/nonexistent/footlens.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
    }
}
