use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Read and decode a JSON file. A missing or blank file is `Ok(None)`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Pretty-print `value` to `path`. Written to a sibling temp file first and
/// renamed into place.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    Ok(())
}

/// Move an unreadable file aside so it can be inspected later.
pub async fn quarantine(path: &Path) -> Result<PathBuf, StoreError> {
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt-{}", Utc::now().timestamp()));
    let target = PathBuf::from(target);

    tokio::fs::rename(path, &target)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    Ok(target)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_missing_and_blank_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let v: Option<BTreeMap<String, u32>> = read_json(&path).await.unwrap();
        assert!(v.is_none());

        tokio::fs::write(&path, "  \n").await.unwrap();
        let v: Option<BTreeMap<String, u32>> = read_json(&path).await.unwrap();
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);

        write_json(&path, &map).await.unwrap();
        let back: BTreeMap<String, u32> = read_json(&path).await.unwrap().unwrap();
        assert_eq!(back, map);
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_and_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = read_json::<BTreeMap<String, u32>>(&path).await.unwrap_err();
        assert!(err.is_corrupt());

        let moved = quarantine(&path).await.unwrap();
        assert!(!path.exists());
        assert!(moved.exists());
    }
}
