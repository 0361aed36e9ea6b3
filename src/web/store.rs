use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no file uploaded yet")]
    Missing,
    #[error("upload store i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// File contents as they were at one generation of the store.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub bytes: Vec<u8>,
}

/// The single stored CSV.
///
/// Uploads replace it through a temp file and rename under the write lock;
/// readers copy the bytes out under the read lock, so each request works on
/// one complete version.
#[derive(Debug)]
pub struct UploadStore {
    path: PathBuf,
    generation: AtomicU64,
    lock: RwLock<()>,
}

impl UploadStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            generation: AtomicU64::new(0),
            lock: RwLock::new(()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Create the parent directory if needed.
    pub fn prepare(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub async fn save(&self, bytes: &[u8]) -> Result<u64, StoreError> {
        let _guard = self.lock.write().await;
        self.prepare()?;
        let tmp = self.path.with_extension("csv.part");
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            "stored {} bytes at {} (generation {generation})",
            bytes.len(),
            self.path.display()
        );
        Ok(generation)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let _guard = self.lock.read().await;
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Snapshot {
                generation: self.generation(),
                bytes,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::Missing),
            Err(e) => Err(e.into()),
        }
    }
}
