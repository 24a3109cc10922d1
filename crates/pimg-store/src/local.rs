use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tracing::{debug, error, info, warn};

use crate::bounded::PartialFile;
use crate::error::{StoreError, StoreResult};
use crate::key::{CollectionId, Filename, ObjectKey};
use crate::resolver::PathResolver;
use crate::traits::{FileStore, UploadReader};

/// Settings captured by [`LocalStorage`] at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory under which every object is stored.
    pub root: PathBuf,
    /// Maximum size of a single object in bytes.
    pub max_object_size: u64,
}

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>, max_object_size: u64) -> Self {
        Self {
            root: root.into(),
            max_object_size,
        }
    }
}

/// Local filesystem store.
///
/// Layout: `<root>/<collection>/<filename>`, one file per object, no sidecar
/// metadata. Uploads are staged in a hidden sibling file and renamed into
/// place once the bounded copy succeeds.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    resolver: PathResolver,
    max_object_size: u64,
}

impl LocalStorage {
    /// Create the store, creating the root directory if needed.
    pub fn new(config: &StorageConfig) -> StoreResult<Self> {
        let resolver = PathResolver::new(&config.root)?;
        std::fs::create_dir_all(resolver.root())?;
        info!(
            root = %resolver.root().display(),
            max_object_size = config.max_object_size,
            "opened local image storage"
        );
        Ok(Self {
            resolver,
            max_object_size: config.max_object_size,
        })
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Open a staging file for `target`. A failed concurrent save may remove
    /// the collection directory it created between our `create_dir_all` and
    /// here, so a missing directory is recreated once.
    async fn stage(&self, target: &Path, dir: &Path) -> StoreResult<PartialFile> {
        match PartialFile::create(target).await {
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "collection directory vanished, recreating");
                fs::create_dir_all(dir).await?;
                PartialFile::create(target).await
            }
            other => other,
        }
    }

    async fn write_staged(
        &self,
        target: &Path,
        dir: &Path,
        reader: &mut UploadReader<'_>,
    ) -> StoreResult<u64> {
        let mut partial = self.stage(target, dir).await?;
        match partial.copy_from(reader, self.max_object_size).await {
            Ok(written) => {
                partial.persist(target).await?;
                Ok(written)
            }
            Err(e) => {
                partial.discard().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl FileStore for LocalStorage {
    fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    fn max_object_size(&self) -> u64 {
        self.max_object_size
    }

    async fn save(
        &self,
        collection: CollectionId,
        filename: &str,
        reader: &mut UploadReader<'_>,
    ) -> StoreResult<u64> {
        let key = ObjectKey::new(collection, Filename::parse(filename)?);
        let target = self.resolver.resolve(&key)?;
        let dir = target
            .parent()
            .ok_or_else(|| StoreError::InvalidPath("object path has no parent".into()))?;

        let created_dir = !fs::try_exists(dir).await?;
        fs::create_dir_all(dir).await?;

        match self.write_staged(&target, dir, reader).await {
            Ok(written) => {
                debug!(key = %key, bytes = written, "saved object");
                Ok(written)
            }
            Err(e) => {
                if created_dir {
                    // Fails harmlessly when a concurrent save already put a
                    // file in the directory.
                    let _ = fs::remove_dir(dir).await;
                }
                match &e {
                    StoreError::LimitExceeded { limit } => {
                        warn!(key = %key, limit, "upload rejected: size limit exceeded")
                    }
                    StoreError::Io(io) => error!(key = %key, error = %io, "failed to save object"),
                    other => debug!(key = %key, error = %other, "save aborted"),
                }
                Err(e)
            }
        }
    }

    async fn get(&self, path: &Path) -> StoreResult<File> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        if !file.metadata().await?.is_file() {
            return Err(StoreError::NotFound);
        }
        Ok(file)
    }
}
