use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncRead;

use crate::error::StoreResult;
use crate::key::{CollectionId, ObjectKey};
use crate::resolver::PathResolver;

/// Byte source accepted by [`FileStore::save`].
pub type UploadReader<'a> = dyn AsyncRead + Unpin + Send + 'a;

/// Image file store keyed by `(collection, filename)`.
///
/// All implementations must satisfy these invariants:
/// - The filename grammar is checked before any filesystem call.
/// - A failed or cancelled save leaves nothing visible at the target path.
/// - Saving an existing key replaces its content; there is no versioning.
/// - No in-process locking: concurrent saves to one key race on the final
///   rename and the last one wins whole.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Resolver for the store's root. Retrieval uses it to map validated
    /// requests to files.
    fn resolver(&self) -> &PathResolver;

    /// Ceiling applied to every save, in bytes.
    fn max_object_size(&self) -> u64;

    /// Stream `reader` into `<root>/<collection>/<filename>` and return the
    /// number of bytes stored.
    async fn save(
        &self,
        collection: CollectionId,
        filename: &str,
        reader: &mut UploadReader<'_>,
    ) -> StoreResult<u64>;

    /// Open an already-resolved path for reading.
    ///
    /// The path is not re-validated; callers obtain it from
    /// [`resolver`](Self::resolver).
    async fn get(&self, path: &Path) -> StoreResult<File>;

    /// Resolve `key` and open it.
    async fn open(&self, key: &ObjectKey) -> StoreResult<File> {
        let path = self.resolver().resolve(key)?;
        self.get(&path).await
    }
}
