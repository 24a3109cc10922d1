use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Read size for one step of a bounded copy.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Stream `src` into `dst`, failing with [`StoreError::LimitExceeded`] as
/// soon as the total would pass `limit`. The chunk that crosses the limit is
/// never written.
///
/// Read failures are reported as [`StoreError::Source`], write failures as
/// [`StoreError::Io`]. Removing the partially written sink is the caller's
/// job; [`PartialFile`] does it for files.
pub async fn copy_bounded<R, W>(src: &mut R, dst: &mut W, limit: u64) -> StoreResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = src.read(&mut buf).await.map_err(StoreError::Source)?;
        if n == 0 {
            break;
        }
        if written + n as u64 > limit {
            return Err(StoreError::LimitExceeded { limit });
        }
        dst.write_all(&buf[..n]).await?;
        written += n as u64;
    }
    dst.flush().await?;
    Ok(written)
}

/// A staging file that is deleted unless it is persisted.
///
/// The file lives next to its eventual target under a hidden name that the
/// filename grammar can never produce, so readers never see it. Dropping a
/// `PartialFile` without calling [`persist`](Self::persist) removes it, which
/// covers a save future cancelled by a disconnect, timeout, or shutdown
/// exactly like an ordinary error.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    file: Option<File>,
}

impl PartialFile {
    /// Create a fresh staging file beside `target`.
    pub async fn create(target: &Path) -> StoreResult<Self> {
        let path = staging_path(target)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bounded copy from `src` into the staging file.
    pub async fn copy_from<R>(&mut self, src: &mut R, limit: u64) -> StoreResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("staging file already closed")))?;
        copy_bounded(src, file, limit).await
    }

    /// Sync the staging file and rename it onto `target`, replacing any
    /// existing object.
    pub async fn persist(mut self, target: &Path) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().await?;
        }
        fs::rename(&self.path, target).await?;
        // Renamed away: nothing left for Drop to remove.
        self.path = PathBuf::new();
        Ok(())
    }

    /// Remove the staging file now instead of on drop.
    pub async fn discard(mut self) {
        self.file.take();
        if let Err(e) = fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "failed to remove staging file");
        }
        self.path = PathBuf::new();
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed abandoned staging file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove staging file"),
        }
    }
}

/// `<dir>/.<name>.<uuid>.part` for a target `<dir>/<name>`.
fn staging_path(target: &Path) -> StoreResult<PathBuf> {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidPath("target has no file name".into()))?;
    let staged = format!(".{name}.{}.part", uuid::Uuid::now_v7().simple());
    Ok(target.with_file_name(staged))
}
