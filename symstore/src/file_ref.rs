//! References to located symbol files.
//!
//! A lookup hands back a [`FileReference`] instead of file contents. Local
//! references point at a file on disk; HTTP references point at a URL and
//! download on copy. Copies are atomic: the destination either keeps its old
//! state or holds the complete new file, never a partial write.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{messages, BoxError, StoreError, StoreResult};
use crate::http::HttpClient;

/// Location of a symbol file found by a store.
#[derive(Clone)]
pub enum FileReference {
    /// A file on the local filesystem.
    Local { path: PathBuf },

    /// A file served over HTTP.
    Http {
        url: String,
        client: Arc<dyn HttpClient>,
    },
}

impl FileReference {
    /// Reference a local file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Reference a file behind `url`, downloaded through `client`.
    pub fn http(url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        Self::Http {
            url: url.into(),
            client,
        }
    }

    /// Path or URL of the file.
    pub fn location(&self) -> String {
        match self {
            Self::Local { path } => path.display().to_string(),
            Self::Http { url, .. } => url.clone(),
        }
    }

    /// Returns true if the file is on the local filesystem.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// Local path of the file, if it has one.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local { path } => Some(path),
            Self::Http { .. } => None,
        }
    }

    /// Copy the referenced file to `destination`.
    ///
    /// Creates the destination directory if needed and replaces any existing
    /// file. The data is written to a temporary sibling that is renamed into
    /// place once complete; the temporary file is removed on every path.
    pub async fn copy_to(&self, destination: &Path) -> StoreResult<()> {
        if destination.as_os_str().is_empty() {
            return Err(StoreError::Usage(messages::DESTINATION_EMPTY.to_string()));
        }

        let result = match self {
            Self::Local { path } => {
                write_atomically(destination, |temp| async move {
                    tokio::fs::copy(path, &temp).await?;
                    Ok::<(), BoxError>(())
                })
                .await
            }
            Self::Http { url, client } => {
                write_atomically(destination, |temp| async move {
                    client.download(url, &temp).await?;
                    Ok::<(), BoxError>(())
                })
                .await
            }
        };

        result.map_err(|e| {
            StoreError::store_with(
                format!(
                    "Failed to copy '{}' to '{}'. {}",
                    self.location(),
                    destination.display(),
                    e
                ),
                e,
            )
        })
    }
}

impl fmt::Debug for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => f.debug_struct("Local").field("path", path).finish(),
            Self::Http { url, .. } => f.debug_struct("Http").field("url", url).finish(),
        }
    }
}

/// Replace `destination` with the output of `write`.
///
/// `write` receives the path of a fresh temporary file next to the
/// destination. The temporary file is deleted when its guard drops unless it
/// was renamed onto the destination.
async fn write_atomically<F, Fut>(destination: &Path, write: F) -> Result<(), BoxError>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>,
{
    let file_name = destination.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", destination.display()),
        )
    })?;
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    tokio::fs::create_dir_all(&parent).await?;

    match tokio::fs::remove_file(destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name.to_string_lossy()))
        .suffix(".tmp")
        .tempfile_in(&parent)?
        .into_temp_path();

    write(temp.to_path_buf()).await?;

    temp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}
