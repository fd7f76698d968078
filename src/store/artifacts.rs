//! Filesystem artifact store with remote source fetch

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::SourceRef;
use crate::ports::ArtifactStore;

/// Local-filesystem `ArtifactStore`. Upload handles resolve under
/// `<root>/uploads`, produced artifacts land under `<root>/results`, and URL
/// sources are fetched over HTTP.
pub struct FsArtifactStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: reqwest::Client::new(),
        }
    }

    fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    /// Resolve an upload handle to an existing local file. Handles are
    /// looked up under the uploads root first, then as plain paths.
    fn resolve_upload(&self, handle: &str) -> PipelineResult<PathBuf> {
        let under_root = self.uploads_dir().join(handle);
        if under_root.is_file() {
            return Ok(under_root);
        }
        let direct = PathBuf::from(handle);
        if direct.is_file() {
            return Ok(direct);
        }
        Err(PipelineError::SourceUnavailable {
            message: format!("Upload handle not found: {}", handle),
        })
    }

    async fn fetch_url(&self, url: &str, dest: &Path) -> PipelineResult<()> {
        let response = self.client.get(url).send().await.map_err(|e| {
            PipelineError::SourceUnavailable {
                message: format!("Failed to fetch {}: {}", url, e),
            }
        })?;

        if !response.status().is_success() {
            return Err(PipelineError::SourceUnavailable {
                message: format!("Fetch of {} returned HTTP {}", url, response.status()),
            });
        }

        // Stream chunks straight to disk; sources can be larger than memory
        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            PipelineError::SourceUnavailable {
                message: format!("Failed to create staged source file: {}", e),
            }
        })?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::SourceUnavailable {
                message: format!("Failed to read body of {}: {}", url, e),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| PipelineError::SourceUnavailable {
                    message: format!("Failed to write fetched source: {}", e),
                })?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| PipelineError::SourceUnavailable {
                message: format!("Failed to flush fetched source: {}", e),
            })?;

        debug!(url, bytes = written, dest = %dest.display(), "Fetched remote source");
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn fetch(&self, source: &SourceRef, dest_dir: &Path) -> PipelineResult<PathBuf> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| PipelineError::SourceUnavailable {
                message: format!("Cannot create work directory: {}", e),
            })?;
        let dest = dest_dir.join(source.file_name());

        match source {
            SourceRef::Upload(handle) => {
                let local = self.resolve_upload(handle)?;
                tokio::fs::copy(&local, &dest).await.map_err(|e| {
                    PipelineError::SourceUnavailable {
                        message: format!("Failed to stage upload {}: {}", handle, e),
                    }
                })?;
            }
            SourceRef::Url(url) => {
                self.fetch_url(url, &dest).await?;
            }
        }

        Ok(dest)
    }

    async fn persist(&self, local: &Path, key: &str) -> PipelineResult<String> {
        let dest = self.results_dir().join(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PipelineError::PersistenceFailure {
                    message: format!("Cannot create results directory: {}", e),
                }
            })?;
        }

        tokio::fs::copy(local, &dest)
            .await
            .map_err(|e| PipelineError::PersistenceFailure {
                message: format!("Failed to persist artifact {}: {}", key, e),
            })?;

        info!(key, dest = %dest.display(), "Persisted result artifact");
        Ok(dest.display().to_string())
    }

    async fn discard(&self, path: &Path) -> PipelineResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_upload_handle_under_root() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(root.path());

        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(uploads.join("clip.mov"), b"source bytes").unwrap();

        let staged = store
            .fetch(&SourceRef::Upload("clip.mov".to_string()), work.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&staged).unwrap(), b"source bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_upload_is_source_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(root.path());

        let err = store
            .fetch(&SourceRef::Upload("missing.mov".to_string()), work.path())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SourceUnavailable");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_url_streams_body_to_disk() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = vec![0xabu8; 256 * 1024];
        let served = body.clone();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                served.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&served).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(root.path());

        let url = format!("http://{}/media/clip.mov", addr);
        let staged = store
            .fetch(&SourceRef::Url(url), work.path())
            .await
            .unwrap();
        assert_eq!(staged.file_name().unwrap(), "clip.mov");
        assert_eq!(std::fs::read(&staged).unwrap(), body);
    }

    #[tokio::test]
    async fn test_persist_and_discard() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(root.path());

        let local = work.path().join("out.mp4");
        std::fs::write(&local, b"encoded").unwrap();

        let reference = store.persist(&local, "job-1/out.mp4").await.unwrap();
        assert!(Path::new(&reference).is_file());

        store.discard(&local).await.unwrap();
        assert!(!local.exists());
        // discarding again is not an error
        store.discard(&local).await.unwrap();
    }
}
