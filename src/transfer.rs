//! Streaming file downloads with progress reporting.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::listing::FileEntry;
use crate::resolve::Endpoint;

/// Trait for receiving transfer progress updates.
///
/// Updates arrive at chunk granularity as `(label, bytes_done, bytes_total)`;
/// `bytes_done` is cumulative and `bytes_total` is 0 when the response
/// declared no content length. All methods have default no-op
/// implementations.
pub trait TransferProgress: Send + Sync {
    /// Called during the estimate phase once an identifier's listing has
    /// been sized.
    fn on_identifier_estimated(&self, _identifier: &str, _file_count: usize, _total_bytes: u64) {}

    /// Called when a file transfer starts.
    fn on_file_start(&self, _label: &str, _total: u64) {}

    /// Called after each received chunk with cumulative progress.
    fn on_chunk(&self, _label: &str, _bytes_done: u64, _bytes_total: u64) {}

    /// Called when a file transfer completes successfully.
    fn on_file_complete(&self, _label: &str, _bytes: u64) {}

    /// Called when a file transfer is skipped or fails.
    fn on_error(&self, _label: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl TransferProgress for NoProgress {}

/// Outcome of one file transfer. Every variant is terminal for the file;
/// the run continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file was fully written to its destination.
    Downloaded(u64),
    /// The service refused the file with a 403; skipped.
    AccessDenied,
    /// Any other failure: unexpected status or mid-stream transport error.
    Failed(String),
}

/// Strips ASCII spaces from a listing key to form the destination name.
///
/// This is the original tool's lossy mapping: two keys differing only by
/// spaces collide, and the collision is not detected.
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    key.replace(' ', "")
}

/// Returns the `.part` file path for a given final path.
fn part_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".part");
    PathBuf::from(s)
}

/// Downloads files for resolved identifiers to local storage.
pub struct TransferEngine<F: FileSystem = TokioFileSystem> {
    http: reqwest::Client,
    cleanup_on_error: bool,
    fs: F,
}

impl TransferEngine<TokioFileSystem> {
    /// Creates a new engine with the default file system.
    #[must_use]
    pub const fn new(http: reqwest::Client, cleanup_on_error: bool) -> Self {
        Self {
            http,
            cleanup_on_error,
            fs: TokioFileSystem,
        }
    }
}

impl<F: FileSystem> TransferEngine<F> {
    /// Creates a new engine with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(http: reqwest::Client, cleanup_on_error: bool, fs: F) -> Self {
        Self {
            http,
            cleanup_on_error,
            fs,
        }
    }

    /// Ensures the parent directory exists for a destination path.
    async fn ensure_parent_dir(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Destination path for one listing key under an identifier directory.
    #[must_use]
    pub fn destination(dest_dir: &Path, key: &str) -> PathBuf {
        dest_dir.join(sanitize_key(key))
    }

    /// Streams one file to disk using `.part`-then-rename semantics.
    ///
    /// The body is written to `{dest}.part` and renamed into place on
    /// success; on failure the `.part` file is removed when cleanup is
    /// enabled. Progress is reported after each received chunk.
    ///
    /// # Errors
    ///
    /// Returns an error only for local I/O failures (directory or file
    /// creation, rename). Remote failures are classified in the returned
    /// [`TransferOutcome`].
    pub async fn transfer(
        &self,
        endpoint: &Endpoint,
        entry: &FileEntry,
        dest_dir: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<TransferOutcome> {
        let dest = Self::destination(dest_dir, &entry.key);
        self.ensure_parent_dir(&dest).await?;

        let url = match endpoint.file_url(&entry.key) {
            Ok(url) => url,
            Err(e) => {
                progress.on_error(&entry.key, &e.to_string());
                return Ok(TransferOutcome::Failed(e.to_string()));
            }
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                progress.on_error(&entry.key, &e.to_string());
                return Ok(TransferOutcome::Failed(e.to_string()));
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            progress.on_error(&entry.key, "access denied (403)");
            return Ok(TransferOutcome::AccessDenied);
        }
        if !status.is_success() {
            let msg = format!("unexpected status {status}");
            progress.on_error(&entry.key, &msg);
            return Ok(TransferOutcome::Failed(msg));
        }

        // Total for progress display comes from the declared content length,
        // 0 (unknown) when absent.
        let total = response.content_length().unwrap_or(0);
        progress.on_file_start(&entry.key, total);

        let pp = part_path(&dest);
        let mut file = self.fs.create_file(&pp).await?;
        let mut stream = response.bytes_stream();
        let mut done: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Mid-stream transport failure: classify, optionally
                    // clean up the partial write.
                    if self.cleanup_on_error {
                        let _ = self.fs.remove_file(&pp).await;
                    }
                    progress.on_error(&entry.key, &e.to_string());
                    return Ok(TransferOutcome::Failed(e.to_string()));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                if self.cleanup_on_error {
                    let _ = self.fs.remove_file(&pp).await;
                }
                return Err(e.into());
            }
            done += chunk.len() as u64;
            progress.on_chunk(&entry.key, done, total);
        }

        file.flush().await?;
        drop(file);
        self.fs.rename_file(&pp, &dest).await?;

        progress.on_file_complete(&entry.key, done);
        Ok(TransferOutcome::Downloaded(done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sanitize_strips_spaces() {
        assert_eq!(sanitize_key("my file.txt"), "myfile.txt");
        assert_eq!(sanitize_key("no-spaces.bin"), "no-spaces.bin");
        assert_eq!(sanitize_key("a b c d"), "abcd");
    }

    #[test]
    fn sanitize_collisions_are_possible() {
        // Documented lossy mapping: distinct keys can collide.
        assert_eq!(sanitize_key("my file.txt"), sanitize_key("myfile.txt"));
        assert_eq!(sanitize_key("my file.txt"), sanitize_key("m y file.txt"));
    }

    #[test]
    fn part_path_appends_extension() {
        assert_eq!(
            part_path(Path::new("foo/bar.zip")),
            PathBuf::from("foo/bar.zip.part")
        );
    }

    #[test]
    fn destination_uses_sanitized_key() {
        assert_eq!(
            TransferEngine::<TokioFileSystem>::destination(Path::new("/dst/item"), "my file.txt"),
            PathBuf::from("/dst/item/myfile.txt")
        );
    }

    fn endpoint_for(server_uri: &str, item: &str) -> Endpoint {
        Endpoint::new(reqwest::Url::parse(&format!("{server_uri}/{item}/")).unwrap())
    }

    struct Recording {
        chunks: std::sync::Mutex<Vec<(u64, u64)>>,
    }

    impl TransferProgress for Recording {
        fn on_chunk(&self, _label: &str, done: u64, total: u64) {
            self.chunks.lock().unwrap().push((done, total));
        }
    }

    #[tokio::test]
    async fn transfer_writes_file_and_reports_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/data.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 500]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), true);
        let entry = FileEntry {
            key: "data.bin".into(),
            size: 500,
        };
        let recording = Recording {
            chunks: std::sync::Mutex::new(Vec::new()),
        };

        let outcome = engine
            .transfer(
                &endpoint_for(&server.uri(), "item"),
                &entry,
                dir.path(),
                &recording,
            )
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::Downloaded(500));
        let written = std::fs::read(dir.path().join("data.bin")).unwrap();
        assert_eq!(written.len(), 500);
        // No .part file left behind after the rename.
        assert!(!dir.path().join("data.bin.part").exists());

        let chunks = recording.chunks.lock().unwrap();
        assert!(!chunks.is_empty());
        let (done, total) = *chunks.last().unwrap();
        assert_eq!(done, 500);
        assert_eq!(total, 500);
    }

    #[tokio::test]
    async fn transfer_403_is_access_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/secret.bin"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), true);
        let entry = FileEntry {
            key: "secret.bin".into(),
            size: 10,
        };

        let outcome = engine
            .transfer(
                &endpoint_for(&server.uri(), "item"),
                &entry,
                dir.path(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::AccessDenied);
        assert!(!dir.path().join("secret.bin").exists());
    }

    #[tokio::test]
    async fn transfer_server_error_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/flaky.bin"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), true);
        let entry = FileEntry {
            key: "flaky.bin".into(),
            size: 10,
        };

        let outcome = engine
            .transfer(
                &endpoint_for(&server.uri(), "item"),
                &entry,
                dir.path(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, TransferOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn mid_stream_failure_is_failed_and_cleans_up_part_file() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // A server that declares more bytes than it serves, then drops the
        // connection: the body stream errors after the first chunk.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let _ = sock
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\npartial body")
                .await;
            let _ = sock.flush().await;
        });

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), true);
        let entry = FileEntry {
            key: "big.bin".into(),
            size: 1000,
        };
        let endpoint =
            Endpoint::new(reqwest::Url::parse(&format!("http://{addr}/item/")).unwrap());

        let outcome = engine
            .transfer(&endpoint, &entry, dir.path(), &NoProgress)
            .await
            .unwrap();

        assert!(matches!(outcome, TransferOutcome::Failed(_)));
        assert!(!dir.path().join("big.bin.part").exists());
        assert!(!dir.path().join("big.bin").exists());
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_part_file_without_cleanup() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let _ = sock
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\npartial body")
                .await;
            let _ = sock.flush().await;
        });

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), false);
        let entry = FileEntry {
            key: "big.bin".into(),
            size: 1000,
        };
        let endpoint =
            Endpoint::new(reqwest::Url::parse(&format!("http://{addr}/item/")).unwrap());

        let outcome = engine
            .transfer(&endpoint, &entry, dir.path(), &NoProgress)
            .await
            .unwrap();

        // Partially written bytes stay on disk under the .part name.
        assert!(matches!(outcome, TransferOutcome::Failed(_)));
        assert!(dir.path().join("big.bin.part").exists());
        assert!(!dir.path().join("big.bin").exists());
    }

    #[tokio::test]
    async fn transfer_spaced_key_lands_at_sanitized_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/my%20file.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = TransferEngine::new(reqwest::Client::new(), true);
        let entry = FileEntry {
            key: "my file.txt".into(),
            size: 5,
        };

        let outcome = engine
            .transfer(
                &endpoint_for(&server.uri(), "item"),
                &entry,
                dir.path(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::Downloaded(5));
        assert!(dir.path().join("myfile.txt").exists());
    }
}
