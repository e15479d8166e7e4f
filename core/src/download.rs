//! Streaming a response body straight to disk.
//!
//! # Design
//! The target file is opened when the `FileDownload` is created, before any
//! request goes out, so an unwritable path fails early. Bytes are written
//! chunk by chunk as they arrive; the only in-memory state is the running
//! `DownloadProgress`, which is handed to the caller's callback after every
//! chunk. The callback is borrowed for the duration of the download only.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::http::{Headers, HttpResponse};

/// Progress snapshot reported while a download runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received_bytes: u64,
    /// From `content-length`, when the server announced one.
    pub total_bytes: Option<u64>,
}

/// Summary of a completed download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub status: u16,
    pub headers: Headers,
    pub path: PathBuf,
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DownloadResult(status: {}, path: {}, received: {} bytes",
            self.status,
            self.path.display(),
            self.received_bytes
        )?;
        match self.total_bytes {
            Some(total) => write!(f, ", total: {total} bytes)"),
            None => write!(f, ")"),
        }
    }
}

/// An open download target.
#[derive(Debug)]
pub struct FileDownload {
    path: PathBuf,
    file: File,
}

impl FileDownload {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| ClientError::Filesystem {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain `response` into the file, calling `on_progress` after each
    /// chunk is written.
    ///
    /// Fails with `Transport` if the body ends before (or runs past) an
    /// announced `content-length`.
    pub fn write_response<F>(
        self,
        response: HttpResponse,
        mut on_progress: F,
    ) -> ClientResult<DownloadResult>
    where
        F: FnMut(&DownloadProgress),
    {
        let HttpResponse {
            status,
            headers,
            body,
        } = response;
        let total_bytes = headers
            .first("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok());

        let path = self.path;
        let fs_err = |source: std::io::Error| ClientError::Filesystem {
            path: path.clone(),
            source,
        };

        let mut writer = BufWriter::new(self.file);
        let mut progress = DownloadProgress {
            received_bytes: 0,
            total_bytes,
        };
        for chunk in body.chunks() {
            let chunk = chunk?;
            writer.write_all(&chunk).map_err(fs_err)?;
            progress.received_bytes += chunk.len() as u64;
            on_progress(&progress);
        }
        writer.flush().map_err(fs_err)?;

        if let Some(total) = total_bytes {
            if progress.received_bytes != total {
                return Err(ClientError::Transport(format!(
                    "transfer interrupted: received {} of {total} bytes",
                    progress.received_bytes
                )));
            }
        }

        debug!(
            path = %path.display(),
            status,
            received = progress.received_bytes,
            "download complete"
        );
        Ok(DownloadResult {
            status,
            headers,
            path,
            received_bytes: progress.received_bytes,
            total_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ResponseBody;

    fn image_response(len: usize, announce: Option<usize>) -> HttpResponse {
        let mut headers = Headers::new();
        headers.add("content-type", "image/png");
        if let Some(n) = announce {
            headers.add("content-length", n.to_string());
        }
        let body = ResponseBody::from_bytes(vec![0xABu8; len]).with_chunk_size(1000);
        HttpResponse::new(200, headers, body)
    }

    #[test]
    fn written_bytes_match_last_progress_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("600x400.png");

        let mut events = Vec::new();
        let result = FileDownload::create(&target)
            .unwrap()
            .write_response(image_response(4500, Some(4500)), |p| events.push(*p))
            .unwrap();

        let on_disk = std::fs::metadata(&target).unwrap().len();
        let last = events.last().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(on_disk, last.received_bytes);
        assert_eq!(last.total_bytes, Some(on_disk));
        assert_eq!(result.received_bytes, on_disk);
        assert_eq!(result.path, target);
    }

    #[test]
    fn progress_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();
        FileDownload::create(dir.path().join("a.bin"))
            .unwrap()
            .write_response(image_response(2500, None), |p| seen.push(p.received_bytes))
            .unwrap();
        assert_eq!(seen, vec![1000, 2000, 2500]);
    }

    #[test]
    fn short_body_is_an_interrupted_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDownload::create(dir.path().join("short.png"))
            .unwrap()
            .write_response(image_response(100, Some(400)), |_| {})
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn empty_body_reports_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let result = FileDownload::create(dir.path().join("empty"))
            .unwrap()
            .write_response(image_response(0, Some(0)), |_| calls += 1)
            .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(result.received_bytes, 0);
    }

    #[test]
    fn unopenable_path_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDownload::create(dir.path().join("missing").join("600x400.png")).unwrap_err();
        assert!(matches!(err, ClientError::Filesystem { .. }));
    }

    #[test]
    fn existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("600x400.png");
        std::fs::write(&target, vec![1u8; 10_000]).unwrap();

        FileDownload::create(&target)
            .unwrap()
            .write_response(image_response(10, Some(10)), |_| {})
            .unwrap();
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 10);
    }

    #[test]
    fn display_includes_total_when_known() {
        let result = DownloadResult {
            status: 200,
            headers: Headers::new(),
            path: PathBuf::from("/tmp/600x400.png"),
            received_bytes: 12,
            total_bytes: Some(12),
        };
        assert_eq!(
            result.to_string(),
            "DownloadResult(status: 200, path: /tmp/600x400.png, received: 12 bytes, total: 12 bytes)"
        );
    }
}
