//! Intermediate artifact downloads
//!
//! Remote step outputs are copied into `<output_dir>/intermediates/` so a
//! finished run can be audited after the provider URL expires.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::chain::MediaKind;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

pub struct ArtifactDownloader {
    client: reqwest::Client,
}

impl Default for ArtifactDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactDownloader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Whether `url` points somewhere this downloader can fetch from
    pub fn can_fetch(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    /// Fetch `url` into `dest_dir/<stem>.<ext>` and return the written path
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, ArtifactError> {
        if !Self::can_fetch(url) {
            return Err(ArtifactError::UnsupportedScheme(url.to_string()));
        }

        debug!("Downloading {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(artifact_file_name(url, stem));
        tokio::fs::write(&path, &bytes).await?;

        info!("Saved intermediate artifact to {}", path.display());
        Ok(path)
    }
}

/// File name for a downloaded artifact, keeping the URL's media extension
pub fn artifact_file_name(url: &str, stem: &str) -> String {
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    let extension = MediaKind::from_extension(path).and_then(|_| {
        path.rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
    });

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => format!("{}.bin", stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("https://cdn.example.com/v/out.MP4?sig=abc", "exec_1_step2"),
            "exec_1_step2.mp4"
        );
        assert_eq!(
            artifact_file_name("https://cdn.example.com/blob/12345", "exec_1_step1"),
            "exec_1_step1.bin"
        );
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let dir = tempfile::tempdir().unwrap();
        let result = ArtifactDownloader::new()
            .download("dry-run://exec/out.png", dir.path(), "out")
            .await;
        assert!(matches!(result, Err(ArtifactError::UnsupportedScheme(_))));
    }
}
