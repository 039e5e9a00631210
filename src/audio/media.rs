use crate::audio::error::AudioError;
use crate::catalog::Locator;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info, instrument, trace};

const LOG_TARGET: &str = "r_ambient::audio::media";

/// Reads the whole resource into memory.
///
/// Symphonia needs `Read + Seek`, and looping re-reads the resource from the
/// start on every pass, so network resources are downloaded once up front.
#[instrument(skip(client), fields(locator = %locator))]
pub async fn fetch_media(client: &Client, locator: &Locator) -> Result<Bytes, AudioError> {
    match locator {
        Locator::File(path) => {
            let data = tokio::fs::read(path).await?;
            debug!(target: LOG_TARGET, "Read {} bytes from {}", data.len(), path.display());
            if data.is_empty() {
                return Err(AudioError::EmptyStream);
            }
            Ok(Bytes::from(data))
        }
        Locator::Http(url) => {
            let response = client.get(url.clone()).send().await?.error_for_status()?;
            let mut stream = response.bytes_stream();
            let mut buffer = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                buffer.extend_from_slice(&chunk);
                trace!(target: LOG_TARGET, "Downloaded {} bytes (total {})", chunk.len(), buffer.len());
            }
            info!(target: LOG_TARGET, "Downloaded {} ({} bytes).", url, buffer.len());
            if buffer.is_empty() {
                return Err(AudioError::EmptyStream);
            }
            Ok(buffer.freeze())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ID3fake").unwrap();
        let locator = Locator::File(file.path().to_path_buf());

        let bytes = fetch_media(&Client::new(), &locator).await.unwrap();
        assert_eq!(&bytes[..], b"ID3fake");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_load_failure() {
        let locator = Locator::File("/nonexistent/r-ambient/rain.mp3".into());
        let err = fetch_media(&Client::new(), &locator).await.unwrap_err();
        assert!(matches!(err, AudioError::IoError(_)));
        assert!(err.is_load_failure());
    }

    #[tokio::test]
    async fn test_fetch_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let locator = Locator::File(file.path().to_path_buf());
        let err = fetch_media(&Client::new(), &locator).await.unwrap_err();
        assert!(matches!(err, AudioError::EmptyStream));
    }
}
