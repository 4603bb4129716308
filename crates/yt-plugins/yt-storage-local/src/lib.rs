//! # yt-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use tokio::fs;
use yt_core::traits::{MediaStore, UploadError};

/// Longest edge of a generated thumbnail, in pixels.
const THUMB_EDGE: u32 = 250;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root_path: root,
            url_prefix,
        }
    }

    /// Sharded relative directory for a hash: "ab/cd"
    fn shard(hash: &str) -> String {
        format!("{}/{}", &hash[0..2], &hash[2..4])
    }

    fn thumbnail_key(key: &str) -> String {
        let (dir, file) = key.rsplit_once('/').unwrap_or(("", key));
        let stem = file.split('.').next().unwrap_or(file);
        format!("{dir}/thumb_{stem}.webp")
    }
}

/// Decodes the upload and renders its thumbnail; CPU-bound.
fn process(data: &[u8]) -> Result<(ImageFormat, Vec<u8>), UploadError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| UploadError::Unsupported(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| UploadError::Unsupported("unrecognised image format".into()))?;
    let img = reader
        .decode()
        .map_err(|e| UploadError::Unsupported(e.to_string()))?;

    let mut thumb = Vec::new();
    img.thumbnail(THUMB_EDGE, THUMB_EDGE)
        .to_rgba8()
        .write_to(&mut Cursor::new(&mut thumb), ImageFormat::WebP)
        .context("encoding thumbnail")?;
    Ok((format, thumb))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Bytes, content_type: &str) -> Result<String, UploadError> {
        let hash = hex::encode(Sha256::digest(&data));

        let decoded = data.clone();
        let (format, thumb) = tokio::task::spawn_blocking(move || process(&decoded))
            .await
            .context("thumbnail worker panicked")??;

        let ext = format.extensions_str().first().copied().unwrap_or("bin");
        let key = format!("{}/{hash}.{ext}", Self::shard(&hash));
        let target_path = self.root_path.join(&key);
        let thumb_path = self.root_path.join(Self::thumbnail_key(&key));

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await.context("creating media shard")?;
        }
        if !fs::try_exists(&target_path).await.unwrap_or(false) {
            fs::write(&target_path, &data).await.context("writing upload")?;
            fs::write(&thumb_path, &thumb).await.context("writing thumbnail")?;
            log::info!("stored {content_type} upload as {key}");
        }
        Ok(key)
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }

    fn thumbnail_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, Self::thumbnail_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x1 GIF
    const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\
\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

    #[tokio::test]
    async fn test_upload_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf(), "/media/");

        let key = store
            .save_upload(Bytes::from_static(SMALL_GIF), "image/gif")
            .await
            .unwrap();
        assert!(key.ends_with(".gif"));
        assert_eq!(&key[0..2], &key[6..8]);
        assert!(dir.path().join(&key).exists());
        assert!(dir.path().join(LocalMediaStore::thumbnail_key(&key)).exists());

        let again = store
            .save_upload(Bytes::from_static(SMALL_GIF), "image/gif")
            .await
            .unwrap();
        assert_eq!(key, again);
        assert_eq!(store.url(&key), format!("/media/{key}"));
        assert!(store.thumbnail_url(&key).ends_with(".webp"));
    }

    #[tokio::test]
    async fn test_non_image_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf(), "/media");

        let err = store
            .save_upload(Bytes::from_static(b"definitely not an image"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Unsupported(_)));
    }

    #[test]
    fn test_thumbnail_key_shape() {
        assert_eq!(
            LocalMediaStore::thumbnail_key("ab/cd/abcdef.png"),
            "ab/cd/thumb_abcdef.webp"
        );
    }
}
