//! Local image cache
//!
//! Remote artwork is stored under a content-addressed name derived from its
//! URL and recompressed as PNG at the highest compression level.

use crate::fetch::Fetcher;
use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// The public name of the cached copy of `url`.
pub fn image_name(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("/{}.png", hex::encode(hasher.finalize()))
}

pub struct ImageCache<'f> {
    dir: PathBuf,
    skip_download: bool,
    fetcher: &'f Fetcher,
    seen: Mutex<HashSet<String>>,
}

impl<'f> ImageCache<'f> {
    pub fn new(dir: impl Into<PathBuf>, skip_download: bool, fetcher: &'f Fetcher) -> Self {
        Self {
            dir: dir.into(),
            skip_download,
            fetcher,
            seen: Mutex::new(HashSet::new()),
        }
    }

    fn local_path(&self, name: &str) -> PathBuf {
        self.dir.join(name.trim_start_matches('/'))
    }

    /// Make `url` available locally and return the name to reference it by.
    ///
    /// Falls back to the remote URL when downloads are disabled and no cached
    /// copy exists. Concurrent requests for the same URL download it once.
    pub fn materialize(&self, url: &str) -> Result<String> {
        let name = image_name(url);
        let path = self.local_path(&name);

        if path.exists() {
            return Ok(name);
        }
        if self.skip_download {
            return Ok(url.to_string());
        }
        if !self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone())
        {
            return Ok(name);
        }

        debug!("Caching {} as {}", url, name);
        let result = self
            .fetcher
            .get_bytes(url)
            .and_then(|bytes| recompress(&bytes, &path));
        if result.is_err() {
            let _ = fs::remove_file(&path);
        }
        result.with_context(|| format!("Failed to cache image {}", url))?;

        Ok(name)
    }
}

/// Decode any supported image and write it back as a maximally compressed PNG.
pub fn recompress(bytes: &[u8], path: &Path) -> Result<()> {
    let image = image::load_from_memory(bytes).context("Failed to decode image")?;

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let encoder = PngEncoder::new_with_quality(
        std::io::BufWriter::new(file),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            image.as_bytes(),
            image.width(),
            image.height(),
            image.color().into(),
        )
        .context("Failed to encode PNG")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://static.atlasacademy.io/JP/Faces/f_1000000.png";

    #[test]
    fn test_image_name_is_stable() {
        let name = image_name(URL);
        assert!(name.starts_with('/'));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 1 + 64 + 4);
        assert_eq!(name, image_name(URL));
        assert_ne!(name, image_name("https://example.com/other.png"));
    }

    #[test]
    fn test_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let name = image_name(URL);
        fs::write(dir.path().join(&name[1..]), b"png").unwrap();

        let fetcher = Fetcher::new();
        let cache = ImageCache::new(dir.path(), true, &fetcher);
        assert_eq!(cache.materialize(URL).unwrap(), name);
    }

    #[test]
    fn test_skip_download_keeps_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new();
        let cache = ImageCache::new(dir.path(), true, &fetcher);
        assert_eq!(cache.materialize(URL).unwrap(), URL);
    }

    #[test]
    fn test_repeated_request_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new();
        let cache = ImageCache::new(dir.path(), false, &fetcher);

        let url = "http://127.0.0.1:9/face.png";
        cache.seen.lock().unwrap().insert(image_name(url));
        assert_eq!(cache.materialize(url).unwrap(), image_name(url));
    }

    #[test]
    fn test_failed_download_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new();
        let cache = ImageCache::new(dir.path(), false, &fetcher);

        let url = "http://127.0.0.1:9/face.png";
        assert!(cache.materialize(url).is_err());
        assert!(!dir.path().join(&image_name(url)[1..]).exists());
    }

    #[test]
    fn test_recompress() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = std::io::Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]))
            .write_to(&mut source, image::ImageFormat::Png)
            .unwrap();

        let path = dir.path().join("out.png");
        recompress(source.get_ref(), &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }
}
