//! Disk-backed playback of pre-encoded JPEG frames

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tracing::{debug, info};

use super::{Snapshot, SnapshotReply, UiSurface};
use crate::error::{FramecastError, Result};
use crate::types::Dimensions;

/// Loops over JPEG files, one per snapshot
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    dimensions: Dimensions,
    next: AtomicUsize,
}

impl ImageSequence {
    /// Load every `.jpg`/`.jpeg` in a directory, sorted by file name
    ///
    /// Dimensions are read from the first image.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| {
                FramecastError::config(format!("Cannot read image directory {:?}: {}", dir, e))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_jpeg(path))
            .collect();
        paths.sort();

        info!("Found {} images in {:?}", paths.len(), dir);
        Self::from_paths(paths)
    }

    /// Use an explicit list of files, probing dimensions from the first one
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self> {
        let first = paths
            .first()
            .ok_or_else(|| FramecastError::config("Image sequence is empty"))?;
        let (width, height) = image::image_dimensions(first).map_err(|e| {
            FramecastError::config(format!("Cannot read dimensions of {:?}: {}", first, e))
        })?;
        Ok(Self::with_dimensions(paths, Dimensions::new(width, height)))
    }

    /// Use an explicit list of files with known dimensions
    pub fn with_dimensions(paths: Vec<PathBuf>, dimensions: Dimensions) -> Self {
        Self {
            paths,
            dimensions,
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn next_path(&self) -> Option<&PathBuf> {
        if self.paths.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.paths.len();
        self.paths.get(index)
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

impl UiSurface for ImageSequence {
    fn width(&self) -> u32 {
        self.dimensions.width
    }

    fn height(&self) -> u32 {
        self.dimensions.height
    }

    fn request_snapshot(&self, reply: SnapshotReply) -> Result<()> {
        let path = self
            .next_path()
            .ok_or_else(|| FramecastError::surface("Image sequence is empty"))?;

        let data = std::fs::read(path)
            .map_err(|e| FramecastError::surface(format!("Failed to read {:?}: {}", path, e)))?;

        debug!("Read {} bytes from {:?}", data.len(), path);
        reply.deliver(Snapshot::Encoded(Bytes::from(data)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use tempfile::TempDir;

    fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let rgb = vec![128u8; (width * height * 3) as usize];
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 80)
            .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, out).unwrap();
        path
    }

    fn next_bytes(seq: &ImageSequence) -> Bytes {
        let (reply, mut rx) = SnapshotReply::channel();
        seq.request_snapshot(reply).unwrap();
        match rx.try_recv().unwrap() {
            Snapshot::Encoded(bytes) => bytes,
            Snapshot::Raw(_) => panic!("Expected encoded snapshot"),
        }
    }

    #[test]
    fn test_open_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        write_jpeg(dir.path(), "frame_1.jpg", 40, 30);
        write_jpeg(dir.path(), "frame_0.jpg", 40, 30);
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let seq = ImageSequence::open(dir.path()).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.dimensions(), Dimensions::new(40, 30));
        assert!(seq.paths[0].ends_with("frame_0.jpg"));
    }

    #[test]
    fn test_loops_over_images() {
        let dir = TempDir::new().unwrap();
        let a = write_jpeg(dir.path(), "a.jpg", 16, 16);
        let b = write_jpeg(dir.path(), "b.jpg", 16, 8);
        let seq = ImageSequence::with_dimensions(vec![a.clone(), b], Dimensions::new(16, 16));

        let first = next_bytes(&seq);
        let _second = next_bytes(&seq);
        let third = next_bytes(&seq);
        assert_eq!(first, third);
        assert_eq!(first.as_ref(), std::fs::read(&a).unwrap().as_slice());
    }

    #[test]
    fn test_empty_directory_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = ImageSequence::open(dir.path()).err().unwrap();
        assert!(matches!(err, FramecastError::Config(_)));
    }

    #[test]
    fn test_missing_file_refuses_request() {
        let seq = ImageSequence::with_dimensions(
            vec![PathBuf::from("/nonexistent/frame.jpg")],
            Dimensions::new(1, 1),
        );
        let (reply, _rx) = SnapshotReply::channel();
        assert!(matches!(
            seq.request_snapshot(reply),
            Err(FramecastError::Surface(_))
        ));
    }
}
