//! Frame-per-file output

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{MediaSink, NeedDataCallback, SinkBuffer};
use crate::config::StreamFormat;
use crate::error::{FramecastError, Result};

/// Writes every pushed buffer to `frame_NNNNNN.<ext>` in a directory
///
/// Always ready for more data: need-data fires on registration and after
/// every push.
pub struct DirectorySink {
    dir: PathBuf,
    extension: &'static str,
    written: AtomicU64,
    need_data: Mutex<Option<NeedDataCallback>>,
}

impl DirectorySink {
    /// Create the directory if needed and prepare to write frames
    pub fn create(dir: impl AsRef<Path>, format: StreamFormat) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            FramecastError::pipeline(format!("Cannot create output directory {:?}: {}", dir, e))
        })?;

        info!("Writing {} frames to {:?}", format, dir);
        Ok(Self {
            dir,
            extension: format.extension(),
            written: AtomicU64::new(0),
            need_data: Mutex::new(None),
        })
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    /// Path of the n-th frame
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir
            .join(format!("frame_{:06}.{}", index, self.extension))
    }

    fn signal_need_data(&self) {
        let callback = self.need_data.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl MediaSink for DirectorySink {
    fn push(&self, buffer: SinkBuffer) -> Result<()> {
        let index = self.written.load(Ordering::SeqCst);
        let path = self.frame_path(index);

        std::fs::write(&path, &buffer.data)
            .map_err(|e| FramecastError::sink(format!("Failed to write {:?}: {}", path, e)))?;
        self.written.fetch_add(1, Ordering::SeqCst);

        debug!(
            "Wrote {} bytes to {:?} (pts {:?})",
            buffer.data.len(),
            path,
            buffer.pts
        );
        self.signal_need_data();
        Ok(())
    }

    fn set_need_data_callback(&self, callback: NeedDataCallback) {
        *self.need_data.lock() = Some(callback);
        self.signal_need_data();
    }
}
